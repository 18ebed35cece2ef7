use std::time::Instant;

use ta_index_spec::{Collection, IndexDefinition, Registry};
use tracing::{debug, error, info, warn};

use crate::error::ProvisionError;
use crate::metrics::PROVISIONER_METRICS;
use crate::report::{CollectionReport, ProvisionReport};
use crate::store::{Ack, IndexDescriptor, StoreError, StoreHandle};

/// Applies a registry against a store and verifies the outcome.
///
/// Store calls are issued one at a time, in registry order, so a failure is
/// always attributable to a single definition.
pub struct Provisioner<'a, S: ?Sized> {
    registry: &'a Registry,
    store: &'a S,
}

/// Applies every definition of `registry` against `store` and returns the realized inventory.
pub async fn provision<S>(registry: &Registry, store: &S) -> Result<ProvisionReport, ProvisionError>
where
    S: StoreHandle + ?Sized,
{
    Provisioner::new(registry, store).provision().await
}

/// Read-only counterpart of [`provision`].
pub async fn verify<S>(registry: &Registry, store: &S) -> Result<ProvisionReport, ProvisionError>
where
    S: StoreHandle + ?Sized,
{
    Provisioner::new(registry, store).verify().await
}

impl<'a, S> Provisioner<'a, S>
where
    S: StoreHandle + ?Sized,
{
    pub fn new(registry: &'a Registry, store: &'a S) -> Self {
        Self { registry, store }
    }

    /// Resolves store collection names into registry order, dropping duplicates.
    pub fn resolve_collections<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<Collection>, ProvisionError> {
        let mut collections = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let collection =
                Collection::parse(name).map_err(|_| ProvisionError::UnknownCollection(name.to_string()))?;
            if !collections.contains(&collection) {
                collections.push(collection);
            }
        }
        collections.sort();
        Ok(collections)
    }

    /// Provisions every collection of the registry.
    pub async fn provision(&self) -> Result<ProvisionReport, ProvisionError> {
        self.provision_collections(self.registry.all_collections()).await
    }

    /// Provisions the given collections, in registry order.
    pub async fn provision_collections(&self, collections: &[Collection]) -> Result<ProvisionReport, ProvisionError> {
        info!(layout = self.registry.version(), collections = collections.len(), "Starting index provisioning");

        let result = self.run(collections, true).await;
        match &result {
            Ok(report) => info!(
                total_indexes = report.total_index_count(),
                collections = report.len(),
                "Index provisioning completed"
            ),
            Err(e) => {
                PROVISIONER_METRICS.record_failure(e.collection());
                error!(error = %e, "Index provisioning aborted");
            }
        }
        result
    }

    /// Checks that every definition is realized without creating anything.
    pub async fn verify(&self) -> Result<ProvisionReport, ProvisionError> {
        self.verify_collections(self.registry.all_collections()).await
    }

    pub async fn verify_collections(&self, collections: &[Collection]) -> Result<ProvisionReport, ProvisionError> {
        info!(layout = self.registry.version(), collections = collections.len(), "Verifying index layout");

        let result = self.run(collections, false).await;
        if let Err(e) = &result {
            warn!(error = %e, "Index layout verification failed");
        }
        result
    }

    async fn run(&self, collections: &[Collection], apply: bool) -> Result<ProvisionReport, ProvisionError> {
        let mut report = ProvisionReport::default();

        for &collection in collections {
            let definitions = self.registry.definitions(collection);

            if apply {
                for definition in definitions {
                    self.apply(definition).await?;
                }
            }

            let realized = self.list(collection).await?;
            check_inventory(collection, definitions, &realized)?;

            let collection_report = CollectionReport::from_descriptors(&realized);
            info!(
                collection = %collection,
                index_count = collection_report.index_count,
                expected = definitions.len(),
                "Collection index inventory"
            );
            report.insert(collection, collection_report);
        }

        Ok(report)
    }

    async fn apply(&self, definition: &IndexDefinition) -> Result<(), ProvisionError> {
        let collection = definition.collection;
        let started = Instant::now();
        let result = self.store.create_index(definition).await;
        PROVISIONER_METRICS.record_store_call("create_index", collection, started.elapsed().as_secs_f64());

        match result {
            Ok(Ack::Created) => {
                info!(
                    collection = %collection,
                    index = %definition.name,
                    keys = %definition.key_pattern,
                    unique = definition.options.unique,
                    expire_after_seconds = ?definition.options.expire_after_seconds,
                    "Created index"
                );
                PROVISIONER_METRICS.record_created(collection);
                Ok(())
            }
            Ok(Ack::AlreadyPresent) | Err(StoreError::AlreadyExists(_)) => {
                debug!(collection = %collection, index = %definition.name, "Index already present");
                PROVISIONER_METRICS.record_already_present(collection);
                Ok(())
            }
            Err(StoreError::SpecConflict { code, message }) => {
                error!(
                    collection = %collection,
                    index = %definition.name,
                    code = ?code,
                    message = %message,
                    "Index exists with a different specification"
                );
                Err(ProvisionError::IndexConflict { collection, name: definition.name.clone() })
            }
            Err(cause @ StoreError::Unavailable(_)) => Err(ProvisionError::StoreUnavailable { collection, cause }),
            Err(cause) => {
                Err(ProvisionError::IndexCreationFailed { collection, name: definition.name.clone(), cause })
            }
        }
    }

    async fn list(&self, collection: Collection) -> Result<Vec<IndexDescriptor>, ProvisionError> {
        let started = Instant::now();
        let result = self.store.list_indexes(collection).await;
        PROVISIONER_METRICS.record_store_call("list_indexes", collection, started.elapsed().as_secs_f64());

        result.map_err(|cause| match cause {
            StoreError::Unavailable(_) => ProvisionError::StoreUnavailable { collection, cause },
            cause => ProvisionError::InventoryFailed { collection, cause },
        })
    }
}

/// Every definition must be realized under its name with the exact same specification.
fn check_inventory(
    collection: Collection,
    definitions: &[IndexDefinition],
    realized: &[IndexDescriptor],
) -> Result<(), ProvisionError> {
    for definition in definitions {
        match realized.iter().find(|descriptor| descriptor.name == definition.name) {
            None => {
                return Err(ProvisionError::VerificationFailed { collection, name: definition.name.clone() });
            }
            Some(descriptor) if !descriptor.matches(definition) => {
                warn!(
                    collection = %collection,
                    index = %definition.name,
                    expected = %definition.key_pattern,
                    found = %descriptor.key_pattern,
                    "Realized index differs from its definition"
                );
                return Err(ProvisionError::IndexConflict { collection, name: definition.name.clone() });
            }
            Some(_) => {}
        }
    }
    Ok(())
}
