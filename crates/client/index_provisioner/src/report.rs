//! Index inventory returned by a provisioning or verification run.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use ta_index_spec::{Collection, PRIMARY_KEY_INDEX_NAME};

use crate::store::IndexDescriptor;

/// Realized indexes of a single collection.
///
/// The primary key index the store maintains on every collection is not part
/// of `index_count` / `index_names`; it is only reflected by `primary_key_present`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub index_count: usize,
    pub index_names: BTreeSet<String>,
    pub primary_key_present: bool,
}

impl CollectionReport {
    pub fn from_descriptors(descriptors: &[IndexDescriptor]) -> Self {
        let mut report = Self::default();
        for descriptor in descriptors {
            if descriptor.name == PRIMARY_KEY_INDEX_NAME {
                report.primary_key_present = true;
            } else {
                report.index_names.insert(descriptor.name.clone());
            }
        }
        report.index_count = report.index_names.len();
        report
    }
}

/// Snapshot of the index catalog, keyed by collection in provisioning order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProvisionReport {
    collections: BTreeMap<Collection, CollectionReport>,
}

impl ProvisionReport {
    pub fn get(&self, collection: Collection) -> Option<&CollectionReport> {
        self.collections.get(&collection)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Collection, &CollectionReport)> {
        self.collections.iter().map(|(collection, report)| (*collection, report))
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Secondary indexes across all reported collections.
    pub fn total_index_count(&self) -> usize {
        self.collections.values().map(|report| report.index_count).sum()
    }

    pub(crate) fn insert(&mut self, collection: Collection, report: CollectionReport) {
        self.collections.insert(collection, report);
    }
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, (collection, report)) in self.collections.iter().enumerate() {
            let names: Vec<&str> = report.index_names.iter().map(String::as_str).collect();
            writeln!(
                f,
                "{}. {} index count: {} [{}]",
                position + 1,
                collection,
                report.index_count,
                names.join(", ")
            )?;
        }
        write!(f, "Total: {} indexes across {} collections", self.total_index_count(), self.len())
    }
}
