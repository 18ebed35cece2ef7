use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database, IndexModel};
use std::time::Duration;
use ta_index_spec::{Collection, IndexDefinition};
use tracing::{debug, trace};

use super::codec::{
    ack_from_response, classify_error, create_indexes_command, descriptor_from_model, server_code, NAMESPACE_NOT_FOUND,
};
use crate::config::StoreConfig;
use crate::store::{Ack, IndexDescriptor, StoreError, StoreHandle};

/// Index catalog of a MongoDB database.
///
/// Mongodb client uses Arc internally, cloning the store is cheap.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Connects and pings the database so that bad credentials or an unreachable
    /// server surface before any index is touched.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.mongodb_uri).await.map_err(classify_error)?;
        options.app_name = Some(config.app_name.clone());
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(1);
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        options.server_selection_timeout = Some(Duration::from_secs(config.server_selection_timeout_secs));

        let client = Client::with_options(options).map_err(classify_error)?;
        let store = Self::new(client, &config.database_name);
        store.ping().await?;

        debug!(uri = %config.redacted_uri(), database = %config.database_name, "Connected to MongoDB");
        Ok(store)
    }

    pub fn new(client: Client, database_name: &str) -> Self {
        let database = client.database(database_name);
        Self { client, database }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }, None).await.map_err(classify_error)?;
        Ok(())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

#[async_trait]
impl StoreHandle for MongoStore {
    async fn create_index(&self, definition: &IndexDefinition) -> Result<Ack, StoreError> {
        let command = create_indexes_command(definition);
        trace!(command = %command, "Running createIndexes");

        let response = self.database.run_command(command, None).await.map_err(classify_error)?;
        Ok(ack_from_response(&response))
    }

    async fn list_indexes(&self, collection: Collection) -> Result<Vec<IndexDescriptor>, StoreError> {
        let cursor = match self.database.collection::<Document>(collection.as_str()).list_indexes(None).await {
            Ok(cursor) => cursor,
            Err(e) if server_code(&e) == Some(NAMESPACE_NOT_FOUND) => return Ok(Vec::new()),
            Err(e) => return Err(classify_error(e)),
        };

        let models: Vec<IndexModel> = cursor.try_collect().await.map_err(classify_error)?;
        models.into_iter().map(descriptor_from_model).collect()
    }
}
