use async_trait::async_trait;
use ta_index_spec::{Collection, IndexDefinition, IndexKeyPattern, IndexOptions};
use thiserror::Error;

/// Outcome of a successful index creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The index was built by this call.
    Created,
    /// An index with the same name and identical specification already existed.
    AlreadyPresent,
}

/// An index as realized in the store's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub key_pattern: IndexKeyPattern,
    pub options: IndexOptions,
}

impl IndexDescriptor {
    /// Whether this catalog entry realizes `definition` exactly.
    pub fn matches(&self, definition: &IndexDefinition) -> bool {
        self.name == definition.name && self.key_pattern == definition.key_pattern && self.options == definition.options
    }
}

impl From<&IndexDefinition> for IndexDescriptor {
    fn from(definition: &IndexDefinition) -> Self {
        Self { name: definition.name.clone(), key_pattern: definition.key_pattern.clone(), options: definition.options }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Same name and identical specification. Stores that do not fold this case
    /// into a successful [`Ack::AlreadyPresent`] report it here.
    #[error("Index already exists: {0}")]
    AlreadyExists(String),

    /// An index with the same name (or the same keys) exists with a different specification.
    #[error("Index specification conflict (code {code:?}): {message}")]
    SpecConflict { code: Option<i32>, message: String },

    /// Connectivity, authentication or timeout failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other failure reported by the store, e.g. duplicate keys while building a unique index.
    #[error("Store rejected the operation (code {code:?}): {message}")]
    Rejected { code: Option<i32>, message: String },

    /// A catalog entry that cannot be expressed as an [`IndexDescriptor`].
    #[error("Malformed index catalog entry: {0}")]
    Malformed(String),
}

/// Index catalog capability of a document store.
///
/// Implementations must apply `create_index` idempotently by name: identical
/// re-creation succeeds, divergent re-creation fails with
/// [`StoreError::SpecConflict`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreHandle: Send + Sync {
    /// create_index - Create `definition` on its collection, creating the collection if needed
    async fn create_index(&self, definition: &IndexDefinition) -> Result<Ack, StoreError>;

    /// list_indexes - List every index of `collection`, including the primary key index.
    /// A collection that does not exist yet has no indexes.
    async fn list_indexes(&self, collection: Collection) -> Result<Vec<IndexDescriptor>, StoreError>;
}
