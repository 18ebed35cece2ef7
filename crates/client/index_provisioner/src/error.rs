use ta_index_spec::Collection;
use thiserror::Error;

use crate::store::StoreError;

/// Terminal failure of a provisioning or verification run.
///
/// Every variant identifies the collection (and index, when one is involved)
/// the run stopped at. Nothing is retried.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Index {name} on collection {collection} exists with a different specification")]
    IndexConflict { collection: Collection, name: String },

    #[error("Failed to create index {name} on collection {collection}: {cause}")]
    IndexCreationFailed {
        collection: Collection,
        name: String,
        #[source]
        cause: StoreError,
    },

    #[error("Store unavailable while provisioning collection {collection}: {cause}")]
    StoreUnavailable {
        collection: Collection,
        #[source]
        cause: StoreError,
    },

    #[error("Failed to list indexes of collection {collection}: {cause}")]
    InventoryFailed {
        collection: Collection,
        #[source]
        cause: StoreError,
    },

    #[error("Index {name} is missing from collection {collection}")]
    VerificationFailed { collection: Collection, name: String },
}

impl ProvisionError {
    /// Collection the run stopped at, if any.
    pub fn collection(&self) -> Option<Collection> {
        match self {
            ProvisionError::UnknownCollection(_) => None,
            ProvisionError::IndexConflict { collection, .. }
            | ProvisionError::IndexCreationFailed { collection, .. }
            | ProvisionError::StoreUnavailable { collection, .. }
            | ProvisionError::InventoryFailed { collection, .. }
            | ProvisionError::VerificationFailed { collection, .. } => Some(*collection),
        }
    }
}
