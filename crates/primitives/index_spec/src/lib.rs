//! Declarative index layout for the token analyzer document store.
//!
//! This crate only describes *what* must exist in the store's index catalog:
//! collections, key patterns, index options and the [`Registry`] that groups
//! index definitions per collection. Applying a layout against a live store is
//! the job of `ta-index-provisioner`.
//!
//! The canonical layout is available through [`Registry::token_analyzer`]:
//!
//! | Collection      | Indexes |
//! |-----------------|---------|
//! | `tokens`        | 5       |
//! | `dex_prices`    | 3       |
//! | `cex_prices`    | 2       |
//! | `token_holders` | 4       |
//! | `token_scores`  | 2       |
//! | `alerts`        | 3       |

mod collection;
mod definition;
mod error;
mod key;
mod registry;

pub use collection::Collection;
pub use definition::{IndexDefinition, IndexOptions};
pub use error::RegistryError;
pub use key::{Direction, IndexKey, IndexKeyPattern};
pub use registry::{Registry, DEX_PRICE_RETENTION_SECS, PRIMARY_KEY_INDEX_NAME};
