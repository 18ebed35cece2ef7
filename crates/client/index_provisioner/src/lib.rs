//! Index provisioning for the token analyzer document store.
//!
//! The [`Provisioner`] walks a [`Registry`](ta_index_spec::Registry) and applies
//! every index definition against a [`StoreHandle`], one at a time, then lists
//! the realized indexes of each collection and folds them into a
//! [`ProvisionReport`].
//!
//! ## Guarantees
//!
//! - **Idempotent**: re-running against a converged store creates nothing and
//!   returns an identical report.
//! - **Fail-fast**: the first conflict, rejected creation or connectivity
//!   failure aborts the run. Indexes applied before the failure stay in place
//!   and a later run resumes from there.
//! - **No hidden state**: the store is passed in by the caller and never
//!   closed or reconnected.
//!
//! A MongoDB implementation of [`StoreHandle`] lives in [`mongodb`].

pub mod config;
pub mod error;
pub mod metrics;
pub mod mongodb;
pub mod provisioner;
pub mod report;
pub mod store;

pub use config::StoreConfig;
pub use error::ProvisionError;
pub use provisioner::{provision, verify, Provisioner};
pub use report::{CollectionReport, ProvisionReport};
pub use store::{Ack, IndexDescriptor, StoreError, StoreHandle};
