//! MongoDB implementation of the index catalog capability.
//!
//! Index specs are sent through the `createIndexes` command so the server's
//! `numIndexesBefore` / `numIndexesAfter` counters tell a fresh build apart
//! from an already converged index.

mod client;
mod codec;

pub use client::MongoStore;
pub use codec::{classify_error, key_pattern_document, key_pattern_from_document};
