use serde::{Deserialize, Serialize};

use crate::{Collection, Direction, IndexKeyPattern};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Options applied to an index at creation time.
///
/// Only uniqueness and expiration are supported; any other key is rejected when
/// a layout is deserialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct IndexOptions {
    /// Reject writes producing a duplicate value for the key pattern.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    /// Background-delete documents whose indexed date is older than now minus this many seconds.
    /// Only valid on a single ascending date field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_after_seconds: Option<u32>,
}

impl IndexOptions {
    pub fn unique() -> Self {
        Self { unique: true, ..Default::default() }
    }

    pub fn expire_after(seconds: u32) -> Self {
        Self { expire_after_seconds: Some(seconds), ..Default::default() }
    }

    pub fn is_ttl(&self) -> bool {
        self.expire_after_seconds.is_some()
    }
}

/// A named index required on a collection.
///
/// The name is the identity of the index in the store: re-applying the same
/// name with the same key pattern and options is a no-op, while the same name
/// with a different specification is a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDefinition {
    pub name: String,
    pub collection: Collection,
    pub key_pattern: IndexKeyPattern,
    pub options: IndexOptions,
}

impl IndexDefinition {
    pub fn new(collection: Collection, name: impl Into<String>, key_pattern: IndexKeyPattern) -> Self {
        Self { name: name.into(), collection, key_pattern, options: IndexOptions::default() }
    }

    pub fn unique(mut self) -> Self {
        self.options.unique = true;
        self
    }

    pub fn expire_after_seconds(mut self, seconds: u32) -> Self {
        self.options.expire_after_seconds = Some(seconds);
        self
    }

    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_ttl(&self) -> bool {
        self.options.is_ttl()
    }

    /// TTL indexes must cover exactly one ascending field.
    pub(crate) fn has_valid_ttl_shape(&self) -> bool {
        !self.is_ttl()
            || matches!(self.key_pattern.keys(), [key] if key.direction == Direction::Ascending)
    }
}
