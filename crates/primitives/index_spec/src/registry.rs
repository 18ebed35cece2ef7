use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::{Collection, IndexDefinition, IndexKeyPattern, IndexOptions, RegistryError};

/// Retention of raw DEX price ticks, in seconds (90 days).
pub const DEX_PRICE_RETENTION_SECS: u32 = 7_776_000;

/// Name of the index the store creates implicitly on `_id` for every collection.
pub const PRIMARY_KEY_INDEX_NAME: &str = "_id_";

const TOKEN_ANALYZER_LAYOUT_VERSION: &str = "2025-11-06";

/// Immutable mapping from collection to the ordered indexes it must carry.
///
/// Every member of the closed [`Collection`] set has an entry, possibly empty.
/// The invariants checked by [`Registry::new`] hold for the whole lifetime of
/// the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    version: String,
    indexes: BTreeMap<Collection, Vec<IndexDefinition>>,
}

/// On-disk layout, also used by [`Registry::to_yaml_string`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryLayout {
    version: String,
    collections: BTreeMap<String, Vec<IndexEntry>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexEntry {
    name: String,
    keys: IndexKeyPattern,
    #[serde(default)]
    options: IndexOptions,
}

impl Registry {
    /// Builds a registry, grouping definitions by their collection while
    /// preserving their relative order.
    pub fn new(
        version: impl Into<String>,
        definitions: impl IntoIterator<Item = IndexDefinition>,
    ) -> Result<Self, RegistryError> {
        let indexes = group_by_collection(definitions);
        for (collection, definitions) in &indexes {
            validate_collection(*collection, definitions)?;
        }

        Ok(Self { version: version.into(), indexes })
    }

    /// The index layout of the token analyzer store.
    pub fn token_analyzer() -> Self {
        use Collection::*;

        let definitions = vec![
            IndexDefinition::new(Tokens, "idx_address_unique", IndexKeyPattern::new().asc("address")).unique(),
            IndexDefinition::new(Tokens, "idx_symbol", IndexKeyPattern::new().asc("symbol")),
            IndexDefinition::new(
                Tokens,
                "idx_price_score",
                IndexKeyPattern::new().desc("latest_price.dex_price").desc("latest_score.score"),
            ),
            IndexDefinition::new(Tokens, "idx_latest_score", IndexKeyPattern::new().desc("latest_score.score")),
            IndexDefinition::new(
                Tokens,
                "idx_risk_flags",
                IndexKeyPattern::new().asc("is_proxy").asc("is_upgradeable"),
            ),
            // time series
            IndexDefinition::new(
                DexPrices,
                "idx_token_timestamp",
                IndexKeyPattern::new().asc("token_address").desc("timestamp"),
            ),
            IndexDefinition::new(DexPrices, "idx_ttl_30days", IndexKeyPattern::new().asc("timestamp"))
                .expire_after_seconds(DEX_PRICE_RETENTION_SECS),
            IndexDefinition::new(DexPrices, "idx_hour", IndexKeyPattern::new().asc("hour")),
            IndexDefinition::new(
                CexPrices,
                "idx_symbol_timestamp",
                IndexKeyPattern::new().asc("token_symbol").desc("timestamp"),
            ),
            IndexDefinition::new(
                CexPrices,
                "idx_exchange_timestamp",
                IndexKeyPattern::new().asc("exchange").desc("timestamp"),
            ),
            IndexDefinition::new(
                TokenHolders,
                "idx_token_snapshot_unique",
                IndexKeyPattern::new().asc("token_address").desc("snapshot_date"),
            )
            .unique(),
            IndexDefinition::new(TokenHolders, "idx_snapshot_date", IndexKeyPattern::new().desc("snapshot_date")),
            IndexDefinition::new(TokenHolders, "idx_holder_address", IndexKeyPattern::new().asc("holders.address")),
            IndexDefinition::new(TokenHolders, "idx_concentration", IndexKeyPattern::new().desc("top10_concentration")),
            IndexDefinition::new(
                TokenScores,
                "idx_token_timestamp",
                IndexKeyPattern::new().asc("token_address").desc("timestamp"),
            ),
            IndexDefinition::new(
                TokenScores,
                "idx_score_timestamp",
                IndexKeyPattern::new().desc("score").desc("timestamp"),
            ),
            IndexDefinition::new(
                Alerts,
                "idx_token_timestamp",
                IndexKeyPattern::new().asc("token_address").desc("timestamp"),
            ),
            IndexDefinition::new(
                Alerts,
                "idx_severity_timestamp",
                IndexKeyPattern::new().asc("severity").desc("timestamp"),
            ),
            IndexDefinition::new(
                Alerts,
                "idx_acknowledged_timestamp",
                IndexKeyPattern::new().asc("acknowledged").desc("timestamp"),
            ),
        ];

        // Checked by `token_analyzer_layout_is_valid`.
        Self { version: TOKEN_ANALYZER_LAYOUT_VERSION.to_string(), indexes: group_by_collection(definitions) }
    }

    /// Parses a YAML layout.
    ///
    /// ```yaml
    /// version: "2025-11-06"
    /// collections:
    ///   tokens:
    ///     - name: idx_address_unique
    ///       keys:
    ///         - { field: address, direction: asc }
    ///       options: { unique: true }
    /// ```
    pub fn from_yaml_str(content: &str) -> Result<Self, RegistryError> {
        let layout: RegistryLayout = serde_yaml::from_str(content)?;

        let mut definitions = Vec::new();
        for (name, entries) in layout.collections {
            let collection = Collection::parse(&name)?;
            definitions.extend(
                entries.into_iter().map(|entry| {
                    IndexDefinition::new(collection, entry.name, entry.keys).with_options(entry.options)
                }),
            );
        }

        Self::new(layout.version, definitions)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| RegistryError::Io { path: path.to_path_buf(), source })?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> Result<String, RegistryError> {
        let collections = self
            .indexes
            .iter()
            .filter(|(_, definitions)| !definitions.is_empty())
            .map(|(collection, definitions)| {
                let entries = definitions
                    .iter()
                    .map(|d| IndexEntry { name: d.name.clone(), keys: d.key_pattern.clone(), options: d.options })
                    .collect();
                (collection.as_str().to_string(), entries)
            })
            .collect();

        Ok(serde_yaml::to_string(&RegistryLayout { version: self.version.clone(), collections })?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The closed set of collections, in provisioning order.
    pub fn all_collections(&self) -> &'static [Collection] {
        &Collection::ALL
    }

    /// Definitions filed under `collection`, in creation order.
    pub fn definitions(&self, collection: Collection) -> &[IndexDefinition] {
        self.indexes.get(&collection).map(Vec::as_slice).unwrap_or_default()
    }

    /// Looks definitions up by store collection name.
    pub fn definitions_for(&self, collection: &str) -> Result<&[IndexDefinition], RegistryError> {
        Ok(self.definitions(Collection::parse(collection)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.indexes.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.indexes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::token_analyzer()
    }
}

fn group_by_collection(
    definitions: impl IntoIterator<Item = IndexDefinition>,
) -> BTreeMap<Collection, Vec<IndexDefinition>> {
    let mut indexes: BTreeMap<Collection, Vec<IndexDefinition>> =
        Collection::ALL.iter().map(|collection| (*collection, Vec::new())).collect();
    for definition in definitions {
        indexes.entry(definition.collection).or_default().push(definition);
    }
    indexes
}

fn validate_collection(collection: Collection, definitions: &[IndexDefinition]) -> Result<(), RegistryError> {
    let mut names = HashSet::new();
    let mut patterns: Vec<(&IndexKeyPattern, &str)> = Vec::with_capacity(definitions.len());

    for definition in definitions {
        if definition.name.is_empty() {
            return Err(RegistryError::EmptyName { collection });
        }
        if definition.key_pattern.is_empty() {
            return Err(RegistryError::EmptyKeyPattern { collection, name: definition.name.clone() });
        }
        if !names.insert(definition.name.as_str()) {
            return Err(RegistryError::DuplicateName { collection, name: definition.name.clone() });
        }
        if !definition.has_valid_ttl_shape() {
            return Err(RegistryError::InvalidTtl { collection, name: definition.name.clone() });
        }
        if let Some((_, first)) = patterns.iter().find(|(pattern, _)| **pattern == definition.key_pattern) {
            return Err(RegistryError::DuplicateKeyPattern {
                collection,
                first: first.to_string(),
                second: definition.name.clone(),
            });
        }
        patterns.push((&definition.key_pattern, &definition.name));
    }

    Ok(())
}
