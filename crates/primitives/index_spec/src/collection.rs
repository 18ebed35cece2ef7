use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::RegistryError;

/// Logical collections of the token analyzer store.
///
/// The set is closed: adding a collection means adding a variant here and
/// filing its indexes in the registry. Variant order is the provisioning order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Tokens,
    DexPrices,
    CexPrices,
    TokenHolders,
    TokenScores,
    Alerts,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Tokens,
        Collection::DexPrices,
        Collection::CexPrices,
        Collection::TokenHolders,
        Collection::TokenScores,
        Collection::Alerts,
    ];

    /// Name of the collection in the store.
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Parses a store collection name, failing with
    /// [`RegistryError::UnknownCollection`] outside the closed set.
    pub fn parse(name: &str) -> Result<Self, RegistryError> {
        Collection::from_str(name).map_err(|_| RegistryError::UnknownCollection(name.to_string()))
    }
}
