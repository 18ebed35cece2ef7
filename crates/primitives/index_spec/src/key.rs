use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction of a single indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "asc", alias = "ascending")]
    Ascending,
    #[serde(rename = "desc", alias = "descending")]
    Descending,
}

impl Direction {
    /// Catalog representation (`1` / `-1`).
    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }

    /// Reads a numeric catalog value. Only the sign matters, `0` is not a direction.
    pub fn from_catalog_value(value: f64) -> Option<Self> {
        if value > 0.0 {
            Some(Direction::Ascending)
        } else if value < 0.0 {
            Some(Direction::Descending)
        } else {
            None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexKey {
    /// Dot-path of the field, possibly traversing arrays. Opaque to the engine.
    pub field: String,
    pub direction: Direction,
}

impl IndexKey {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self { field: field.into(), direction }
    }
}

/// Ordered list of indexed fields.
///
/// Order is significant: `{a: 1, b: -1}` and `{b: -1, a: 1}` are different
/// indexes serving different prefix and range queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexKeyPattern(Vec<IndexKey>);

impl IndexKeyPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(self, field: impl Into<String>) -> Self {
        self.with(field, Direction::Ascending)
    }

    pub fn desc(self, field: impl Into<String>) -> Self {
        self.with(field, Direction::Descending)
    }

    pub fn with(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.0.push(IndexKey::new(field, direction));
        self
    }

    pub fn keys(&self) -> &[IndexKey] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexKey> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<IndexKey>> for IndexKeyPattern {
    fn from(keys: Vec<IndexKey>) -> Self {
        Self(keys)
    }
}

impl<S: Into<String>> FromIterator<(S, Direction)> for IndexKeyPattern {
    fn from_iter<I: IntoIterator<Item = (S, Direction)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(field, direction)| IndexKey::new(field, direction)).collect())
    }
}

impl fmt::Display for IndexKeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key.field, key.direction)?;
        }
        write!(f, " }}")
    }
}
