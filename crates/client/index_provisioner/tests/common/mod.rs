//! In-memory index catalog mirroring the MongoDB semantics the provisioner relies on.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;
use ta_index_spec::{Collection, IndexDefinition, IndexKeyPattern, IndexOptions, PRIMARY_KEY_INDEX_NAME};
use ta_index_provisioner::{Ack, IndexDescriptor, StoreError, StoreHandle};

const DUPLICATE_KEY: i32 = 11000;
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;

#[derive(Default)]
struct CollectionState {
    indexes: Vec<IndexDescriptor>,
    documents: Vec<Value>,
}

#[derive(Default)]
struct State {
    collections: BTreeMap<Collection, CollectionState>,
    unavailable: bool,
    created: usize,
    create_calls: Vec<(Collection, String)>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn primary_key() -> IndexDescriptor {
    IndexDescriptor {
        name: PRIMARY_KEY_INDEX_NAME.to_string(),
        key_pattern: IndexKeyPattern::new().asc("_id"),
        options: IndexOptions::default(),
    }
}

/// Value at a dot-path; array elements are not traversed, which is enough for these tests.
fn lookup<'a>(document: &'a Value, path: &str) -> &'a Value {
    path.split('.').try_fold(document, |value, segment| value.get(segment)).unwrap_or(&Value::Null)
}

fn index_key(document: &Value, pattern: &IndexKeyPattern) -> Vec<Value> {
    pattern.iter().map(|key| lookup(document, &key.field).clone()).collect()
}

impl CollectionState {
    fn new() -> Self {
        Self { indexes: vec![primary_key()], documents: Vec::new() }
    }

    fn has_duplicates(&self, pattern: &IndexKeyPattern) -> bool {
        let mut seen = Vec::new();
        for document in &self.documents {
            let key = index_key(document, pattern);
            if seen.contains(&key) {
                return true;
            }
            seen.push(key);
        }
        false
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an index directly, as if created by someone else.
    pub fn seed_index(&self, collection: Collection, descriptor: IndexDescriptor) {
        let mut state = self.state.lock().unwrap();
        state.collections.entry(collection).or_insert_with(CollectionState::new).indexes.push(descriptor);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    /// Number of indexes actually built so far.
    pub fn created(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub fn create_calls(&self) -> Vec<(Collection, String)> {
        self.state.lock().unwrap().create_calls.clone()
    }

    pub fn index(&self, collection: Collection, name: &str) -> Option<IndexDescriptor> {
        let state = self.state.lock().unwrap();
        state.collections.get(&collection)?.indexes.iter().find(|d| d.name == name).cloned()
    }

    pub fn collection_exists(&self, collection: Collection) -> bool {
        self.state.lock().unwrap().collections.contains_key(&collection)
    }

    pub fn remove_document(&self, collection: Collection, mut predicate: impl FnMut(&Value) -> bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(state) = state.collections.get_mut(&collection) {
            state.documents.retain(|document| !predicate(document));
        }
    }

    /// Inserts a document, enforcing every unique index of the collection.
    pub fn insert(&self, collection: Collection, document: Value) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let state = state.collections.entry(collection).or_insert_with(CollectionState::new);

        for index in state.indexes.iter().filter(|index| index.options.unique) {
            let key = index_key(&document, &index.key_pattern);
            if state.documents.iter().any(|existing| index_key(existing, &index.key_pattern) == key) {
                return Err(StoreError::Rejected {
                    code: Some(DUPLICATE_KEY),
                    message: format!("E11000 duplicate key error collection: {collection} index: {}", index.name),
                });
            }
        }

        state.documents.push(document);
        Ok(())
    }
}

#[async_trait]
impl StoreHandle for MemoryStore {
    async fn create_index(&self, definition: &IndexDefinition) -> Result<Ack, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(StoreError::Unavailable("Server selection timeout: No available servers".to_string()));
        }
        state.create_calls.push((definition.collection, definition.name.clone()));

        let requested = IndexDescriptor::from(definition);
        let collection = state.collections.entry(definition.collection).or_insert_with(CollectionState::new);

        if let Some(existing) = collection.indexes.iter().find(|index| index.name == requested.name) {
            if *existing == requested {
                return Ok(Ack::AlreadyPresent);
            }
            return Err(StoreError::SpecConflict {
                code: Some(INDEX_KEY_SPECS_CONFLICT),
                message: format!("An existing index has the same name as the requested index: {}", existing.name),
            });
        }
        if let Some(existing) = collection.indexes.iter().find(|index| index.key_pattern == requested.key_pattern) {
            return Err(StoreError::Rejected {
                code: Some(INDEX_OPTIONS_CONFLICT),
                message: format!("Index already exists with a different name: {}", existing.name),
            });
        }
        if requested.options.unique && collection.has_duplicates(&requested.key_pattern) {
            return Err(StoreError::Rejected {
                code: Some(DUPLICATE_KEY),
                message: format!("E11000 duplicate key error collection: {}", definition.collection),
            });
        }

        collection.indexes.push(requested);
        state.created += 1;
        Ok(Ack::Created)
    }

    async fn list_indexes(&self, collection: Collection) -> Result<Vec<IndexDescriptor>, StoreError> {
        let state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(StoreError::Unavailable("Server selection timeout: No available servers".to_string()));
        }
        Ok(state.collections.get(&collection).map(|c| c.indexes.clone()).unwrap_or_default())
    }
}
