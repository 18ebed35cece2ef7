use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::IndexOptions as MongoIndexOptions;
use mongodb::IndexModel;
use ta_index_spec::{Direction, IndexDefinition, IndexKeyPattern, IndexOptions};

use crate::store::{Ack, IndexDescriptor, StoreError};

// Server error codes, see https://www.mongodb.com/docs/manual/reference/error-codes/
const HOST_UNREACHABLE: i32 = 6;
const HOST_NOT_FOUND: i32 = 7;
const UNAUTHORIZED: i32 = 13;
const AUTHENTICATION_FAILED: i32 = 18;
pub(crate) const NAMESPACE_NOT_FOUND: i32 = 26;
const MAX_TIME_MS_EXPIRED: i32 = 50;
const INDEX_ALREADY_EXISTS: i32 = 68;
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
const NETWORK_TIMEOUT: i32 = 89;
const SHUTDOWN_IN_PROGRESS: i32 = 91;
const PRIMARY_STEPPED_DOWN: i32 = 189;
const EXCEEDED_TIME_LIMIT: i32 = 262;
const SOCKET_EXCEPTION: i32 = 9001;
const NOT_WRITABLE_PRIMARY: i32 = 10107;
const INTERRUPTED_AT_SHUTDOWN: i32 = 11600;

const ALL_INDEXES_EXIST_NOTE: &str = "all indexes already exist";
// Code 85 also reports a key pattern that is already indexed under another name.
const DIFFERENT_NAME_MESSAGE: &str = "already exists with a different name";

/// `{ field: 1 | -1, ... }` in key order.
pub fn key_pattern_document(pattern: &IndexKeyPattern) -> Document {
    pattern.iter().map(|key| (key.field.clone(), Bson::Int32(key.direction.as_i32()))).collect()
}

/// Reads a catalog `key` document. Only ascending / descending keys are supported.
pub fn key_pattern_from_document(keys: &Document) -> Result<IndexKeyPattern, StoreError> {
    keys.iter()
        .map(|(field, value)| {
            let numeric = match value {
                Bson::Int32(v) => Some(f64::from(*v)),
                Bson::Int64(v) => Some(*v as f64),
                Bson::Double(v) => Some(*v),
                _ => None,
            };
            numeric
                .and_then(Direction::from_catalog_value)
                .map(|direction| (field.clone(), direction))
                .ok_or_else(|| StoreError::Malformed(format!("unsupported key {field}: {value}")))
        })
        .collect()
}

/// Single entry of the `indexes` array of a `createIndexes` command.
pub(crate) fn index_spec_document(definition: &IndexDefinition) -> Document {
    let mut spec = doc! {
        "key": key_pattern_document(&definition.key_pattern),
        "name": definition.name.as_str(),
    };
    if definition.options.unique {
        spec.insert("unique", true);
    }
    if let Some(seconds) = definition.options.expire_after_seconds {
        spec.insert("expireAfterSeconds", i64::from(seconds));
    }
    spec
}

pub(crate) fn create_indexes_command(definition: &IndexDefinition) -> Document {
    doc! {
        "createIndexes": definition.collection.as_str(),
        "indexes": [index_spec_document(definition)],
    }
}

fn numeric_field(response: &Document, key: &str) -> Option<i64> {
    match response.get(key) {
        Some(Bson::Int32(v)) => Some(i64::from(*v)),
        Some(Bson::Int64(v)) => Some(*v),
        Some(Bson::Double(v)) => Some(*v as i64),
        _ => None,
    }
}

/// Interprets a successful `createIndexes` response.
pub(crate) fn ack_from_response(response: &Document) -> Ack {
    if response.get_str("note").is_ok_and(|note| note.contains(ALL_INDEXES_EXIST_NOTE)) {
        return Ack::AlreadyPresent;
    }
    match (numeric_field(response, "numIndexesBefore"), numeric_field(response, "numIndexesAfter")) {
        (Some(before), Some(after)) if before == after => Ack::AlreadyPresent,
        _ => Ack::Created,
    }
}

pub(crate) fn descriptor_from_model(model: IndexModel) -> Result<IndexDescriptor, StoreError> {
    let options: MongoIndexOptions = model.options.unwrap_or_default();
    let name = options.name.ok_or_else(|| StoreError::Malformed(format!("index without a name: {}", model.keys)))?;
    let key_pattern = key_pattern_from_document(&model.keys)?;
    let expire_after_seconds = options
        .expire_after
        .map(|ttl| u32::try_from(ttl.as_secs()))
        .transpose()
        .map_err(|_| StoreError::Malformed(format!("expireAfterSeconds of {name} out of range")))?;

    Ok(IndexDescriptor {
        name,
        key_pattern,
        options: IndexOptions { unique: options.unique.unwrap_or(false), expire_after_seconds },
    })
}

/// Server error code carried by `error`, if any.
pub(crate) fn server_code(error: &MongoError) -> Option<i32> {
    match &*error.kind {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        _ => None,
    }
}

/// Maps a driver error onto the store error taxonomy.
pub fn classify_error(error: MongoError) -> StoreError {
    let message = error.to_string();
    if let Some(code) = server_code(&error) {
        return classify_code(code, message);
    }
    match &*error.kind {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::Authentication { .. }
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. } => StoreError::Unavailable(message),
        _ => StoreError::Rejected { code: None, message },
    }
}

pub(crate) fn classify_code(code: i32, message: String) -> StoreError {
    match code {
        INDEX_ALREADY_EXISTS => StoreError::AlreadyExists(message),
        INDEX_OPTIONS_CONFLICT if message.contains(DIFFERENT_NAME_MESSAGE) => {
            StoreError::Rejected { code: Some(code), message }
        }
        INDEX_OPTIONS_CONFLICT | INDEX_KEY_SPECS_CONFLICT => StoreError::SpecConflict { code: Some(code), message },
        HOST_UNREACHABLE
        | HOST_NOT_FOUND
        | UNAUTHORIZED
        | AUTHENTICATION_FAILED
        | MAX_TIME_MS_EXPIRED
        | NETWORK_TIMEOUT
        | SHUTDOWN_IN_PROGRESS
        | PRIMARY_STEPPED_DOWN
        | EXCEEDED_TIME_LIMIT
        | SOCKET_EXCEPTION
        | NOT_WRITABLE_PRIMARY
        | INTERRUPTED_AT_SHUTDOWN => StoreError::Unavailable(message),
        _ => StoreError::Rejected { code: Some(code), message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use std::time::Duration;
    use ta_index_spec::{Collection, Registry};

    fn definition(collection: Collection, name: &str) -> IndexDefinition {
        Registry::token_analyzer().definitions(collection).iter().find(|d| d.name == name).cloned().unwrap()
    }

    #[test]
    fn key_document_preserves_order() {
        let keys =
            key_pattern_document(&IndexKeyPattern::new().desc("latest_price.dex_price").desc("latest_score.score"));
        assert_eq!(keys, doc! { "latest_price.dex_price": -1, "latest_score.score": -1 });
        assert_eq!(keys.keys().collect::<Vec<_>>(), ["latest_price.dex_price", "latest_score.score"]);
    }

    #[test]
    fn ttl_spec_document() {
        let spec = index_spec_document(&definition(Collection::DexPrices, "idx_ttl_30days"));
        assert_eq!(
            spec,
            doc! { "key": { "timestamp": 1 }, "name": "idx_ttl_30days", "expireAfterSeconds": 7_776_000_i64 }
        );
    }

    #[test]
    fn unique_create_indexes_command() {
        let command = create_indexes_command(&definition(Collection::TokenHolders, "idx_token_snapshot_unique"));
        assert_eq!(
            command,
            doc! {
                "createIndexes": "token_holders",
                "indexes": [{
                    "key": { "token_address": 1, "snapshot_date": -1 },
                    "name": "idx_token_snapshot_unique",
                    "unique": true,
                }],
            }
        );
    }

    #[rstest]
    #[case::int32(doc! { "token_address": 1, "timestamp": -1 })]
    #[case::int64(doc! { "token_address": 1_i64, "timestamp": -1_i64 })]
    #[case::double(doc! { "token_address": 1.0, "timestamp": -1.0 })]
    fn key_pattern_from_numeric_documents(#[case] keys: Document) {
        assert_eq!(
            key_pattern_from_document(&keys).unwrap(),
            IndexKeyPattern::new().asc("token_address").desc("timestamp")
        );
    }

    #[rstest]
    #[case::text(doc! { "symbol": "text" })]
    #[case::geo(doc! { "location": "2dsphere" })]
    #[case::zero(doc! { "hour": 0 })]
    fn key_pattern_rejects_special_indexes(#[case] keys: Document) {
        assert_matches!(key_pattern_from_document(&keys), Err(StoreError::Malformed(_)));
    }

    #[rstest]
    #[case::fresh(
        doc! { "numIndexesBefore": 1, "numIndexesAfter": 2, "createdCollectionAutomatically": true, "ok": 1.0 },
        Ack::Created
    )]
    #[case::same_counts(doc! { "numIndexesBefore": 4, "numIndexesAfter": 4, "ok": 1.0 }, Ack::AlreadyPresent)]
    #[case::note(doc! { "numIndexesBefore": 4, "note": "all indexes already exist", "ok": 1.0 }, Ack::AlreadyPresent)]
    #[case::sharded_without_counts(doc! { "raw": {}, "ok": 1.0 }, Ack::Created)]
    fn create_indexes_response(#[case] response: Document, #[case] expected: Ack) {
        assert_eq!(ack_from_response(&response), expected);
    }

    #[test]
    fn descriptor_from_catalog_model() {
        let model = IndexModel::builder()
            .keys(doc! { "timestamp": 1 })
            .options(
                MongoIndexOptions::builder()
                    .name("idx_ttl_30days".to_string())
                    .expire_after(Duration::from_secs(7_776_000))
                    .build(),
            )
            .build();

        let descriptor = descriptor_from_model(model).unwrap();
        assert!(descriptor.matches(&definition(Collection::DexPrices, "idx_ttl_30days")));
    }

    #[test]
    fn descriptor_requires_name() {
        let model = IndexModel::builder().keys(doc! { "hour": 1 }).build();
        assert_matches!(descriptor_from_model(model), Err(StoreError::Malformed(_)));
    }

    #[rstest]
    #[case::already_exists(68, "already exists")]
    #[case::options_conflict(85, "conflict")]
    #[case::key_specs_conflict(86, "conflict")]
    #[case::duplicate_key(11000, "rejected")]
    #[case::auth_failed(18, "unavailable")]
    #[case::stepped_down(189, "unavailable")]
    #[case::bad_value(2, "rejected")]
    fn command_codes(#[case] code: i32, #[case] expected: &str) {
        let error = classify_code(code, format!("code {code}"));
        let kind = match error {
            StoreError::AlreadyExists(_) => "already exists",
            StoreError::SpecConflict { .. } => "conflict",
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Rejected { code: Some(c), .. } if c == code => "rejected",
            other => panic!("unexpected classification {other:?}"),
        };
        assert_eq!(kind, expected);
    }

    #[rstest]
    #[case::same_name_other_options(
        "Index with name: idx_hour already exists with different options",
        "conflict"
    )]
    #[case::same_keys_other_name(
        "Index already exists with a different name: severity_1_timestamp_-1",
        "rejected"
    )]
    fn index_options_conflict_messages(#[case] message: &str, #[case] expected: &str) {
        let kind = match classify_code(85, message.to_string()) {
            StoreError::SpecConflict { code: Some(85), .. } => "conflict",
            StoreError::Rejected { code: Some(85), .. } => "rejected",
            other => panic!("unexpected classification {other:?}"),
        };
        assert_eq!(kind, expected);
    }
}
