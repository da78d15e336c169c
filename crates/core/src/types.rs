/// All entity identifiers are UUIDv7, rendered as opaque strings on the wire.
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (no time-of-day, no zone).
pub type Date = chrono::NaiveDate;

/// Generate a fresh, time-ordered entity identifier.
pub fn new_entity_id() -> EntityId {
    uuid::Uuid::now_v7()
}
