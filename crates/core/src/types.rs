/// Backend entity identifiers are opaque strings issued by the server.
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
