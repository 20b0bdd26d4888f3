//! SQLite schema definition.

/// Local storage schema: one JSON value per key.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL CHECK (json_valid(value)),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
