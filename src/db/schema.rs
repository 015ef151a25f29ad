//! Database schema and migrations for Sharebox.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL COLLATE NOCASE,
    password    TEXT NOT NULL,           -- Argon2 hash
    username    TEXT COLLATE NOCASE,     -- optional display name
    is_admin    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE UNIQUE INDEX idx_users_email ON users(email COLLATE NOCASE);
CREATE UNIQUE INDEX idx_users_username ON users(username COLLATE NOCASE);
"#,
    // v2: files
    r#"
CREATE TABLE files (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id            INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    public_id           TEXT NOT NULL,
    original_filename   TEXT NOT NULL,
    mime_type           TEXT NOT NULL,
    size                INTEGER NOT NULL CHECK (size >= 0),
    storage_path        TEXT NOT NULL,
    share_code          TEXT,
    created_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE UNIQUE INDEX idx_files_public_id ON files(public_id);
CREATE UNIQUE INDEX idx_files_share_code ON files(share_code);
CREATE UNIQUE INDEX idx_files_storage_path ON files(storage_path);
CREATE INDEX idx_files_owner_created ON files(owner_id, created_at);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert_eq!(MIGRATIONS.len(), 2);
    }

    #[test]
    fn test_first_migration_contains_users_table() {
        assert!(MIGRATIONS[0].contains("CREATE TABLE users"));
    }

    #[test]
    fn test_files_migration_has_unique_indexes() {
        let files = MIGRATIONS[1];
        assert!(files.contains("CREATE UNIQUE INDEX idx_files_public_id"));
        assert!(files.contains("CREATE UNIQUE INDEX idx_files_share_code"));
    }
}
