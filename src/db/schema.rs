//! Database schema and migrations for Baketsu.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Folders and file metadata
    r#"
-- Per-account folder tree
CREATE TABLE folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL,
    name        TEXT NOT NULL,
    parent_id   INTEGER REFERENCES folders(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

-- NULL parents never compare equal, so root names get their own index
CREATE UNIQUE INDEX idx_folders_unique_child ON folders(user_id, parent_id, name)
    WHERE parent_id IS NOT NULL;
CREATE UNIQUE INDEX idx_folders_unique_root ON folders(user_id, name)
    WHERE parent_id IS NULL;
CREATE INDEX idx_folders_parent ON folders(parent_id);

-- Stored object metadata; rows are soft-deleted so billing can prorate
CREATE TABLE files (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL,
    folder_id    INTEGER REFERENCES folders(id) ON DELETE SET NULL,
    filename     TEXT NOT NULL,
    file_key     TEXT NOT NULL,
    file_size    INTEGER NOT NULL CHECK (file_size >= 0),
    uploaded_at  TEXT NOT NULL,
    deleted_at   TEXT
);

CREATE INDEX idx_files_user ON files(user_id);
CREATE INDEX idx_files_folder ON files(folder_id);
CREATE INDEX idx_files_key ON files(file_key);
"#,
    // v2: Monthly invoices
    r#"
CREATE TABLE invoices (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id              INTEGER NOT NULL,
    billing_year         INTEGER NOT NULL,
    billing_month        INTEGER NOT NULL CHECK (billing_month BETWEEN 1 AND 12),
    total_gb_days_centi  INTEGER NOT NULL,
    cost_cents           INTEGER NOT NULL CHECK (cost_cents >= 0),
    status               TEXT NOT NULL DEFAULT 'pending',  -- 'pending', 'paid', 'failed', 'refunded'
    created_at           TEXT NOT NULL,
    due_date             TEXT NOT NULL,
    paid_at              TEXT,
    details              TEXT,                              -- JSON breakdown
    UNIQUE (user_id, billing_year, billing_month)
);

CREATE INDEX idx_invoices_user ON invoices(user_id, created_at);
"#,
];
