//! SQL statements used by the PostgreSQL stores.

/// Creates the completion record table when it does not exist yet.
pub const CREATE_INDEX_INFO_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS index_info (
    id BIGINT PRIMARY KEY,
    indexed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    language TEXT NOT NULL,
    meta JSONB NOT NULL DEFAULT '{}'::jsonb
)
"#;

pub const SELECT_MAX_INDEXED_ID: &str = "SELECT MAX(id) AS max_id FROM index_info";

/// Atomic insert-or-update keyed by entry id; the last write wins.
pub const UPSERT_INDEX_INFO: &str = r#"
INSERT INTO index_info (id, language, meta, indexed_at) VALUES ($1, $2, $3, now())
ON CONFLICT (id) DO UPDATE SET language = $2, meta = $3, indexed_at = now()
"#;

pub const SELECT_INDEX_INFO: &str =
    "SELECT id, indexed_at, language, meta FROM index_info WHERE id = $1";

pub const SELECT_ENTRIES_AFTER: &str =
    "SELECT id, title, content FROM entries WHERE id > $1 ORDER BY id LIMIT $2";

/// Title tokens get weight A, content tokens weight B.
pub const UPDATE_DOCUMENT_VECTORS: &str = r#"
UPDATE entries
SET
    document_vectors = setweight(to_tsvector('simple', $1), 'A') || setweight(to_tsvector('simple', $2), 'B')
WHERE id = $3
"#;

pub const INSERT_ENTRY: &str = "INSERT INTO entries (id, title, content) VALUES ($1, $2, $3)";
