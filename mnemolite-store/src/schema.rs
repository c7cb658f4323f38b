//! The on-disk schema: one chunk table plus an FTS5 external-content table
//! for lexical/trigram search over `text` and `name`.
//!
//! Vectors are never stored as SQLite arrays or blobs here — per the
//! formatting invariant at the store boundary, a vector crossing into
//! persistence is always the literal textual form `"[v1,v2,...]"` (see
//! [`crate::vector_text`]), read back and parsed by this crate alone.

use rusqlite::Connection;

use mnemolite_common::CoreError;

pub fn open(path: &str) -> Result<Connection, CoreError> {
    let conn = Connection::open(path)
        .map_err(|e| CoreError::InternalInvariantViolated(format!("failed to open store at {path}: {e}")))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| CoreError::InternalInvariantViolated(format!("failed to set WAL mode: {e}")))?;
    migrate(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection, CoreError> {
    let conn = Connection::open_in_memory()
        .map_err(|e| CoreError::InternalInvariantViolated(format!("failed to open in-memory store: {e}")))?;
    migrate(&conn)?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id              TEXT PRIMARY KEY,
            repository      TEXT NOT NULL,
            file_path       TEXT NOT NULL,
            name            TEXT NOT NULL,
            name_path       TEXT NOT NULL,
            kind            TEXT NOT NULL,
            language        TEXT NOT NULL,
            start_line      INTEGER NOT NULL,
            end_line        INTEGER NOT NULL,
            start_byte      INTEGER NOT NULL,
            end_byte        INTEGER NOT NULL,
            text            TEXT NOT NULL,
            metadata_json   TEXT NOT NULL,
            embedding_text  TEXT,
            embedding_code  TEXT,
            commit_hash     TEXT,
            indexed_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_repository ON chunks(repository);
        CREATE INDEX IF NOT EXISTS idx_chunks_repository_file ON chunks(repository, file_path);
        CREATE INDEX IF NOT EXISTS idx_chunks_repository_name_path ON chunks(repository, name_path);

        CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
            text,
            name,
            content='chunks',
            content_rowid='rowid',
            tokenize='trigram'
        );

        CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
            INSERT INTO chunks_fts(rowid, text, name) VALUES (new.rowid, new.text, new.name);
        END;

        CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
            INSERT INTO chunks_fts(chunks_fts, rowid, text, name) VALUES ('delete', old.rowid, old.text, old.name);
        END;

        CREATE TRIGGER IF NOT EXISTS chunks_au AFTER UPDATE ON chunks BEGIN
            INSERT INTO chunks_fts(chunks_fts, rowid, text, name) VALUES ('delete', old.rowid, old.text, old.name);
            INSERT INTO chunks_fts(rowid, text, name) VALUES (new.rowid, new.text, new.name);
        END;
        "#,
    )
    .map_err(|e| CoreError::InternalInvariantViolated(format!("schema migration failed: {e}")))?;
    Ok(())
}
