//! The Chunk Store: persists chunks and serves lexical and vector
//! queries, fronted by the three-tier cache.
//!
//! `rusqlite::Connection` is `Send` but not `Sync`; the store wraps it in a
//! `Mutex` so one `ChunkStore` can be shared (via `Arc`) across the async
//! tasks of the indexing pipeline.

use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use mnemolite_common::{CoreError, LanguageTag, Span};
use mnemolite_parser::{ChunkKind, ChunkMetadata, CodeChunk};

use crate::cache::ThreeTierCache;
use crate::config::StoreConfig;
use crate::record::{ChunkFilters, ChunkPatch, ChunkRow, LexicalHit, VectorDomain, VectorHit};
use crate::schema;
use crate::vector::VectorIndex;
use crate::vector_text;

pub struct ChunkStore {
    conn: Mutex<rusqlite::Connection>,
    cache: ThreeTierCache,
    vectors: VectorIndex,
}

impl ChunkStore {
    pub fn open(config: &StoreConfig) -> Result<Self, CoreError> {
        let conn = if config.path == ":memory:" {
            schema::open_in_memory()?
        } else {
            schema::open(&config.path)?
        };
        let store = Self {
            conn: Mutex::new(conn),
            cache: ThreeTierCache::new(config.l1_capacity, config.l2_capacity, config.l2_ttl),
            vectors: VectorIndex::new(),
        };
        store.rehydrate_vector_index()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, CoreError> {
        Self::open(&StoreConfig::in_memory())
    }

    /// The shared cache fronting this store, for callers that need its
    /// circuit breaker state (health reporting) rather than a chunk lookup.
    pub fn cache(&self) -> &ThreeTierCache {
        &self.cache
    }

    fn rehydrate_vector_index(&self) -> Result<(), CoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, repository, embedding_text, embedding_code FROM chunks")
            .map_err(sql_err)?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let repository: String = row.get(1)?;
                let text: Option<String> = row.get(2)?;
                let code: Option<String> = row.get(3)?;
                Ok((id, repository, text, code))
            })
            .map_err(sql_err)?;

        for row in rows {
            let (id, repository, text, code) = row.map_err(sql_err)?;
            let id = Uuid::parse_str(&id).map_err(|e| CoreError::InternalInvariantViolated(format!("corrupt chunk id: {e}")))?;
            if let Some(text) = text {
                let vector = vector_text::decode(&text)?;
                self.vectors.upsert(&repository, VectorDomain::Text, id, &vector);
            }
            if let Some(code) = code {
                let vector = vector_text::decode(&code)?;
                self.vectors.upsert(&repository, VectorDomain::Code, id, &vector);
            }
        }
        Ok(())
    }

    /// Atomic within the batch: all chunks upsert, or none do.
    pub fn upsert_batch(&self, repository: &str, chunks: &[CodeChunk]) -> Result<(), CoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(sql_err)?;
        for chunk in chunks {
            let metadata_json = serde_json::to_string(&chunk.metadata)
                .map_err(|e| CoreError::InternalInvariantViolated(format!("metadata serialization failed: {e}")))?;
            let embedding_text = chunk.embedding_text.as_deref().map(vector_text::encode);
            let embedding_code = chunk.embedding_code.as_deref().map(vector_text::encode);

            tx.execute(
                r#"
                INSERT INTO chunks (
                    id, repository, file_path, name, name_path, kind, language,
                    start_line, end_line, start_byte, end_byte, text, metadata_json,
                    embedding_text, embedding_code, commit_hash, indexed_at
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)
                ON CONFLICT(id) DO UPDATE SET
                    repository = excluded.repository,
                    file_path = excluded.file_path,
                    name = excluded.name,
                    name_path = excluded.name_path,
                    kind = excluded.kind,
                    language = excluded.language,
                    start_line = excluded.start_line,
                    end_line = excluded.end_line,
                    start_byte = excluded.start_byte,
                    end_byte = excluded.end_byte,
                    text = excluded.text,
                    metadata_json = excluded.metadata_json,
                    embedding_text = excluded.embedding_text,
                    embedding_code = excluded.embedding_code,
                    commit_hash = excluded.commit_hash,
                    indexed_at = excluded.indexed_at
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.repository,
                    chunk.file_path,
                    chunk.name,
                    chunk.name_path,
                    kind_to_str(chunk.kind),
                    chunk.language.to_string(),
                    chunk.span.start_line as i64,
                    chunk.span.end_line as i64,
                    chunk.span.start_byte as i64,
                    chunk.span.end_byte as i64,
                    chunk.text,
                    metadata_json,
                    embedding_text,
                    embedding_code,
                    chunk.commit_hash,
                    chunk.indexed_at.to_rfc3339(),
                ],
            )
            .map_err(sql_err)?;

            if let Some(vector) = &chunk.embedding_text {
                self.vectors.upsert(repository, VectorDomain::Text, chunk.id, vector);
            }
            if let Some(vector) = &chunk.embedding_code {
                self.vectors.upsert(repository, VectorDomain::Code, chunk.id, vector);
            }
            self.cache.put(ChunkRow::from(chunk));
        }
        tx.commit().map_err(sql_err)?;
        Ok(())
    }

    /// Atomic; cascades to in-memory cache invalidation for `repository`.
    pub fn bulk_delete(&self, repository: &str) -> Result<(), CoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM chunks WHERE repository = ?1", params![repository])
            .map_err(sql_err)?;
        drop(conn);
        self.vectors.drop_repository(repository);
        self.cache.invalidate_repository(repository);
        Ok(())
    }

    /// Deletes every chunk in `repository` under `file_path`; used by
    /// `reindex_file` so stale chunks from a shrunk or moved file never
    /// linger after the new content is persisted.
    pub fn delete_by_file(&self, repository: &str, file_path: &str) -> Result<Vec<Uuid>, CoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id FROM chunks WHERE repository = ?1 AND file_path = ?2")
            .map_err(sql_err)?;
        let ids: Vec<Uuid> = stmt
            .query_map(params![repository, file_path], |row| {
                let text: String = row.get(0)?;
                Ok(text)
            })
            .map_err(sql_err)?
            .filter_map(|r| r.ok())
            .filter_map(|s| Uuid::parse_str(&s).ok())
            .collect();
        drop(stmt);
        conn.execute(
            "DELETE FROM chunks WHERE repository = ?1 AND file_path = ?2",
            params![repository, file_path],
        )
        .map_err(sql_err)?;
        drop(conn);
        for id in &ids {
            self.cache.invalidate(*id);
            self.vectors.remove(repository, VectorDomain::Text, *id);
            self.vectors.remove(repository, VectorDomain::Code, *id);
        }
        Ok(ids)
    }

    pub fn get(&self, id: Uuid) -> Result<Option<ChunkRow>, CoreError> {
        if let Some(row) = self.cache.get(id) {
            return Ok(Some(row));
        }
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row("SELECT * FROM chunks WHERE id = ?1", params![id.to_string()], row_to_chunk)
            .optional()
            .map_err(sql_err)?;
        drop(conn);
        if let Some(row) = &row {
            self.cache.put(row.clone());
        }
        Ok(row)
    }

    pub fn list(&self, repository: &str, filters: &ChunkFilters, limit: usize, offset: usize) -> Result<Vec<ChunkRow>, CoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT * FROM chunks WHERE repository = ?1 ORDER BY file_path, start_byte LIMIT ?2 OFFSET ?3")
            .map_err(sql_err)?;
        let rows = stmt
            .query_map(params![repository, limit as i64, offset as i64], row_to_chunk)
            .map_err(sql_err)?;
        let mut out = Vec::new();
        for row in rows {
            let row = row.map_err(sql_err)?;
            if matches_filters(&row, filters) {
                out.push(row);
            }
        }
        Ok(out)
    }

    /// Absolute match (`path` starts with `/`) compares the full `name_path`;
    /// relative match accepts either an exact match or a match on the
    /// trailing `/`-separated path components. `substring` overrides both
    /// and matches `path` anywhere within `name_path`.
    pub fn find_by_name_path(&self, repository: &str, path: &str, substring: bool) -> Result<Vec<ChunkRow>, CoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM chunks WHERE repository = ?1").map_err(sql_err)?;
        let rows = stmt.query_map(params![repository], row_to_chunk).map_err(sql_err)?;

        let is_absolute = path.starts_with('/');
        let needle = path.trim_start_matches('/');
        let mut out = Vec::new();
        for row in rows {
            let row = row.map_err(sql_err)?;
            let hit = if substring {
                row.name_path.contains(needle)
            } else if is_absolute {
                row.name_path == needle
            } else {
                row.name_path == needle || row.name_path.ends_with(&format!("/{needle}"))
            };
            if hit {
                out.push(row);
            }
        }
        Ok(out)
    }

    /// Trigram similarity over `text` and `name`, ranked by FTS5's bm25.
    pub fn search_lexical(&self, repository: &str, query: &str, filters: &ChunkFilters, k: usize) -> Result<Vec<LexicalHit>, CoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT c.*, bm25(chunks_fts) AS rank
                FROM chunks_fts
                JOIN chunks c ON c.rowid = chunks_fts.rowid
                WHERE chunks_fts MATCH ?1 AND c.repository = ?2
                ORDER BY rank
                LIMIT ?3
                "#,
            )
            .map_err(sql_err)?;
        let rows = stmt
            .query_map(params![query, repository, (k * 4).max(k) as i64], |row| {
                let chunk = row_to_chunk(row)?;
                let rank: f64 = row.get("rank")?;
                Ok((chunk, rank))
            })
            .map_err(sql_err)?;

        let mut out = Vec::new();
        for row in rows {
            let (chunk, rank) = row.map_err(sql_err)?;
            if matches_filters(&chunk, filters) {
                // bm25() is more negative for a better match; flip the sign
                // so a caller-facing rank is "higher is better".
                out.push(LexicalHit { chunk, rank: -rank as f32 });
                if out.len() == k {
                    break;
                }
            }
        }
        Ok(out)
    }

    /// HNSW-approximate nearest neighbours on the chosen embedding domain.
    /// Post-hoc filtered since the in-process index carries no payload
    /// filters of its own.
    pub fn search_vector(
        &self,
        repository: &str,
        vector: &[f32],
        domain: VectorDomain,
        filters: &ChunkFilters,
        k: usize,
        distance_threshold: Option<f32>,
    ) -> Result<Vec<VectorHit>, CoreError> {
        let neighbours = self.vectors.search(repository, domain, vector, (k * 4).max(k));
        let mut out = Vec::new();
        for (chunk_id, distance) in neighbours {
            if let Some(threshold) = distance_threshold {
                if distance > threshold {
                    continue;
                }
            }
            let Some(chunk) = self.get(chunk_id)? else { continue };
            if matches_filters(&chunk, filters) {
                out.push(VectorHit { chunk, distance });
                if out.len() == k {
                    break;
                }
            }
        }
        Ok(out)
    }

    /// Rejects an all-`None` patch rather than silently touching
    /// `indexed_at` for a no-op write.
    pub fn update_chunk(&self, id: Uuid, patch: ChunkPatch) -> Result<(), CoreError> {
        if patch.is_empty() {
            return Err(CoreError::invalid_input("update_chunk called with no fields set"));
        }
        let Some(mut row) = self.get(id)? else {
            return Err(CoreError::not_found("chunk", id.to_string()));
        };

        let metadata = patch.metadata.unwrap_or(row.metadata.clone());
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| CoreError::InternalInvariantViolated(format!("metadata serialization failed: {e}")))?;
        let commit_hash = patch.commit_hash.or(row.commit_hash.clone());
        let indexed_at = Utc::now();

        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                r#"
                UPDATE chunks SET
                    metadata_json = ?1,
                    embedding_text = COALESCE(?2, embedding_text),
                    embedding_code = COALESCE(?3, embedding_code),
                    commit_hash = ?4,
                    indexed_at = ?5
                WHERE id = ?6
                "#,
                params![
                    metadata_json,
                    patch.embedding_text.as_deref().map(vector_text::encode),
                    patch.embedding_code.as_deref().map(vector_text::encode),
                    commit_hash,
                    indexed_at.to_rfc3339(),
                    id.to_string(),
                ],
            )
            .map_err(sql_err)?;
        }

        if let Some(vector) = &patch.embedding_text {
            self.vectors.upsert(&row.repository, VectorDomain::Text, id, vector);
        }
        if let Some(vector) = &patch.embedding_code {
            self.vectors.upsert(&row.repository, VectorDomain::Code, id, vector);
        }

        row.metadata = metadata;
        row.commit_hash = commit_hash;
        row.indexed_at = indexed_at;
        self.cache.put(row);
        Ok(())
    }
}

fn matches_filters(row: &ChunkRow, filters: &ChunkFilters) -> bool {
    if let Some(language) = filters.language {
        if row.language != language {
            return false;
        }
    }
    if let Some(kind) = filters.kind {
        if row.kind != kind {
            return false;
        }
    }
    if let Some(prefix) = &filters.file_path_prefix {
        if !row.file_path.starts_with(prefix.as_str()) {
            return false;
        }
    }
    true
}

fn kind_to_str(kind: ChunkKind) -> &'static str {
    match kind {
        ChunkKind::Function => "function",
        ChunkKind::Method => "method",
        ChunkKind::Class => "class",
        ChunkKind::Module => "module",
    }
}

/// The reverse of `LanguageTag`'s `Display` impl — the store persists the
/// display form (`"python"`, `"typescript"`, ...) as the language column.
fn language_from_str(s: &str) -> Option<LanguageTag> {
    match s {
        "python" => Some(LanguageTag::Python),
        "javascript" => Some(LanguageTag::JavaScript),
        "typescript" => Some(LanguageTag::TypeScript),
        "go" => Some(LanguageTag::Go),
        "rust" => Some(LanguageTag::Rust),
        "java" => Some(LanguageTag::Java),
        _ => None,
    }
}

fn kind_from_str(s: &str) -> Option<ChunkKind> {
    match s {
        "function" => Some(ChunkKind::Function),
        "method" => Some(ChunkKind::Method),
        "class" => Some(ChunkKind::Class),
        "module" => Some(ChunkKind::Module),
        _ => None,
    }
}

fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<ChunkRow> {
    let id: String = row.get("id")?;
    let kind: String = row.get("kind")?;
    let language: String = row.get("language")?;
    let metadata_json: String = row.get("metadata_json")?;
    let indexed_at: String = row.get("indexed_at")?;

    let id = Uuid::parse_str(&id).map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;
    let kind = kind_from_str(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, format!("unknown kind: {kind}").into())
    })?;
    let language = language_from_str(&language).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, "unknown language".into())
    })?;
    let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;
    let indexed_at = chrono::DateTime::parse_from_rfc3339(&indexed_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(ChunkRow {
        id,
        repository: row.get("repository")?,
        file_path: row.get("file_path")?,
        span: Span::new(
            row.get::<_, i64>("start_line")? as usize,
            row.get::<_, i64>("end_line")? as usize,
            row.get::<_, i64>("start_byte")? as usize,
            row.get::<_, i64>("end_byte")? as usize,
        ),
        kind,
        text: row.get("text")?,
        name: row.get("name")?,
        name_path: row.get("name_path")?,
        language,
        metadata,
        commit_hash: row.get("commit_hash")?,
        indexed_at,
    })
}

fn sql_err(e: rusqlite::Error) -> CoreError {
    CoreError::InternalInvariantViolated(format!("store error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemolite_parser::ChunkMetadata;

    fn sample_chunk(name: &str, name_path: &str, text: &str) -> CodeChunk {
        CodeChunk {
            id: Uuid::new_v4(),
            repository: "repo-a".to_string(),
            file_path: "src/lib.rs".to_string(),
            span: Span::new(1, 3, 0, text.len()),
            kind: ChunkKind::Function,
            text: text.to_string(),
            name: name.to_string(),
            name_path: name_path.to_string(),
            language: LanguageTag::Rust,
            metadata: ChunkMetadata::default(),
            embedding_text: Some(vec![0.1; 8]),
            embedding_code: Some(vec![0.2; 8]),
            commit_hash: None,
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let store = ChunkStore::in_memory().unwrap();
        let chunk = sample_chunk("hello", "hello", "fn hello() { println!(\"hi\") }");
        store.upsert_batch("repo-a", std::slice::from_ref(&chunk)).unwrap();

        let fetched = store.get(chunk.id).unwrap().unwrap();
        assert_eq!(fetched.name, "hello");
        assert_eq!(fetched.repository, "repo-a");
    }

    #[test]
    fn find_by_name_path_absolute_and_relative() {
        let store = ChunkStore::in_memory().unwrap();
        let chunk = sample_chunk("hello", "Greeter/hello", "fn hello() {}");
        store.upsert_batch("repo-a", std::slice::from_ref(&chunk)).unwrap();

        let absolute = store.find_by_name_path("repo-a", "/Greeter/hello", false).unwrap();
        assert_eq!(absolute.len(), 1);

        let relative = store.find_by_name_path("repo-a", "hello", false).unwrap();
        assert_eq!(relative.len(), 1);

        let substring = store.find_by_name_path("repo-a", "reet", true).unwrap();
        assert_eq!(substring.len(), 1);

        let miss = store.find_by_name_path("repo-a", "nope", false).unwrap();
        assert!(miss.is_empty());
    }

    #[test]
    fn bulk_delete_cascades_to_cache_and_vectors() {
        let store = ChunkStore::in_memory().unwrap();
        let chunk = sample_chunk("hello", "hello", "fn hello() {}");
        store.upsert_batch("repo-a", std::slice::from_ref(&chunk)).unwrap();

        store.bulk_delete("repo-a").unwrap();
        assert!(store.get(chunk.id).unwrap().is_none());
        assert!(store.vectors.search("repo-a", VectorDomain::Text, &[0.1; 8], 5).is_empty());
    }

    #[test]
    fn update_with_no_fields_is_rejected() {
        let store = ChunkStore::in_memory().unwrap();
        let chunk = sample_chunk("hello", "hello", "fn hello() {}");
        store.upsert_batch("repo-a", std::slice::from_ref(&chunk)).unwrap();

        let result = store.update_chunk(chunk.id, ChunkPatch::default());
        assert!(result.is_err());
    }

    #[test]
    fn search_lexical_finds_matching_text() {
        let store = ChunkStore::in_memory().unwrap();
        let a = sample_chunk("alpha", "alpha", "fn alpha() { compute_checksum() }");
        let b = sample_chunk("beta", "beta", "fn beta() { println!(\"nothing here\") }");
        store.upsert_batch("repo-a", &[a.clone(), b]).unwrap();

        let hits = store.search_lexical("repo-a", "checksum", &ChunkFilters::default(), 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, a.id);
    }

    #[test]
    fn search_vector_returns_nearest_neighbour() {
        let store = ChunkStore::in_memory().unwrap();
        let chunk = sample_chunk("hello", "hello", "fn hello() {}");
        store.upsert_batch("repo-a", std::slice::from_ref(&chunk)).unwrap();

        let hits = store
            .search_vector("repo-a", &[0.1; 8], VectorDomain::Text, &ChunkFilters::default(), 5, None)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, chunk.id);
    }
}
