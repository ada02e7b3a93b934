//! SQLite parts store.
//!
//! `name` and `type` are promoted to real columns; everything else lives in the
//! `data` JSON column and is addressed with `json_extract`. Queries use keyset
//! pagination over (sort expression, id).

use super::import::{map_import_payload, map_new_part, ImportSummary, PartDraft};
use super::record::{FieldValue, Record, NAME_FIELD};
use super::store::RecordStore;
use crate::error::{PartsError, Result};
use crate::search::{Cursor, ServerConstraints};
use async_trait::async_trait;
use regex::Regex;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Field names usable inside a JSON path literal: no double quotes or control characters.
static FIELD_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^[^"\x00-\x1f]+$"#).unwrap());

/// Options for opening a [`SqliteStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteStoreOptions {
    /// Reject queries that sort or range-filter on a data field without an index.
    pub require_field_indexes: bool,
}

/// SQLite-backed parts store.
#[derive(Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
    conn: Arc<Mutex<Connection>>,
    options: SqliteStoreOptions,
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| PartsError::Database {
        message: "Failed to acquire connection lock".to_string(),
        source: None,
    })
}

/// SQL expression for a field, as a literal so expression indexes apply.
fn field_expr(field: &str) -> Result<String> {
    if field == NAME_FIELD {
        return Ok("name".to_string());
    }
    if !FIELD_NAME.is_match(field) {
        return Err(PartsError::validation(
            "field",
            format!("Unsupported field name: {:?}", field),
        ));
    }
    Ok(format!(
        "json_extract(data, '$.\"{}\"')",
        field.replace('\'', "''")
    ))
}

impl SqliteStore {
    /// Create or open a parts store at the given path.
    pub fn open(db_path: impl Into<PathBuf>, options: SqliteStoreOptions) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PartsError::io_with_path(e, parent))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;

        debug!("Opened parts store at {}", db_path.display());

        Ok(Self {
            db_path,
            conn: Arc::new(Mutex::new(conn)),
            options,
        })
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout=30000;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS parts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                type TEXT,
                data TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_parts_name ON parts(name, id);
            CREATE INDEX IF NOT EXISTS idx_parts_type ON parts(type);
            CREATE TABLE IF NOT EXISTS field_indexes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                field TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn options(&self) -> SqliteStoreOptions {
        self.options
    }

    fn insert_draft(conn: &Connection, draft: &PartDraft, created_at: &str) -> Result<i64> {
        let data = serde_json::to_string(&draft.data)?;
        conn.execute(
            "INSERT INTO parts (name, type, data, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![draft.name, draft.part_type, data, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Import an array of raw part objects in a single transaction.
    pub fn import_parts(&self, payload: &serde_json::Value) -> Result<ImportSummary> {
        let drafts = map_import_payload(payload)?;
        let imported_at = chrono::Utc::now().to_rfc3339();

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        for draft in &drafts {
            Self::insert_draft(&tx, draft, &imported_at).map_err(|e| PartsError::ImportFailed {
                message: format!("{} ({})", e, draft.name),
            })?;
        }
        tx.commit()?;

        info!("Imported {} parts", drafts.len());
        Ok(ImportSummary {
            count: drafts.len(),
            imported_at,
        })
    }

    /// Insert one part. Returns its id.
    pub fn insert_part(&self, part: &serde_json::Value) -> Result<i64> {
        let draft = map_new_part(part)?;
        let conn = lock(&self.conn)?;
        let id = Self::insert_draft(&conn, &draft, &chrono::Utc::now().to_rfc3339())?;
        debug!("Inserted part {}: {}", id, draft.name);
        Ok(id)
    }

    /// Create an expression index on a data field.
    pub fn create_field_index(&self, field: &str) -> Result<()> {
        let expr = field_expr(field)?;
        if field == NAME_FIELD {
            return Ok(());
        }

        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT OR IGNORE INTO field_indexes (field, created_at) VALUES (?1, ?2)",
            params![field, chrono::Utc::now().to_rfc3339()],
        )?;
        let index_id: i64 = conn.query_row(
            "SELECT id FROM field_indexes WHERE field = ?1",
            params![field],
            |row| row.get(0),
        )?;
        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_parts_field_{} ON parts({}, id)",
                index_id, expr
            ),
            [],
        )?;

        info!("Field index ready for {:?}", field);
        Ok(())
    }

    /// Data fields that have an expression index.
    pub fn indexed_fields(&self) -> Result<HashSet<String>> {
        let conn = lock(&self.conn)?;
        Self::indexed_fields_on(&conn)
    }

    fn indexed_fields_on(conn: &Connection) -> Result<HashSet<String>> {
        let mut stmt = conn.prepare("SELECT field FROM field_indexes")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut fields = HashSet::new();
        for row in rows {
            fields.insert(row?);
        }
        Ok(fields)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let count: usize = conn.query_row("SELECT COUNT(*) FROM parts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Remove every part. Field indexes are kept.
    pub fn clear(&self) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute("DELETE FROM parts", [])?;
        debug!("Cleared parts store");
        Ok(())
    }

    /// Checkpoint the WAL file.
    pub fn checkpoint_wal(&self) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        debug!("Checkpointed WAL");
        Ok(())
    }

    fn check_indexes(conn: &Connection, constraints: &ServerConstraints) -> Result<()> {
        let indexed = Self::indexed_fields_on(conn)?;
        let mut missing: Vec<String> = Vec::new();
        for field in std::iter::once(constraints.sort.field.as_str()).chain(constraints.range_fields()) {
            if field != NAME_FIELD && !indexed.contains(field) && !missing.iter().any(|m| m == field) {
                missing.push(field.to_string());
            }
        }

        if missing.is_empty() {
            return Ok(());
        }
        let hint = format!(
            "Create it with create_field_index for {}.",
            missing
                .iter()
                .map(|f| format!("{:?}", f))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Err(PartsError::IndexRequired {
            fields: missing,
            hint,
        })
    }

    fn fetch_chunk_sync(
        conn: &Connection,
        options: SqliteStoreOptions,
        constraints: &ServerConstraints,
        cursor: &Cursor,
        limit: usize,
    ) -> Result<Vec<Record>> {
        if options.require_field_indexes {
            Self::check_indexes(conn, constraints)?;
        }

        let mut where_parts = Vec::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        for filter in &constraints.filters {
            where_parts.push(format!("{} {} ?", field_expr(&filter.field)?, filter.op.as_sql()));
            params_vec.push(Box::new(filter.value.clone()));
        }

        let sort_expr = field_expr(&constraints.sort.field)?;
        match cursor {
            Cursor::Start => {}
            Cursor::After {
                sort_value: FieldValue::Null,
                id,
            } => {
                where_parts.push(format!(
                    "({0} IS NOT NULL OR ({0} IS NULL AND id > ?))",
                    sort_expr
                ));
                params_vec.push(Box::new(*id));
            }
            Cursor::After { sort_value, id } => {
                where_parts.push(format!("({0} > ? OR ({0} = ? AND id > ?))", sort_expr));
                params_vec.push(Box::new(sort_value.clone()));
                params_vec.push(Box::new(sort_value.clone()));
                params_vec.push(Box::new(*id));
            }
        }

        let where_clause = if where_parts.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_parts.join(" AND "))
        };
        let sql = format!(
            "SELECT id, name, data FROM parts {} ORDER BY {} ASC, id ASC LIMIT {}",
            where_clause, sort_expr, limit
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<Record> {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let data_json: String = row.get(2)?;

        let data = match serde_json::from_str::<serde_json::Value>(&data_json) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!("Part {} has unreadable data, using name only", id);
                serde_json::Map::new()
            }
        };

        Ok(Record::from_stored(id, &name, &data))
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn fetch_chunk(
        &self,
        constraints: &ServerConstraints,
        cursor: &Cursor,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let conn = self.conn.clone();
        let options = self.options;
        let constraints = constraints.clone();
        let cursor = cursor.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            Self::fetch_chunk_sync(&conn, options, &constraints, &cursor, limit)
        })
        .await
        .map_err(|e| PartsError::StoreFetch {
            message: format!("Fetch task failed: {}", e),
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{plan, FilterOp, SearchConfig, ServerFilter, SortSpec};
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store(options: SqliteStoreOptions) -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(temp_dir.path().join("parts.db"), options).unwrap();
        (store, temp_dir)
    }

    fn seed(store: &SqliteStore) {
        store
            .import_parts(&json!([
                {"Name": "HDPE 24x36", "Part Group": "Signs", "Part Type": "Large Signs", "Grade": "HDPE", "Width": 24},
                {"Name": "3mm ACM 12x18", "Part Group": "Signs", "Part Type": "Small Signs", "Width": 12},
                {"Name": "3mm ACM 24x24", "Part Group": "Signs", "Part Type": "Large Signs", "Width": 24},
                {"Name": "Coroplast 18x24", "Part Group": "Signs", "Part Type": "Temporary Markings", "Width": 18},
                {"Name": "Delta 5in", "Part Group": "Deltas"},
                {"Part No": "DRV-100", "Part Group": "DRVs"}
            ]))
            .unwrap();
    }

    fn names(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.name().into_owned()).collect()
    }

    #[test]
    fn test_import_and_count() {
        let (store, _temp) = create_test_store(SqliteStoreOptions::default());
        seed(&store);
        assert_eq!(store.count().unwrap(), 6);

        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_import_rejects_non_objects_atomically() {
        let (store, _temp) = create_test_store(SqliteStoreOptions::default());
        assert!(store.import_parts(&json!([{"Name": "ok"}, "bad"])).is_err());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_part_requires_name() {
        let (store, _temp) = create_test_store(SqliteStoreOptions::default());
        assert!(store.insert_part(&json!({"type": "magnet"})).is_err());
        let id = store.insert_part(&json!({"Name": "Magnet 12x24", "Width": 12})).unwrap();
        assert!(id > 0);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fetch_orders_by_name() {
        let (store, _temp) = create_test_store(SqliteStoreOptions::default());
        seed(&store);

        let planned = plan(&SearchConfig::default(), "");
        let chunk = store
            .fetch_chunk(&planned.constraints, &Cursor::Start, 100)
            .await
            .unwrap();
        assert_eq!(
            names(&chunk),
            vec![
                "3mm ACM 12x18",
                "3mm ACM 24x24",
                "Coroplast 18x24",
                "DRV-100",
                "Delta 5in",
                "HDPE 24x36"
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_pages_with_cursor() {
        let (store, _temp) = create_test_store(SqliteStoreOptions::default());
        seed(&store);

        let config = SearchConfig::new(vec![ServerFilter::new("Part Group", FilterOp::Eq, "Signs")]);
        let constraints = plan(&config, "").constraints;

        let first = store.fetch_chunk(&constraints, &Cursor::Start, 3).await.unwrap();
        assert_eq!(first.len(), 3);
        let cursor = Cursor::after(first.last().unwrap(), &constraints.sort);
        let second = store.fetch_chunk(&constraints, &cursor, 3).await.unwrap();
        assert_eq!(names(&second), vec!["HDPE 24x36"]);
    }

    #[tokio::test]
    async fn test_prefix_range_on_name() {
        let (store, _temp) = create_test_store(SqliteStoreOptions::default());
        seed(&store);

        let config = crate::search::search_config_for("acm_sign").unwrap();
        let constraints = plan(&config, "").constraints;
        let chunk = store.fetch_chunk(&constraints, &Cursor::Start, 100).await.unwrap();
        assert_eq!(names(&chunk), vec!["3mm ACM 12x18", "3mm ACM 24x24"]);
    }

    #[tokio::test]
    async fn test_equal_sort_values_resume_by_id() {
        let (store, _temp) = create_test_store(SqliteStoreOptions::default());
        seed(&store);

        let constraints = ServerConstraints {
            filters: vec![ServerFilter::new("Part Group", FilterOp::Eq, "Signs")],
            sort: SortSpec {
                field: "Part Type".to_string(),
            },
        };
        let mut cursor = Cursor::Start;
        let mut seen = Vec::new();
        loop {
            let chunk = store.fetch_chunk(&constraints, &cursor, 1).await.unwrap();
            let Some(last) = chunk.last() else { break };
            cursor = Cursor::after(last, &constraints.sort);
            seen.push(last.id);
        }
        assert_eq!(seen.len(), 4);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[tokio::test]
    async fn test_null_sort_values_are_paged() {
        let (store, _temp) = create_test_store(SqliteStoreOptions::default());
        seed(&store);

        let constraints = ServerConstraints {
            filters: vec![],
            sort: SortSpec {
                field: "Grade".to_string(),
            },
        };
        let mut cursor = Cursor::Start;
        let mut count = 0;
        loop {
            let chunk = store.fetch_chunk(&constraints, &cursor, 2).await.unwrap();
            let Some(last) = chunk.last() else { break };
            cursor = Cursor::after(last, &constraints.sort);
            count += chunk.len();
        }
        assert_eq!(count, 6);
    }

    #[tokio::test]
    async fn test_paging_over_fallback_names_advances() {
        let (store, _temp) = create_test_store(SqliteStoreOptions::default());
        store
            .import_parts(&json!([
                {"Name": "", "Part Name": "Alpha"},
                {"Name": "Beta"},
                {"Name": null, "Part No": "A-100"},
                {"Name": "Gamma"}
            ]))
            .unwrap();

        let constraints = plan(&SearchConfig::default(), "").constraints;
        let mut cursor = Cursor::Start;
        let mut seen = Vec::new();
        for _ in 0..10 {
            let chunk = store.fetch_chunk(&constraints, &cursor, 1).await.unwrap();
            let Some(last) = chunk.last() else { break };
            cursor = Cursor::after(last, &constraints.sort);
            seen.push(last.name().into_owned());
        }
        assert_eq!(seen, vec!["A-100", "Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn test_index_required_when_strict() {
        let (store, _temp) = create_test_store(SqliteStoreOptions {
            require_field_indexes: true,
        });
        seed(&store);

        let config = SearchConfig::new(vec![ServerFilter::new("Grade", FilterOp::Gte, "H")]);
        let constraints = plan(&config, "").constraints;

        let err = store
            .fetch_chunk(&constraints, &Cursor::Start, 10)
            .await
            .unwrap_err();
        match &err {
            PartsError::IndexRequired { fields, .. } => assert_eq!(fields, &vec!["Grade".to_string()]),
            other => panic!("unexpected error: {other}"),
        }

        store.create_field_index("Grade").unwrap();
        assert!(store.indexed_fields().unwrap().contains("Grade"));
        let chunk = store.fetch_chunk(&constraints, &Cursor::Start, 10).await.unwrap();
        assert_eq!(names(&chunk), vec!["HDPE 24x36"]);
    }

    #[tokio::test]
    async fn test_name_sort_needs_no_index_when_strict() {
        let (store, _temp) = create_test_store(SqliteStoreOptions {
            require_field_indexes: true,
        });
        seed(&store);
        let config = crate::search::search_config_for("delta").unwrap();
        let chunk = store
            .fetch_chunk(&plan(&config, "").constraints, &Cursor::Start, 10)
            .await
            .unwrap();
        assert_eq!(names(&chunk), vec!["Delta 5in"]);
    }

    #[test]
    fn test_field_names_with_quotes_rejected() {
        assert!(field_expr("Bad\"Field").is_err());
        assert_eq!(field_expr("Name").unwrap(), "name");
        assert_eq!(
            field_expr("Owner's Ref").unwrap(),
            "json_extract(data, '$.\"Owner''s Ref\"')"
        );
    }
}
