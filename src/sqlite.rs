// Embedded SQLite implementation of the key-value table

use crate::kv::{Index, KvStore, Query, QueryOutput, Row};
use eyre::{Context, Result, eyre};
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_VERSION: u32 = 1;

/// Rows returned by one query page unless overridden
pub const DEFAULT_PAGE_LIMIT: usize = 1000;

/// Name of the database file inside the store directory
pub const DB_FILE: &str = "todostore.db";

/// A wide-column style table on top of SQLite
///
/// Each row is keyed by (pk, sk). Non-key attributes live in `data_json`;
/// `context` is mirrored into its own nullable column so the `GSI1` index
/// only covers rows that carry one.
pub struct SqliteTable {
    base_path: PathBuf,
    table: String,
    page_limit: usize,
    db: Connection,
}

impl SqliteTable {
    /// Open or create the table inside the given directory
    pub fn open<P: AsRef<Path>>(path: P, table: &str) -> Result<Self> {
        Self::validate_table_name(table)?;

        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let db_path = base_path.join(DB_FILE);
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let store = Self {
            base_path,
            table: table.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            db,
        };

        store.create_schema()?;
        store.create_gitignore()?;
        store.write_version()?;

        info!(path = ?db_path, table, "Opened table");
        Ok(store)
    }

    /// Cap the number of rows a single query returns
    pub fn with_page_limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(eyre!("Page limit must be at least 1"));
        }
        self.page_limit = limit;
        Ok(self)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn create_schema(&self) -> Result<()> {
        debug!(table = %self.table, "Creating table schema");

        self.db
            .execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{t}" (
                    pk TEXT NOT NULL,
                    sk TEXT NOT NULL,
                    context TEXT,
                    data_json TEXT NOT NULL,
                    PRIMARY KEY (pk, sk)
                );

                CREATE INDEX IF NOT EXISTS "{t}_gsi1" ON "{t}"(context, sk);
                "#,
                t = self.table
            ))
            .context("Failed to create table schema")?;

        Ok(())
    }

    fn create_gitignore(&self) -> Result<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, "todostore.db\ntodostore.db-shm\ntodostore.db-wal\n")?;
        }
        Ok(())
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }

    fn validate_table_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(eyre!("Table name cannot be empty"));
        }
        if name.len() > 64 {
            return Err(eyre!("Table name too long: {} (max 64 chars)", name));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(eyre!("Invalid table name: {} (must be alphanumeric with _)", name));
        }
        Ok(())
    }

    fn decode_attrs(data_json: &str) -> Result<Map<String, Value>> {
        serde_json::from_str(data_json).context("Failed to deserialize row attributes")
    }
}

impl KvStore for SqliteTable {
    fn put_item(&mut self, row: &Row) -> Result<()> {
        debug!(pk = %row.pk, sk = %row.sk, "put_item");

        let data_json = serde_json::to_string(&row.attrs).context("Failed to serialize row attributes")?;

        self.db
            .execute(
                &format!(
                    r#"INSERT OR REPLACE INTO "{}" (pk, sk, context, data_json) VALUES (?1, ?2, ?3, ?4)"#,
                    self.table
                ),
                rusqlite::params![&row.pk, &row.sk, row.attr_str("context"), data_json],
            )
            .with_context(|| format!("Failed to put item {}/{}", row.pk, row.sk))?;

        Ok(())
    }

    fn get_item(&self, pk: &str, sk: &str) -> Result<Option<Row>> {
        let mut stmt = self
            .db
            .prepare(&format!(r#"SELECT data_json FROM "{}" WHERE pk = ?1 AND sk = ?2"#, self.table))?;

        let result = stmt
            .query_row(rusqlite::params![pk, sk], |row| row.get::<_, String>(0))
            .optional()
            .with_context(|| format!("Failed to get item {}/{}", pk, sk))?;

        match result {
            Some(json) => Ok(Some(Row {
                pk: pk.to_string(),
                sk: sk.to_string(),
                attrs: Self::decode_attrs(&json)?,
            })),
            None => Ok(None),
        }
    }

    fn delete_item(&mut self, pk: &str, sk: &str) -> Result<()> {
        debug!(pk, sk, "delete_item");

        self.db
            .execute(
                &format!(r#"DELETE FROM "{}" WHERE pk = ?1 AND sk = ?2"#, self.table),
                rusqlite::params![pk, sk],
            )
            .with_context(|| format!("Failed to delete item {}/{}", pk, sk))?;

        Ok(())
    }

    fn query(&self, query: &Query) -> Result<QueryOutput> {
        let column = match query.index {
            Index::Table => "pk",
            Index::Context => "context",
        };

        let mut sql = format!(r#"SELECT pk, sk, data_json FROM "{}" WHERE {} = ?1"#, self.table, column);

        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(query.partition.clone())];

        // substr instead of LIKE: the prefix must match byte for byte
        if let Some(prefix) = &query.sort_prefix {
            sql.push_str(" AND substr(sk, 1, length(?2)) = ?2");
            params.push(Box::new(prefix.clone()));
        }

        sql.push_str(&format!(" ORDER BY sk, pk LIMIT {}", self.page_limit + 1));

        let mut stmt = self.db.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(params_refs.as_slice(), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })
            .with_context(|| format!("Query failed: {}", query))?;

        let mut items = Vec::new();
        for row_result in rows {
            let (pk, sk, data_json) = row_result?;
            items.push(Row {
                pk,
                sk,
                attrs: Self::decode_attrs(&data_json)?,
            });
        }

        let truncated = items.len() > self.page_limit;
        items.truncate(self.page_limit);

        debug!(%query, count = items.len(), truncated, "query");
        Ok(QueryOutput { items, truncated })
    }
}
