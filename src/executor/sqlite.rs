// SQLite connection backed by rusqlite
use super::connection::{RelationalConnection, TabularResult};
use crate::catalog::{generic_code_for, parse_declared_type, CatalogColumn};
use crate::error::{Error, Result};
use crate::models::Dataset;
use crate::sink::Sink;
use percent_encoding::percent_decode_str;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Instant;
use url::Url;

pub struct SqliteConnection {
    conn: Option<Connection>,
}

impl SqliteConnection {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            Error::Connection(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        tracing::info!("Opened SQLite database {}", path.as_ref().display());
        Ok(Self { conn: Some(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Connection(format!("failed to open in-memory database: {}", e)))?;
        Ok(Self { conn: Some(conn) })
    }

    /// Open from a URL: `sqlite::memory:`, `sqlite://relative/path.db` or
    /// `sqlite:///absolute/path.db`
    pub fn from_url(database_url: &str) -> Result<Self> {
        let url = Url::parse(database_url)
            .map_err(|e| Error::Connection(format!("invalid database url '{}': {}", database_url, e)))?;
        if url.scheme() != "sqlite" {
            return Err(Error::Connection(format!(
                "unsupported scheme '{}' for SQLite connection",
                url.scheme()
            )));
        }

        let path = format!("{}{}", url.host_str().unwrap_or(""), url.path());
        let path = percent_decode_str(&path).decode_utf8().map_err(|e| {
            Error::Connection(format!("invalid path in database url '{}': {}", database_url, e))
        })?;
        match &*path {
            "" | ":memory:" => Self::open_in_memory(),
            path => Self::open(path),
        }
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| Error::Connection("connection is closed".to_string()))
    }

    fn run(&self, sql: &str) -> Result<()> {
        self.conn()?
            .execute_batch(sql)
            .map_err(|e| Error::statement(sql, e))
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => json!(f),
        ValueRef::Text(bytes) => json!(String::from_utf8_lossy(bytes)),
        ValueRef::Blob(bytes) => json!(format!("<{} bytes>", bytes.len())),
    }
}

impl RelationalConnection for SqliteConnection {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.run(sql)
    }

    fn query(&mut self, sql: &str) -> Result<TabularResult> {
        let start = Instant::now();
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(|e| Error::statement(sql, e))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query([]).map_err(|e| Error::statement(sql, e))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(|e| Error::statement(sql, e))? {
            let mut row_obj = Map::new();
            for (index, column) in columns.iter().enumerate() {
                let value = row.get_ref(index).map_err(|e| Error::statement(sql, e))?;
                row_obj.insert(column.clone(), to_json(value));
            }
            result.push(Value::Object(row_obj));
        }

        Ok(TabularResult {
            row_count: result.len(),
            columns,
            rows: result,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn catalog_columns(&mut self, dataset: &Dataset) -> Result<Vec<CatalogColumn>> {
        let sink = Sink::Sqlite;
        let sql = match &dataset.group {
            Some(group) => format!(
                "PRAGMA {}.table_info({})",
                sink.quote_identifier(group),
                sink.quote_identifier(&dataset.name)
            ),
            None => format!("PRAGMA table_info({})", sink.quote_identifier(&dataset.name)),
        };

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(|e| Error::statement(&sql, e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(5)?,
                ))
            })
            .map_err(|e| Error::statement(&sql, e))?;

        let mut columns = Vec::new();
        for row in rows {
            let (name, declared, not_null, pk) = row.map_err(|e| Error::statement(&sql, e))?;
            let (type_name, size, digits) = parse_declared_type(&declared);
            let code = generic_code_for(&type_name);
            let mut column = CatalogColumn::new(name, type_name, code, size, digits);
            column.nullable = not_null == 0 && pk == 0;
            column.primary_key = pk > 0;
            columns.push(column);
        }
        Ok(columns)
    }

    fn begin(&mut self) -> Result<()> {
        self.run("BEGIN")
    }

    fn commit(&mut self) -> Result<()> {
        self.run("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.run("ROLLBACK")
    }

    fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => conn
                .close()
                .map_err(|(_, e)| Error::Connection(format!("failed to close SQLite connection: {}", e))),
            None => Ok(()),
        }
    }
}
