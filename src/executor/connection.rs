// Connection abstraction the executor drives plans through
use crate::catalog::CatalogColumn;
use crate::error::Result;
use crate::models::Dataset;
use serde::Serialize;
use serde_json::Value;

/// Row set returned by one statement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabularResult {
    pub columns: Vec<String>,
    /// One JSON object per row, keyed by column name
    pub rows: Vec<Value>,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

impl TabularResult {
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// First column of the first row as an integer, for single-value reads
    pub fn scalar_i64(&self) -> Option<i64> {
        let column = self.columns.first()?;
        self.rows.first()?.get(column)?.as_i64()
    }
}

/// A live relational connection.
///
/// Implementations block for the duration of each round trip. Transaction
/// control is explicit: `begin`, `commit` and `rollback` map one-to-one onto
/// the database's own statements and nothing is rolled back implicitly.
pub trait RelationalConnection: Send {
    /// Run a statement that returns no rows
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Run a statement and collect its rows
    fn query(&mut self, sql: &str) -> Result<TabularResult>;

    /// Columns of `dataset` as the catalog reports them, in table order.
    /// Empty when the table does not exist.
    fn catalog_columns(&mut self, dataset: &Dataset) -> Result<Vec<CatalogColumn>>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Release the underlying resource. Called at most once.
    fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_reads_first_column_of_first_row() {
        let result = TabularResult {
            columns: vec!["next".to_string(), "other".to_string()],
            rows: vec![json!({"next": 8, "other": "x"})],
            row_count: 1,
            execution_time_ms: 0,
        };
        assert_eq!(result.scalar_i64(), Some(8));
        assert_eq!(TabularResult::default().scalar_i64(), None);
    }

    #[test]
    fn test_scalar_of_null_is_none() {
        let result = TabularResult {
            columns: vec!["next".to_string()],
            rows: vec![json!({"next": null})],
            row_count: 1,
            execution_time_ms: 0,
        };
        assert_eq!(result.scalar_i64(), None);
    }
}
