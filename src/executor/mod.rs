// Transactional execution of compiled SQL plans
pub mod connection;
pub mod sqlite;

pub use connection::{RelationalConnection, TabularResult};
pub use sqlite::SqliteConnection;

use crate::error::{Error, Result};
use crate::models::{Dataset, SqlPlan};
use crate::sink::Sink;
use std::collections::HashMap;
use std::fmt;

/// Where an [`Executor`] is in its transaction lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Open, no transaction in progress (statements autocommit)
    Idle,
    Active,
    Closed,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            TransactionState::Idle => "idle",
            TransactionState::Active => "in a transaction",
            TransactionState::Closed => "closed",
        };
        f.write_str(state)
    }
}

/// Drives SQL plans through one connection.
///
/// Statement execution and transaction boundaries are separate: a failing
/// plan leaves any open transaction as the database left it, and the caller
/// decides whether to `commit` or `revert`. The connection is released
/// exactly once, by `close` or on drop.
pub struct Executor {
    sink: Sink,
    connection: Option<Box<dyn RelationalConnection>>,
    state: TransactionState,
}

impl Executor {
    pub fn new(sink: Sink, connection: impl RelationalConnection + 'static) -> Self {
        Self::from_boxed(sink, Box::new(connection))
    }

    pub fn from_boxed(sink: Sink, connection: Box<dyn RelationalConnection>) -> Self {
        Self {
            sink,
            connection: Some(connection),
            state: TransactionState::Idle,
        }
    }

    pub fn sink(&self) -> Sink {
        self.sink
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    fn connection(&mut self, operation: &'static str) -> Result<&mut dyn RelationalConnection> {
        let state = self.state;
        match self.connection.as_deref_mut() {
            Some(connection) if state != TransactionState::Closed => Ok(connection),
            _ => Err(Error::TransactionState {
                operation,
                state: TransactionState::Closed,
            }),
        }
    }

    fn require(&self, expected: TransactionState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::TransactionState {
                operation,
                state: self.state,
            })
        }
    }

    pub fn begin(&mut self) -> Result<()> {
        self.require(TransactionState::Idle, "begin")?;
        self.connection("begin")?.begin()?;
        self.state = TransactionState::Active;
        tracing::info!("[{}] Transaction started", self.sink);
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        self.require(TransactionState::Active, "commit")?;
        self.connection("commit")?.commit()?;
        self.state = TransactionState::Idle;
        tracing::info!("[{}] Transaction committed", self.sink);
        Ok(())
    }

    /// Roll back the open transaction
    pub fn revert(&mut self) -> Result<()> {
        self.require(TransactionState::Active, "revert")?;
        self.connection("revert")?.rollback()?;
        self.state = TransactionState::Idle;
        tracing::info!("[{}] Transaction reverted", self.sink);
        Ok(())
    }

    /// Release the connection. Safe to call more than once; later calls are
    /// no-ops.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };
        if self.state == TransactionState::Active {
            tracing::warn!(
                "[{}] Closing with an open transaction; uncommitted work is discarded",
                self.sink
            );
        }
        self.state = TransactionState::Closed;
        connection.close()?;
        tracing::debug!("[{}] Connection closed", self.sink);
        Ok(())
    }

    /// Execute every statement in order. Stops at the first failure
    /// without rolling back what already ran.
    pub fn execute_physical_plan(&mut self, plan: &SqlPlan) -> Result<()> {
        self.execute_physical_plan_with_placeholders(plan, &HashMap::new())
    }

    /// Like [`execute_physical_plan`](Self::execute_physical_plan), replacing
    /// every occurrence of each placeholder key before execution.
    pub fn execute_physical_plan_with_placeholders(
        &mut self,
        plan: &SqlPlan,
        placeholders: &HashMap<String, String>,
    ) -> Result<()> {
        let sink = self.sink;
        let connection = self.connection("execute")?;
        for statement in plan.statements() {
            let sql = substitute(statement, placeholders);
            tracing::debug!("[{}] Executing: {}", sink, sql);
            connection.execute(&sql)?;
        }
        Ok(())
    }

    /// Execute every statement and collect the non-empty row sets.
    ///
    /// Statements that return no rows contribute nothing, so result
    /// positions do not line up with statement positions.
    pub fn execute_physical_plan_and_get_results(
        &mut self,
        plan: &SqlPlan,
    ) -> Result<Vec<TabularResult>> {
        self.execute_physical_plan_and_get_results_with_placeholders(plan, &HashMap::new())
    }

    pub fn execute_physical_plan_and_get_results_with_placeholders(
        &mut self,
        plan: &SqlPlan,
        placeholders: &HashMap<String, String>,
    ) -> Result<Vec<TabularResult>> {
        let sink = self.sink;
        let connection = self.connection("query")?;
        let mut results = Vec::new();
        for statement in plan.statements() {
            let sql = substitute(statement, placeholders);
            tracing::debug!("[{}] Querying: {}", sink, sql);
            let result = connection.query(&sql)?;
            tracing::debug!(
                "[{}] {} rows in {}ms",
                sink,
                result.row_count,
                result.execution_time_ms
            );
            if !result.is_empty() {
                results.push(result);
            }
        }
        Ok(results)
    }

    pub fn dataset_exists(&mut self, dataset: &Dataset) -> Result<bool> {
        let sink = self.sink;
        sink.dataset_exists(self.connection("check dataset")?, dataset)
    }

    pub fn validate_main_dataset_schema(&mut self, dataset: &Dataset) -> Result<()> {
        let sink = self.sink;
        sink.validate_main_dataset_schema(self.connection("validate schema")?, dataset)
    }

    pub fn construct_dataset_from_database(&mut self, dataset: &Dataset) -> Result<Dataset> {
        let sink = self.sink;
        sink.construct_dataset_from_database(self.connection("read catalog")?, dataset)
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("[{}] Failed to close connection: {}", self.sink, e);
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("sink", &self.sink)
            .field("state", &self.state)
            .finish()
    }
}

// Literal substring replacement; a key that occurs inside unrelated text is
// replaced there too.
fn substitute(statement: &str, placeholders: &HashMap<String, String>) -> String {
    placeholders
        .iter()
        .fold(statement.to_string(), |sql, (key, value)| sql.replace(key.as_str(), value))
}
