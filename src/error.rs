use crate::executor::TransactionState;
use crate::models::DataType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Compiler and executor error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported type: {dialect} cannot represent {data_type}")]
    UnsupportedType {
        dialect: &'static str,
        data_type: DataType,
    },

    #[error("Unrecognized catalog type: {dialect} does not know '{type_name}' (generic code {generic_code})")]
    UnrecognizedCatalogType {
        dialect: &'static str,
        type_name: String,
        generic_code: i32,
    },

    #[error("Unsupported operation: {dialect} cannot render {operation}")]
    UnsupportedOperation {
        dialect: &'static str,
        operation: &'static str,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Compile error at operation #{position} ({operation}): {source}")]
    Compile {
        position: usize,
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Statement execution failed: {message} [statement: {statement}]")]
    StatementExecution { statement: String, message: String },

    #[error("Schema mismatch for {dataset}: {detail}")]
    SchemaMismatch { dataset: String, detail: String },

    #[error("Transaction state error: cannot {operation} while {state}")]
    TransactionState {
        operation: &'static str,
        state: TransactionState,
    },

    #[error("Unsupported dialect: {0}")]
    UnknownDialect(String),
}

impl Error {
    /// Stable code for each kind, used in [`ErrorDetail`]
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedType { .. } => "UNSUPPORTED_TYPE",
            Error::UnrecognizedCatalogType { .. } => "UNRECOGNIZED_CATALOG_TYPE",
            Error::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            Error::InvalidOperation(_) => "INVALID_OPERATION",
            Error::Compile { .. } => "COMPILE_ERROR",
            Error::Connection(_) => "CONNECTION_ERROR",
            Error::StatementExecution { .. } => "STATEMENT_EXECUTION_ERROR",
            Error::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Error::TransactionState { .. } => "TRANSACTION_STATE_ERROR",
            Error::UnknownDialect(_) => "UNKNOWN_DIALECT",
        }
    }

    /// True for errors fixed by changing the plan or the dialect choice,
    /// false for errors coming from the live database.
    pub fn is_plan_error(&self) -> bool {
        match self {
            Error::UnsupportedType { .. }
            | Error::UnsupportedOperation { .. }
            | Error::InvalidOperation(_)
            | Error::Compile { .. }
            | Error::UnknownDialect(_)
            | Error::TransactionState { .. } => true,
            Error::UnrecognizedCatalogType { .. }
            | Error::Connection(_)
            | Error::StatementExecution { .. }
            | Error::SchemaMismatch { .. } => false,
        }
    }

    pub(crate) fn statement(statement: &str, err: impl std::fmt::Display) -> Self {
        Error::StatementExecution {
            statement: statement.to_string(),
            message: err.to_string(),
        }
    }
}

/// Structured form of an [`Error`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&Error> for ErrorDetail {
    fn from(err: &Error) -> Self {
        let detail = ErrorDetail::new(err.code(), err.to_string());
        match err {
            Error::Compile { source, .. } => detail.with_details(source.code()),
            Error::StatementExecution { statement, .. } => detail.with_details(statement.clone()),
            _ => detail,
        }
    }
}
