pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod lock;
pub mod models;
pub mod sink;
pub mod transformer;

pub use error::{Error, ErrorDetail, Result};
pub use executor::{Executor, RelationalConnection, SqliteConnection, TabularResult, TransactionState};
pub use lock::LockInfoUtils;
pub use models::*;
pub use sink::{Sink, SinkRegistry};
pub use transformer::{generate_physical_plan, Clock, FixedClock, SystemClock, TransformOptions, Transformer};
