pub mod data_type;
pub mod dataset;
pub mod operation;
pub mod sql_plan;

pub use data_type::*;
pub use dataset::*;
pub use operation::*;
pub use sql_plan::*;
