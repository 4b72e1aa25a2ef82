pub mod manager;
pub mod models;
pub mod query_builder;

pub use manager::{raw, Database, DatabaseError};
pub use query_builder::{DynamicQuery, SqlArg, SqlResult};
