//! Database module
//!
//! Connection pool, query gateway and the values flowing through it.

mod gateway;
pub mod pool;
mod result;
mod value;

pub use gateway::{GatewayTransaction, QueryGateway, DEFAULT_STATEMENT_TIMEOUT};
pub use result::QueryResult;
pub use value::SqlValue;
