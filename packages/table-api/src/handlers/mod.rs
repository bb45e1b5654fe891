//! HTTP endpoint implementations for table rows.

pub mod request_utils;
pub mod response;
pub mod row_handlers;

pub use request_utils::*;
pub use response::*;
pub use row_handlers::*;
