//! Core storage for the mobile table service.
//!
//! Provides row tables that assign and project system properties
//! (version, creation time, update time), enforce optimistic concurrency,
//! and evaluate query filters.

pub mod config;
pub mod database;
pub mod error;
pub mod table;

pub use config::ServiceConfig;
pub use database::Database;
pub use error::TableError;
