//! Client SDK for the mobile table service.
//!
//! [`MobileServiceClient`] hands out table handles: [`JsonTable`] for raw
//! JSON rows and [`Table`] for typed rows implementing [`TableRow`]. Each
//! handle carries the set of system properties it asks the service to
//! return, and every operation comes in an async form and a
//! `*_with_callback` form that reports its outcome exactly once.

pub mod client;
pub mod error;
pub mod json_table;
pub mod models;
pub mod table;

pub use client::{MobileServiceClient, MobileServiceClientBuilder};
pub use error::{ClientError, PreconditionFailed, Result};
pub use json_table::JsonTable;
pub use models::{QueryParameters, TableRow};
pub use table::Table;
pub use table_types::{field, Filter, SystemProperties, SystemProperty};
