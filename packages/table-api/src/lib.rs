//! REST API for the mobile table service.
//!
//! Provides the row endpoints (insert, query, lookup, update, delete),
//! request routing, and the hyper server that forwards requests to the
//! runtime thread.

pub mod handlers;
pub mod router;
pub mod server;

pub use router::{AppState, Router, RouterError};
pub use server::{BoundServer, Server};
