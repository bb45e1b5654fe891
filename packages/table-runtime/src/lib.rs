//! Tick-based runtime that applies table operations.
//!
//! The HTTP layer never touches the database directly: every operation is
//! sent as an [`ApiRequest`] over a channel and answered through a oneshot
//! once the runtime thread has applied it.

use std::sync::Arc;
use std::thread::JoinHandle;

use table_core::{Database, ServiceConfig, TableError};
use tokio::sync::{mpsc, oneshot};

mod api_handlers;
mod api_request;
mod runtime;

pub use api_handlers::ApiHandlers;
pub use api_request::{ApiRequest, QueryParams};
pub use runtime::{Runtime, RuntimeStats};

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, TableError>;

/// Response sender for API requests
pub type ResponseSender = oneshot::Sender<Result<serde_json::Value>>;

/// Channel capacity between the HTTP layer and the runtime.
pub fn channel_capacity(config: &ServiceConfig) -> usize {
    (config.tickrate as usize * 100).max(1)
}

/// Creates the request channel and starts the runtime on its own thread.
///
/// The thread exits once every sender has been dropped and the queue is empty.
pub fn spawn(
    database: Arc<Database>,
    config: ServiceConfig,
) -> std::io::Result<(mpsc::Sender<ApiRequest>, JoinHandle<()>)> {
    let (api_tx, api_rx) = mpsc::channel(channel_capacity(&config));
    let mut runtime = Runtime::new(database, config, api_rx);
    let handle = std::thread::Builder::new()
        .name("table-runtime".to_string())
        .spawn(move || {
            tracing::info!("Runtime thread started");
            runtime.run();
            tracing::info!("Runtime thread stopped");
        })?;
    Ok((api_tx, handle))
}
