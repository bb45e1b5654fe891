//! Standalone mobile table service.
//!
//! Wires the table store, the runtime thread and the REST API together,
//! with command-line configuration and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use table_api::{Router, Server};
use table_core::{Database, ServiceConfig};
use tokio::signal;
use tokio::task::JoinHandle;

/// How long shutdown waits for the runtime thread to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Command-line arguments for the table service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Tick rate for runtime loop (Hz)
    #[arg(long, default_value_t = 120)]
    tickrate: u32,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = 10000)]
    response_timeout_ms: u64,

    /// Upper bound for `$top` in queries
    #[arg(long, default_value_t = 1000)]
    max_top: usize,

    /// Application key clients must send in X-ZUMO-APPLICATION
    #[arg(long)]
    application_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = ServiceConfig {
        tickrate: args.tickrate,
        request_timeout_ms: args.request_timeout_ms,
        response_timeout_ms: args.response_timeout_ms,
        max_top: args.max_top,
        application_key: args.application_key.clone(),
        ..Default::default()
    };

    let db = Arc::new(Database::new());
    let (api_tx, runtime_handle) =
        table_runtime::spawn(db, config.clone()).context("Failed to start runtime thread")?;

    let router = Router::new(Arc::new(config), api_tx).context("Failed to build router")?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid host or port")?;
    let server = Server::new(addr, router)
        .bind()
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        "Table service on http://{} (tickrate {} Hz, max $top {}, application key {})",
        server.local_addr()?,
        args.tickrate,
        args.max_top,
        if args.application_key.is_some() { "required" } else { "not required" }
    );

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            tracing::error!("Server error: {}", e);
        }
    });

    signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c")?;
    tracing::info!("Shutting down server...");
    if shutdown(server_handle, runtime_handle, SHUTDOWN_GRACE).await {
        tracing::info!("Runtime thread stopped");
    } else {
        tracing::warn!("Runtime thread still busy after {:?}", SHUTDOWN_GRACE);
    }

    Ok(())
}

/// Stops the accept loop and waits up to `grace` for the runtime thread,
/// which exits once every request sender is dropped. Open connections keep
/// their sender until they close.
async fn shutdown(
    server: JoinHandle<()>,
    runtime: thread::JoinHandle<()>,
    grace: Duration,
) -> bool {
    server.abort();
    if let Err(e) = server.await {
        if !e.is_cancelled() {
            tracing::error!("Server task failed: {}", e);
        }
    }

    let join = tokio::task::spawn_blocking(move || runtime.join());
    match tokio::time::timeout(grace, join).await {
        Ok(Ok(Ok(()))) => true,
        Ok(Ok(Err(_))) => {
            tracing::error!("Runtime thread panicked");
            true
        }
        Ok(Err(e)) => {
            tracing::error!("Failed to join runtime thread: {}", e);
            false
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::timeout;
    use tokio::sync::mpsc;

    fn worker(mut rx: mpsc::Receiver<()>) -> thread::JoinHandle<()> {
        thread::spawn(move || while rx.blocking_recv().is_some() {})
    }

    #[tokio::test(flavor = "multi_thread")]
    #[timeout(10000)]
    async fn test_shutdown_joins_runtime_once_server_is_gone() {
        let (tx, rx) = mpsc::channel::<()>(1);
        let runtime = worker(rx);
        let server = tokio::spawn(async move {
            let _sender = tx;
            std::future::pending::<()>().await;
        });

        assert!(shutdown(server, runtime, Duration::from_secs(5)).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[timeout(10000)]
    async fn test_shutdown_gives_up_while_a_sender_is_alive() {
        let (tx, rx) = mpsc::channel::<()>(1);
        let runtime = worker(rx);
        let server = tokio::spawn(std::future::pending::<()>());

        assert!(!shutdown(server, runtime, Duration::from_millis(200)).await);
        drop(tx);
    }
}
