//! In-process table service for running the group without a deployment.

use std::net::SocketAddr;
use std::sync::Arc;

use table_api::{Router, Server};
use table_client::MobileServiceClient;
use table_core::{Database, ServiceConfig};
use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::HarnessError;

/// Table service listening on an ephemeral localhost port.
///
/// Owns the tokio runtime the server and its clients run on. Dropping it
/// stops the server; the detached table runtime thread exits once the last
/// request sender is gone.
pub struct EmbeddedService {
    runtime: Option<Runtime>,
    base_url: String,
}

impl EmbeddedService {
    /// Starts the service. Must not be called from inside an async task.
    pub fn start(config: ServiceConfig) -> Result<Self, HarnessError> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("sysprops-service")
            .build()
            .map_err(|e| HarnessError::Setup(format!("Failed to build runtime: {}", e)))?;

        let (api_tx, _) = table_runtime::spawn(Arc::new(Database::new()), config.clone())
            .map_err(|e| HarnessError::Setup(format!("Failed to start table runtime: {}", e)))?;
        let router = Router::new(Arc::new(config), api_tx)
            .map_err(|e| HarnessError::Setup(format!("Failed to build router: {}", e)))?;

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let server = runtime
            .block_on(Server::new(addr, router).bind())
            .map_err(|e| HarnessError::Setup(format!("Failed to bind {}: {}", addr, e)))?;
        let local = server
            .local_addr()
            .map_err(|e| HarnessError::Setup(format!("Failed to read bound address: {}", e)))?;

        runtime.spawn(async move {
            if let Err(e) = server.serve().await {
                tracing::error!("Embedded server error: {}", e);
            }
        });
        tracing::info!("Embedded table service on http://{}", local);

        Ok(Self {
            runtime: Some(runtime),
            base_url: format!("http://{}", local),
        })
    }

    pub fn handle(&self) -> Option<Handle> {
        self.runtime.as_ref().map(|rt| rt.handle().clone())
    }

    /// Client bound to this service and its runtime.
    pub fn client(&self, application_key: Option<&str>) -> Result<MobileServiceClient, HarnessError> {
        let handle = self
            .handle()
            .ok_or_else(|| HarnessError::Setup("Service already stopped".to_string()))?;
        let mut builder = MobileServiceClient::builder()
            .base_url(self.base_url.clone())
            .runtime(handle);
        if let Some(key) = application_key {
            builder = builder.application_key(key);
        }
        Ok(builder.build()?)
    }
}

impl Drop for EmbeddedService {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
