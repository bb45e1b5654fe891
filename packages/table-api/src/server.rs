//! Hyper server setup and request handling.

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming as IncomingBody};
use hyper::{Request, Response, Result as HyperResult};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use tokio::net::TcpListener;

use crate::router::Router;

/// HTTP server for the table API.
pub struct Server {
    addr: SocketAddr,
    router: Arc<Router>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to; port 0 picks a free port
    /// * `router` - Request router
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self {
            addr,
            router: Arc::new(router),
        }
    }

    /// Binds the listener without accepting connections yet.
    pub async fn bind(self) -> Result<BoundServer, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        Ok(BoundServer {
            listener,
            router: self.router,
        })
    }

    /// Binds and runs the accept loop.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        self.bind().await?.serve().await
    }
}

/// A server whose listener is bound.
pub struct BoundServer {
    listener: TcpListener,
    router: Arc<Router>,
}

impl BoundServer {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accepts connections until the task is cancelled or accept fails.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        tracing::info!("Server listening on http://{}", self.local_addr()?);

        loop {
            let (stream, peer) = self.listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = Arc::clone(&self.router);

            tokio::task::spawn(async move {
                let builder = ConnectionBuilder::new(TokioExecutor::new());
                if let Err(err) = builder
                    .serve_connection(
                        io,
                        hyper::service::service_fn(move |req| handle_request(req, router.clone())),
                    )
                    .await
                {
                    tracing::warn!("Error serving connection from {}: {}", peer, err);
                }
            });
        }
    }
}

/// Handles an incoming HTTP request.
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> HyperResult<Response<Full<Bytes>>> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = match router.route(req).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!("{} {} failed: {}", method, uri, err);
            Response::from(err)
        }
    };
    tracing::debug!("{} {} -> {}", method, uri, response.status());
    Ok(response.map(Full::new))
}
