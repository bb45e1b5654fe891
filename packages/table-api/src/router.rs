//! Matchit routing configuration.

use std::sync::Arc;

use hyper::{body::Bytes, Method, Request, Response, StatusCode};
use matchit::Router as MatchitRouter;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::handlers;
use table_core::ServiceConfig;
use table_runtime::ApiRequest;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration
    pub config: Arc<ServiceConfig>,
    /// API request sender to runtime
    pub api_tx: mpsc::Sender<ApiRequest>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

impl Router {
    /// Creates a router serving the table row endpoints.
    pub fn new(
        config: Arc<ServiceConfig>,
        api_tx: mpsc::Sender<ApiRequest>,
    ) -> Result<Self, matchit::InsertError> {
        let mut router = MatchitRouter::new();

        router.insert("/tables/{name}", RouteHandler::Table)?;
        router.insert("/tables/{name}/{id}", RouteHandler::Row)?;

        Ok(Self {
            inner: router,
            state: AppState { config, api_tx },
        })
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// # Arguments
    /// * `req` - HTTP request
    ///
    /// # Returns
    /// `Result<Response<Bytes>, RouterError>` containing the response or an error.
    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<Bytes>, RouterError> {
        handlers::check_application_key(req.headers(), &self.state.config)?;

        let path = req.uri().path().to_string();
        match self.inner.at(&path) {
            Ok(matched) => {
                matched
                    .value
                    .handle(req, matched.params, self.state.clone())
                    .await
            }
            Err(_) => Err(RouterError::NotFound(format!("No route found for {}", path))),
        }
    }
}

/// Route handler function.
enum RouteHandler {
    Table,
    Row,
}

impl RouteHandler {
    /// Handles a request with the given route parameters.
    async fn handle(
        &self,
        req: Request<hyper::body::Incoming>,
        params: matchit::Params<'_, '_>,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError> {
        let method = req.method().clone();
        match self {
            RouteHandler::Table => {
                if method == Method::POST {
                    handlers::insert_row(req, params, state).await
                } else if method == Method::GET {
                    handlers::query_rows(req, params, state).await
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
            RouteHandler::Row => {
                if method == Method::GET {
                    handlers::lookup_row(req, params, state).await
                } else if method == Method::PATCH {
                    handlers::update_row(req, params, state).await
                } else if method == Method::DELETE {
                    handlers::delete_row(req, params, state).await
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PreconditionFailed { message: String, current: Value },
    Unauthorized,
    Overloaded(String),
}

impl RouterError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RouterError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RouterError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RouterError::Timeout => StatusCode::REQUEST_TIMEOUT,
            RouterError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RouterError::NotFound(_) => StatusCode::NOT_FOUND,
            RouterError::Conflict(_) => StatusCode::CONFLICT,
            RouterError::PreconditionFailed { .. } => StatusCode::PRECONDITION_FAILED,
            RouterError::Unauthorized => StatusCode::UNAUTHORIZED,
            RouterError::Overloaded(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RouterError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            RouterError::PreconditionFailed { message, .. } => {
                write!(f, "Precondition Failed: {}", message)
            }
            RouterError::Unauthorized => write!(f, "Unauthorized"),
            RouterError::Overloaded(msg) => write!(f, "Service Unavailable: {}", msg),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let (message, current) = match err {
            RouterError::MethodNotAllowed => ("Method Not Allowed".to_string(), None),
            RouterError::Timeout => ("Request Timeout".to_string(), None),
            RouterError::Unauthorized => ("Invalid or missing application key".to_string(), None),
            RouterError::PreconditionFailed { message, current } => (message, Some(current)),
            RouterError::InternalError(msg)
            | RouterError::BadRequest(msg)
            | RouterError::NotFound(msg)
            | RouterError::Conflict(msg)
            | RouterError::Overloaded(msg) => (msg, None),
        };

        let mut error_response = handlers::error_response(status.as_u16(), message, None);
        error_response.current = current;
        let body = serde_json::to_vec(&error_response)
            .unwrap_or_else(|e| format!("{{\"success\":false,\"error\":{{\"code\":\"500\",\"message\":\"Failed to serialize error: {}\"}}}}", e).into_bytes());

        let mut response = Response::new(Bytes::from(body));
        *response.status_mut() = status;
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("application/json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body_json(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_precondition_failed_carries_current_row() {
        let err = RouterError::PreconditionFailed {
            message: "version does not match".to_string(),
            current: json!({"id": "a", "__version": "00000000000003e9"}),
        };
        let response = Response::from(err);
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

        let body = body_json(&response);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "412");
        assert_eq!(body["current"]["__version"], "00000000000003e9");
    }

    #[test]
    fn test_error_envelope_omits_current() {
        let response = Response::from(RouterError::Conflict("taken".to_string()));
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(&response);
        assert_eq!(body["error"]["message"], "taken");
        assert!(body.get("current").is_none());
    }

    #[test]
    fn test_routes_register() {
        let (tx, _rx) = mpsc::channel(1);
        let router = Router::new(Arc::new(ServiceConfig::default()), tx).unwrap();
        let matched = router.inner.at("/tables/items/abc").unwrap();
        assert_eq!(matched.params.get("name"), Some("items"));
        assert_eq!(matched.params.get("id"), Some("abc"));
        assert!(router.inner.at("/tables").is_err());
    }
}
