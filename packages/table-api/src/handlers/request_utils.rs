//! Request utilities for HTTP endpoints.

use http_body_util::BodyExt;
use hyper::header::{HeaderMap, IF_MATCH};
use hyper::{body::Bytes, Request, Response};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::oneshot;
use tokio::time;

use crate::router::{AppState, RouterError};
use table_core::{ServiceConfig, TableError};
use table_runtime::{ApiRequest, QueryParams, ResponseSender};
use table_types::{
    Filter, SystemProperties, APPLICATION_KEY_HEADER, FILTER_PARAMETER, SKIP_PARAMETER,
    SYSTEM_PROPERTIES_PARAMETER, TOP_PARAMETER,
};

/// Type alias for matchit parameters with explicit lifetimes
pub type MatchitParams<'a, 'b> = matchit::Params<'a, 'b>;

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout(
    req: Request<hyper::body::Incoming>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Reads the request body and parses it as JSON.
pub async fn read_json_body(
    req: Request<hyper::body::Incoming>,
    timeout_ms: u64,
) -> Result<Value, RouterError> {
    let body = read_request_body_with_timeout(req, timeout_ms).await?;
    serde_json::from_slice(&body)
        .map_err(|e| RouterError::BadRequest(format!("Failed to parse request body: {}", e)))
}

/// Helper function to wait for response with timeout
pub async fn wait_for_response_with_timeout<T>(
    rx: oneshot::Receiver<T>,
    timeout_ms: u64,
) -> Result<T, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    time::timeout(timeout_duration, rx)
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Response channel closed: {}", e)))
}

/// Sends a request to the runtime and waits for its answer.
///
/// `build` receives the response sender to embed in the request.
pub async fn dispatch(
    state: &AppState,
    build: impl FnOnce(ResponseSender) -> ApiRequest,
) -> Result<Value, RouterError> {
    let (tx, rx) = oneshot::channel();
    state.api_tx.try_send(build(tx)).map_err(|e| match e {
        TrySendError::Full(_) => RouterError::Overloaded("request queue is full".to_string()),
        TrySendError::Closed(_) => RouterError::InternalError("Runtime has stopped".to_string()),
    })?;

    let result = wait_for_response_with_timeout(rx, state.config.response_timeout_ms).await?;
    result.map_err(map_table_error_to_router_error)
}

/// Map TableError to appropriate RouterError
pub fn map_table_error_to_router_error(e: TableError) -> RouterError {
    match e {
        TableError::TableNotFound { .. } | TableError::RowNotFound { .. } => {
            RouterError::NotFound(e.to_string())
        }
        TableError::RowAlreadyExists { .. } => RouterError::Conflict(e.to_string()),
        TableError::PreconditionFailed { ref current, .. } => RouterError::PreconditionFailed {
            message: e.to_string(),
            current: current.clone(),
        },
        TableError::InvalidId(_)
        | TableError::InvalidRow(_)
        | TableError::SystemPropertyNotWritable { .. }
        | TableError::InvalidFilter(_)
        | TableError::InvalidSystemProperties(_) => RouterError::BadRequest(e.to_string()),
        TableError::Overloaded(msg) => RouterError::Overloaded(msg),
        TableError::Timeout => RouterError::Timeout,
        TableError::LockPoisoned => RouterError::InternalError(format!("Runtime error: {}", e)),
    }
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Helper to build empty HTTP response (for 204 No Content)
pub fn build_empty_response(status: u16) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .body(Bytes::new())
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Decodes a path or query component. `+` is a space in query strings.
pub fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Returns a decoded route parameter.
pub fn route_param(params: &MatchitParams<'_, '_>, name: &str) -> Result<String, RouterError> {
    params
        .get(name)
        .map(|raw| percent_decode_str(raw).decode_utf8_lossy().into_owned())
        .ok_or_else(|| RouterError::BadRequest(format!("Missing route parameter '{}'", name)))
}

/// Parse query parameters from URL query string.
///
/// Recognises `$filter`, `$top`, `$skip` and `__systemproperties`; any other
/// parameter is a user parameter and is ignored.
pub fn parse_query_params(query_str: Option<&str>) -> Result<QueryParams, RouterError> {
    let mut params = QueryParams::default();

    let Some(query_str) = query_str else {
        return Ok(params);
    };

    for pair in query_str.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(raw_key);
        let value = decode_component(raw_value);

        if key.eq_ignore_ascii_case(SYSTEM_PROPERTIES_PARAMETER) {
            params.properties = SystemProperties::parse(&value)
                .map_err(|e| RouterError::BadRequest(e.to_string()))?;
        } else if key == FILTER_PARAMETER {
            let filter: Filter = value
                .parse()
                .map_err(|e: table_types::TypesError| RouterError::BadRequest(e.to_string()))?;
            params.filter = Some(filter);
        } else if key == TOP_PARAMETER {
            params.top = Some(value.parse().map_err(|e| {
                RouterError::BadRequest(format!("Invalid $top value '{}': {}", value, e))
            })?);
        } else if key == SKIP_PARAMETER {
            params.skip = Some(value.parse().map_err(|e| {
                RouterError::BadRequest(format!("Invalid $skip value '{}': {}", value, e))
            })?);
        } else {
            tracing::trace!("Ignoring user parameter {}={}", key, value);
        }
    }

    Ok(params)
}

/// Reads the `If-Match` header, with surrounding quotes stripped.
///
/// `*` matches any version and is treated as absent.
pub fn parse_if_match(headers: &HeaderMap) -> Result<Option<String>, RouterError> {
    let Some(value) = headers.get(IF_MATCH) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| RouterError::BadRequest("If-Match header is not valid text".to_string()))?
        .trim();
    let value = value.strip_prefix("W/").unwrap_or(value);
    let unquoted = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    if unquoted.is_empty() || unquoted == "*" {
        return Ok(None);
    }
    Ok(Some(unquoted.to_string()))
}

/// Rejects requests without the configured application key.
pub fn check_application_key(
    headers: &HeaderMap,
    config: &ServiceConfig,
) -> Result<(), RouterError> {
    let Some(expected) = config.application_key.as_deref() else {
        return Ok(());
    };
    match headers
        .get(APPLICATION_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(presented) if presented == expected => Ok(()),
        _ => Err(RouterError::Unauthorized),
    }
}
