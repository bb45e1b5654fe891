//! Row endpoints: insert, query, lookup, update and delete.
//!
//! Every handler accepts `__systemproperties` in the query string to choose
//! which system fields the returned rows carry.

use hyper::{body::Bytes, Request, Response};
use table_runtime::ApiRequest;

use crate::handlers::request_utils::{
    build_empty_response, build_response, dispatch, parse_if_match, parse_query_params,
    read_json_body, route_param, MatchitParams,
};
use crate::handlers::response::success_response;
use crate::router::{AppState, RouterError};

fn json_response<T: serde::Serialize>(status: u16, data: T) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(&success_response(data))
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    build_response(status, json)
}

/// Inserts a row.
///
/// # Endpoint
/// `POST /tables/{name}`
///
/// # Request Body
/// ```json
/// { "id": "optional-id", "name": "value" }
/// ```
///
/// # Response
/// - **201 Created**: the stored row, with the selected system properties
///
/// # Errors
/// - **400 Bad Request**: body is not an object, the id is invalid, or a
///   `__` field is present
/// - **409 Conflict**: a row with that id already exists
pub async fn insert_row(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let table = route_param(&params, "name")?;
    let query = parse_query_params(req.uri().query())?;
    let row = read_json_body(req, state.config.request_timeout_ms).await?;

    let stored = dispatch(&state, |response| ApiRequest::Insert {
        table,
        row,
        properties: query.properties,
        response,
    })
    .await?;

    json_response(201, stored)
}

/// Queries rows.
///
/// # Endpoint
/// `GET /tables/{name}?$filter=...&$top=...&$skip=...`
///
/// # Response
/// - **200 OK**
/// ```json
/// { "results": [ { "id": "a" } ], "count": 1 }
/// ```
///
/// # Errors
/// - **400 Bad Request**: unparsable filter, `$top`/`$skip`, or system
///   property list
pub async fn query_rows(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let table = route_param(&params, "name")?;
    let query = parse_query_params(req.uri().query())?;

    let rows = dispatch(&state, |response| ApiRequest::Query {
        table,
        query,
        response,
    })
    .await?;

    json_response(200, rows)
}

/// Fetches one row.
///
/// # Endpoint
/// `GET /tables/{name}/{id}`
///
/// # Errors
/// - **404 Not Found**: unknown table or row
pub async fn lookup_row(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let table = route_param(&params, "name")?;
    let id = route_param(&params, "id")?;
    let query = parse_query_params(req.uri().query())?;

    let row = dispatch(&state, |response| ApiRequest::Lookup {
        table,
        id,
        properties: query.properties,
        response,
    })
    .await?;

    json_response(200, row)
}

/// Partially updates a row.
///
/// # Endpoint
/// `PATCH /tables/{name}/{id}`
///
/// # Headers
/// - `If-Match: "<version>"` makes the update conditional on the stored version
///
/// # Errors
/// - **404 Not Found**: unknown table or row
/// - **412 Precondition Failed**: version mismatch; the body's `current`
///   field holds the server's row
pub async fn update_row(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let table = route_param(&params, "name")?;
    let id = route_param(&params, "id")?;
    let query = parse_query_params(req.uri().query())?;
    let if_match = parse_if_match(req.headers())?;
    let patch = read_json_body(req, state.config.request_timeout_ms).await?;

    let row = dispatch(&state, |response| ApiRequest::Update {
        table,
        id,
        patch,
        if_match,
        properties: query.properties,
        response,
    })
    .await?;

    json_response(200, row)
}

/// Deletes a row.
///
/// # Endpoint
/// `DELETE /tables/{name}/{id}`
///
/// # Response
/// - **204 No Content**
///
/// # Errors
/// - **404 Not Found**: unknown table or row
pub async fn delete_row(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let table = route_param(&params, "name")?;
    let id = route_param(&params, "id")?;

    dispatch(&state, |response| ApiRequest::Delete {
        table,
        id,
        response,
    })
    .await?;

    build_empty_response(204)
}
