//! Mobile service client with builder pattern.
//!
//! Owns the HTTP connection pool, the application key and the runtime
//! handle that callback-style operations are spawned on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{header::IF_MATCH, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::error::{ClientError, PreconditionFailed, Result};
use crate::json_table::JsonTable;
use crate::models::TableRow;
use crate::table::Table;
use table_types::APPLICATION_KEY_HEADER;

/// Characters escaped in table names and row ids placed in the URL path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Client for a mobile table service.
///
/// Cloning is cheap; clones share the connection pool.
///
/// # Examples
///
/// ```rust,no_run
/// use table_client::{MobileServiceClient, SystemProperties};
///
/// # async fn example() -> table_client::Result<()> {
/// let client = MobileServiceClient::builder()
///     .base_url("http://localhost:8080")
///     .application_key("secret")
///     .build()?;
///
/// let mut table = client.json_table("items");
/// table.set_system_properties(SystemProperties::all());
/// let row = table.insert(serde_json::json!({"name": "x"}), &[]).await?;
/// println!("{}", row["__version"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MobileServiceClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: String,
    http_client: reqwest::Client,
    application_key: Option<String>,
    runtime: Handle,
}

#[derive(Debug, Deserialize)]
struct SuccessEnvelope {
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
    #[serde(default)]
    current: Option<Value>,
}

impl MobileServiceClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> MobileServiceClientBuilder {
        MobileServiceClientBuilder::new()
    }

    /// Service base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Runtime that callback-style operations run on.
    pub fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    /// Handle for a table of raw JSON rows. No system properties are requested.
    pub fn json_table(&self, name: impl Into<String>) -> JsonTable {
        JsonTable::new(self.clone(), name.into())
    }

    /// Handle for a table of typed rows, starting from `T::system_properties()`.
    pub fn table<T: TableRow>(&self, name: impl Into<String>) -> Table<T> {
        Table::new(self.json_table(name))
    }

    pub(crate) fn table_url(&self, table: &str) -> String {
        format!(
            "{}/tables/{}",
            self.inner.base_url,
            utf8_percent_encode(table, PATH_SEGMENT)
        )
    }

    pub(crate) fn row_url(&self, table: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.table_url(table),
            utf8_percent_encode(id, PATH_SEGMENT)
        )
    }

    /// Sends one request and unwraps the response envelope.
    ///
    /// Returns `Value::Null` for responses without a body.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: Option<&Value>,
        if_match: Option<&str>,
    ) -> Result<Value> {
        let mut request = self.inner.http_client.request(method.clone(), url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(key) = &self.inner.application_key {
            request = request.header(APPLICATION_KEY_HEADER, key);
        }
        if let Some(version) = if_match {
            request = request.header(IF_MATCH, format!("\"{}\"", version));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(
            "{} {} status={} duration_ms={}",
            method,
            url,
            status,
            start.elapsed().as_millis()
        );

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let text = response.text().await?;
        if status.is_success() {
            let envelope: SuccessEnvelope = serde_json::from_str(&text)?;
            return Ok(envelope.data);
        }

        let envelope: ErrorEnvelope = serde_json::from_str(&text).unwrap_or_default();
        let message = if envelope.error.message.is_empty() {
            text
        } else {
            envelope.error.message
        };
        tracing::debug!("{} {} failed: {}", method, url, message);

        if status == StatusCode::PRECONDITION_FAILED {
            let current = envelope.current.unwrap_or(Value::Null);
            return Err(PreconditionFailed::new(message, current).into());
        }
        Err(ClientError::Service {
            status: status.as_u16(),
            message,
        })
    }
}

/// Builder for [`MobileServiceClient`].
#[derive(Default)]
pub struct MobileServiceClientBuilder {
    base_url: Option<String>,
    application_key: Option<String>,
    timeout: Option<Duration>,
    runtime: Option<Handle>,
}

impl MobileServiceClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the application key sent with every request
    pub fn application_key(mut self, key: impl Into<String>) -> Self {
        self.application_key = Some(key.into());
        self
    }

    /// Set a transport timeout; requests have none by default
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the runtime callbacks are spawned on.
    ///
    /// Defaults to the runtime `build` is called from. It must be a
    /// multi-threaded runtime; `build` rejects a current-thread one.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<MobileServiceClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| {
                ClientError::Configuration(format!("no runtime handle available: {}", e))
            })?,
        };
        // Callbacks must make progress while their caller blocks on them.
        if runtime.runtime_flavor() == RuntimeFlavor::CurrentThread {
            return Err(ClientError::Configuration(
                "a multi-threaded runtime is required".into(),
            ));
        }

        let mut client_builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        let http_client = client_builder
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        tracing::debug!("Table client created for {}", base_url);

        Ok(MobileServiceClient {
            inner: Arc::new(ClientInner {
                base_url,
                http_client,
                application_key: self.application_key,
                runtime,
            }),
        })
    }
}
