//! Service configuration.

/// Table service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Tick rate of the request loop in Hz
    pub tickrate: u32,
    /// Maximum API requests applied per tick
    pub max_api_requests_per_tick: u32,
    /// Request timeout in milliseconds (reading the request body)
    pub request_timeout_ms: u64,
    /// Response timeout in milliseconds (waiting for the runtime)
    pub response_timeout_ms: u64,
    /// Upper bound for `$top`; also the page size when `$top` is absent
    pub max_top: usize,
    /// Application key clients must present, if any
    pub application_key: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tickrate: 120,
            max_api_requests_per_tick: 600,
            request_timeout_ms: 5000,   // 5 seconds default
            response_timeout_ms: 10000, // 10 seconds default
            max_top: 1000,
            application_key: None,
        }
    }
}
