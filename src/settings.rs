//! Connection configuration (SPEC_FULL §10.3). Parsing from a URL or file
//! is an external collaborator's job; this is a plain data holder.

use crate::status::ServiceType;

/// Settings recognized by [`crate::connection::Connection::open`] (spec §6).
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub endpoints: Vec<String>,
    pub service_type: ServiceType,
    pub user_id: String,
    pub password: String,
    pub connect_timeout_ms: u64,
    /// `-1` means "no timeout" for calls that don't specify their own.
    pub default_command_timeout_ms: i64,
    pub statistics_enabled: bool,
    pub trace_enabled: bool,
    pub max_connections_in_pool: usize,
    pub use_pooling: bool,
}

impl ConnectionSettings {
    /// A single-endpoint settings value with the library's defaults for
    /// everything else.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            endpoints: vec![endpoint.into()],
            service_type: ServiceType::Database,
            user_id: user_id.into(),
            password: password.into(),
            connect_timeout_ms: 5_000,
            default_command_timeout_ms: 120_000,
            statistics_enabled: false,
            trace_enabled: false,
            max_connections_in_pool: 1,
            use_pooling: false,
        }
    }

    pub(crate) fn primary_endpoint(&self) -> Option<&str> {
        self.endpoints.first().map(String::as_str)
    }
}
