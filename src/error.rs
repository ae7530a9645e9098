//! Crate-wide error taxonomy (Protocol / Data / Connection / Execution / Permission).

use crate::status::ServerStatus;
use crate::value::TypeTag;
use thiserror::Error;

pub type VoltResult<T> = Result<T, VoltError>;

/// All failure modes surfaced by this crate.
///
/// Variants are grouped loosely by the taxonomy above rather than split into
/// nested enums, following the flat, `#[from]`-heavy shape of the teacher's
/// `HdbError`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum VoltError {
    // --- Protocol ---
    #[error("protocol version mismatch: got {got}, expected {expected}")]
    VersionMismatch { got: u8, expected: u8 },

    #[error("frame length {len} exceeds the maximum of {max} bytes")]
    LengthInvalid { len: u32, max: u32 },

    #[error("connection closed mid-frame")]
    UnexpectedEof,

    #[error("socket operation timed out")]
    SocketTimeout,

    // --- Data ---
    #[error("length {len} is not -1 or in [0, {max}]")]
    InvalidLength { len: i32, max: usize },

    #[error("column {col} has wire type {wire_type:?}, requested {requested:?}")]
    InvalidCast { col: usize, wire_type: TypeTag, requested: TypeTag },

    #[error("expected at most 1 row, got {0}")]
    InvalidRowCount(usize),

    #[error("expected {expected} column(s), table has {actual}")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("string/varbinary of {len} bytes exceeds the maximum of {max} bytes")]
    StringTooLong { len: usize, max: usize },

    #[error("parameter type {0} has no wire encoding")]
    UnsupportedParameterType(&'static str),

    #[error("column name bytes are not valid UTF-8")]
    InvalidColumnName(#[source] std::string::FromUtf8Error),

    #[error("string value is not valid UTF-8")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),

    #[error("unrecognized wire type tag {0}")]
    UnknownTypeTag(i8),

    // --- Connection ---
    #[error("connect to {endpoint} timed out")]
    ConnectTimeout { endpoint: String },

    #[error("failed to connect to {endpoint}")]
    ConnectionFailed {
        endpoint: String,
        #[source]
        cause: Box<VoltError>,
    },

    #[error("connection is closed")]
    ConnectionClosed,

    #[error("connection terminated: {0}")]
    Terminated(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    // --- Login (a Connection sub-case, kept distinct for precise messages) ---
    #[error("login rejected: invalid credentials")]
    InvalidCredentials,

    #[error("login rejected: server too busy")]
    ServerTooBusy,

    #[error("login handshake timed out")]
    HandshakeTimeout,

    #[error("login handshake payload was corrupted")]
    CorruptedHandshake,

    #[error("login rejected with unrecognized status {0}")]
    UnknownLoginStatus(i8),

    #[error("failed to parse login response")]
    ParseLoginResponse,

    #[error("unrecognized server status {0}")]
    UnknownServerStatus(i8),

    // --- Execution ---
    #[error("call was aborted")]
    Aborted,

    #[error("call timed out")]
    Timedout,

    #[error("server reported failure: {0:?}")]
    ServerFailure(ServerStatus),
}

impl VoltError {
    /// True for transport-level failures a caller might reasonably retry
    /// the whole connection over; false for data/permission errors that
    /// will reproduce deterministically.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout { .. } | Self::ConnectionFailed { .. } | Self::SocketTimeout | Self::Io(_)
        )
    }

    /// The server status carried by this error, if any.
    #[must_use]
    pub fn server_status(&self) -> Option<ServerStatus> {
        match self {
            Self::ServerFailure(s) => Some(*s),
            _ => None,
        }
    }
}
