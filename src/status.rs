//! Status codes exchanged with the server (spec §6).

use crate::error::{VoltError, VoltResult};

/// Server-reported outcome of a stored-procedure call, as a signed byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Success = 1,
    UserAbort = -1,
    GracefulFailure = -2,
    UnexpectedFailure = -3,
    ConnectionLost = -4,
    ServerUnavailable = -5,
}

impl ServerStatus {
    pub fn from_i8(b: i8) -> VoltResult<Self> {
        match b {
            1 => Ok(Self::Success),
            -1 => Ok(Self::UserAbort),
            -2 => Ok(Self::GracefulFailure),
            -3 => Ok(Self::UnexpectedFailure),
            -4 => Ok(Self::ConnectionLost),
            -5 => Ok(Self::ServerUnavailable),
            other => Err(VoltError::UnknownServerStatus(other)),
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Client-facing response status, orthogonal to the wire-level [`ServerStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    Aborted,
    Timedout,
    Failed,
    Pending,
}

/// The coarse-grained login target selected at handshake time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    Database,
    Export,
}

impl ServiceType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Export => "export",
        }
    }
}

/// Status byte at the head of the login response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    Connected,
    InvalidCredentials,
    ServerTooBusy,
    HandshakeTimeout,
    CorruptedHandshake,
    Unknown(i8),
}

impl LoginStatus {
    #[must_use]
    pub fn from_i8(b: i8) -> Self {
        match b {
            0 => Self::Connected,
            -1 => Self::InvalidCredentials,
            1 => Self::ServerTooBusy,
            2 => Self::HandshakeTimeout,
            3 => Self::CorruptedHandshake,
            other => Self::Unknown(other),
        }
    }
}
