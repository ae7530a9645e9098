//! The decoded reply to a stored-procedure call, and the callback contract (spec §3, §6).

use crate::error::{VoltError, VoltResult};
use crate::result::Table;
use crate::status::{ResponseStatus, ServerStatus};

/// A fully decoded response payload (spec §3's "Response payload").
///
/// This is the Rust-idiomatic stand-in for the spec's generic `Response<T>`:
/// rather than threading a type parameter through the executor and pending
/// cache, `Reply` carries the untyped table list, and callers extract a
/// typed result themselves (`reply.single_row_table()?.get_integer(0)`).
#[derive(Debug, Clone)]
pub struct Reply {
    pub call_id: u64,
    pub server_status: ServerStatus,
    pub server_status_string: Option<String>,
    pub application_status: i8,
    pub application_status_string: Option<String>,
    pub execution_duration_ms: i32,
    pub exception: Option<Vec<u8>>,
    pub tables: Vec<Table>,
}

impl Reply {
    /// Borrows the lone result table, validating it has at most one row.
    pub fn single_row_table(&self) -> VoltResult<&Table> {
        let table = self.tables.first().ok_or(VoltError::ColumnCountMismatch { expected: 1, actual: 0 })?;
        if table.row_count() > 1 {
            return Err(VoltError::InvalidRowCount(table.row_count()));
        }
        Ok(table)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.server_status.is_success()
    }

    /// Turns a non-`Success` server status into the matching `Execution`
    /// error (spec §7: "server-reported failure"), keeping a successful
    /// reply as-is.
    pub fn into_result(self) -> VoltResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(VoltError::ServerFailure(self.server_status))
        }
    }
}

/// The terminal outcome handed to a submitted call's callback (spec §4.H,
/// §7: "reply vs timeout vs abort").
#[derive(Debug)]
pub enum CallOutcome {
    Reply(Reply),
    Timedout { call_id: u64, procedure: String },
    Aborted { call_id: u64, procedure: String },
}

impl CallOutcome {
    /// Collapses the outcome into a single `Result`, the Rust-idiomatic
    /// stand-in for spec §6's `Response<T>` "either a decoded result ... or
    /// an error": a timeout becomes `Err(VoltError::Timedout)`, an abort
    /// becomes `Err(VoltError::Aborted)`, and a reply with a non-`Success`
    /// server status becomes `Err(VoltError::ServerFailure(..))`.
    pub fn into_result(self) -> VoltResult<Reply> {
        match self {
            Self::Reply(reply) => reply.into_result(),
            Self::Timedout { .. } => Err(VoltError::Timedout),
            Self::Aborted { .. } => Err(VoltError::Aborted),
        }
    }

    /// The client-facing status of this outcome (spec §6).
    #[must_use]
    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::Reply(reply) if reply.is_success() => ResponseStatus::Success,
            Self::Reply(_) => ResponseStatus::Failed,
            Self::Timedout { .. } => ResponseStatus::Timedout,
            Self::Aborted { .. } => ResponseStatus::Aborted,
        }
    }
}

/// A user completion handler. Boxed and type-erased so the execution cache
/// and callback executor don't need a type parameter per in-flight call.
pub type Callback = Box<dyn FnOnce(CallOutcome) + Send + 'static>;
