//! A client library speaking a distributed SQL database's native binary
//! wire protocol: stored-procedure invocation with callback-based
//! completion over a framed TCP connection.
//!
//! The public surface is small and sits on top of [`connection::Connection`]:
//!
//! ```no_run
//! use voltwire::{ConnectionSettings, Connection, CallbackExecutor, Value, CallOutcome};
//! use std::sync::Arc;
//!
//! let executor = Arc::new(CallbackExecutor::start(CallbackExecutor::default_pool_size()));
//! let settings = ConnectionSettings::new("127.0.0.1:21212", "user", "pass");
//! let conn = Connection::open(settings, executor)?;
//!
//! conn.submit("Echo", &[Value::Integer(Some(1))], |outcome| {
//!     if let CallOutcome::Reply(reply) = outcome {
//!         let _ = reply.single_row_table();
//!     }
//! }, 2_000)?;
//! # Ok::<(), voltwire::VoltError>(())
//! ```

pub mod codec;
pub mod connection;
pub mod de;
pub mod error;
pub mod executor;
pub mod frame;
pub mod login;
pub mod pending;
pub mod response;
pub mod result;
pub mod ser;
pub mod settings;
pub mod stats;
pub mod status;
pub mod value;

pub use connection::{Connection, ConnectionStatus};
pub use error::{VoltError, VoltResult};
pub use executor::CallbackExecutor;
pub use login::ClusterIdentity;
pub use response::{CallOutcome, Callback, Reply};
pub use result::{Column, SingleRowTable, Table};
pub use settings::ConnectionSettings;
pub use stats::{ConnectionStatistics, ConnectionStatisticsSnapshot};
pub use status::{LoginStatus, ResponseStatus, ServerStatus, ServiceType};
pub use value::{TypeTag, Value};
