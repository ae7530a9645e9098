//! Ties the codec, framing, serializer, deserializer, execution cache, and
//! callback executor together: login, submit, read loop, timeout loop,
//! shutdown (spec §4.H).

use crate::de;
use crate::error::{VoltError, VoltResult};
use crate::executor::CallbackExecutor;
use crate::frame::{FrameReader, FrameWriter};
use crate::login::{self, ClusterIdentity};
use crate::pending::{ExecutionCache, PendingEntry};
use crate::response::{CallOutcome, Reply};
use crate::settings::ConnectionSettings;
use crate::stats::{ConnectionStatistics, ConnectionStatisticsSnapshot};
use crate::status::ResponseStatus;
use crate::value::Value;
use byteorder::{BigEndian, ByteOrder};
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Observable connection lifecycle state (spec §4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Draining,
    Closing,
    Closed,
}

impl ConnectionStatus {
    fn to_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Connected => 1,
            Self::Draining => 2,
            Self::Closing => 3,
            Self::Closed => 4,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Connected,
            2 => Self::Draining,
            3 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// A single logical connection to one server node.
///
/// Owns the socket, a write-serializing mutex around the frame writer, a
/// reader thread, a timeout thread, and a reference to a (possibly shared)
/// callback executor. Always handed out behind `Arc` since the reader and
/// timeout threads hold their own strong references.
pub struct Connection {
    settings: ConnectionSettings,
    endpoint: String,
    executor: Arc<CallbackExecutor>,
    cache: ExecutionCache,
    stats: Arc<ConnectionStatistics>,
    identity: ClusterIdentity,

    status: AtomicU8,
    next_call_id: AtomicU64,
    shutdown: AtomicBool,
    writer: Mutex<Option<FrameWriter<TcpStream>>>,
    shutdown_socket: Mutex<Option<TcpStream>>,
    terminal_error: Mutex<Option<Arc<VoltError>>>,
    reader_thread: Mutex<Option<JoinHandle<()>>>,
    timeout_thread: Mutex<Option<JoinHandle<()>>>,
    drain_signal: Condvar,
    drain_lock: Mutex<()>,
}

impl Connection {
    /// Opens a TCP connection, performs the login handshake, and starts
    /// the read and timeout loops (spec §4.H "open").
    pub fn open(settings: ConnectionSettings, executor: Arc<CallbackExecutor>) -> VoltResult<Arc<Self>> {
        let endpoint = settings
            .primary_endpoint()
            .ok_or_else(|| VoltError::ConnectionFailed {
                endpoint: String::new(),
                cause: Box::new(VoltError::ConnectionClosed),
            })?
            .to_string();

        let stream = Self::connect(&endpoint, Duration::from_millis(settings.connect_timeout_ms))
            .map_err(|cause| VoltError::ConnectionFailed { endpoint: endpoint.clone(), cause: Box::new(cause) })?;

        let identity = Self::login(&stream, &settings, Duration::from_millis(settings.connect_timeout_ms))
            .map_err(|cause| VoltError::ConnectionFailed { endpoint: endpoint.clone(), cause: Box::new(cause) })?;

        stream
            .set_read_timeout(None)
            .map_err(|e| VoltError::ConnectionFailed { endpoint: endpoint.clone(), cause: Box::new(VoltError::Io(e)) })?;

        let reader_stream = stream
            .try_clone()
            .map_err(|e| VoltError::ConnectionFailed { endpoint: endpoint.clone(), cause: Box::new(VoltError::Io(e)) })?;
        let writer_stream = stream
            .try_clone()
            .map_err(|e| VoltError::ConnectionFailed { endpoint: endpoint.clone(), cause: Box::new(VoltError::Io(e)) })?;

        let frame_reader = FrameReader::new(reader_stream);
        let frame_writer = FrameWriter::new(writer_stream);

        let conn = Arc::new(Self {
            settings,
            endpoint,
            executor,
            cache: ExecutionCache::new(),
            stats: Arc::new(ConnectionStatistics::default()),
            identity,
            status: AtomicU8::new(ConnectionStatus::Connected.to_u8()),
            next_call_id: AtomicU64::new(1),
            shutdown: AtomicBool::new(false),
            writer: Mutex::new(Some(frame_writer)),
            shutdown_socket: Mutex::new(Some(stream)),
            terminal_error: Mutex::new(None),
            reader_thread: Mutex::new(None),
            timeout_thread: Mutex::new(None),
            drain_signal: Condvar::new(),
            drain_lock: Mutex::new(()),
        });

        let reader_conn = Arc::clone(&conn);
        let reader_handle = thread::Builder::new()
            .name(format!("voltwire-reader-{}", conn.endpoint))
            .spawn(move || reader_conn.read_loop(frame_reader))
            .expect("failed to spawn reader thread");
        *conn.reader_thread.lock().unwrap() = Some(reader_handle);

        let timeout_conn = Arc::clone(&conn);
        let timeout_handle = thread::Builder::new()
            .name(format!("voltwire-timeout-{}", conn.endpoint))
            .spawn(move || timeout_conn.timeout_loop())
            .expect("failed to spawn timeout thread");
        *conn.timeout_thread.lock().unwrap() = Some(timeout_handle);

        log::debug!(
            "connected to {} (host_id={}, connection_id={})",
            conn.endpoint,
            conn.identity.host_id,
            conn.identity.connection_id
        );

        Ok(conn)
    }

    fn connect(endpoint: &str, timeout: Duration) -> VoltResult<TcpStream> {
        let addr = endpoint
            .to_socket_addrs()
            .map_err(VoltError::Io)?
            .next()
            .ok_or_else(|| VoltError::ConnectTimeout { endpoint: endpoint.to_string() })?;
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
            if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
                VoltError::ConnectTimeout { endpoint: endpoint.to_string() }
            } else {
                VoltError::Io(e)
            }
        })?;
        stream.set_nodelay(true).map_err(VoltError::Io)?;
        Self::enable_keepalive(&stream)?;
        Ok(stream)
    }

    fn enable_keepalive(stream: &TcpStream) -> VoltResult<()> {
        let socket = socket2::Socket::from(stream.try_clone().map_err(VoltError::Io)?);
        socket.set_keepalive(true).map_err(VoltError::Io)?;
        // `socket` owns a dup()'d file descriptor; dropping it here closes
        // only that duplicate, not the caller's `stream`.
        Ok(())
    }

    fn login(stream: &TcpStream, settings: &ConnectionSettings, handshake_timeout: Duration) -> VoltResult<ClusterIdentity> {
        stream.set_read_timeout(Some(handshake_timeout)).map_err(VoltError::Io)?;

        let mut reader = FrameReader::new(stream.try_clone().map_err(VoltError::Io)?);
        let mut writer = FrameWriter::new(stream.try_clone().map_err(VoltError::Io)?);

        let login_payload =
            login::encode_login_request(settings.service_type, &settings.user_id, &settings.password)?;
        writer.write_frame(&login_payload)?;

        let response_payload = reader.read_frame()?;
        login::decode_login_response(&response_payload)
    }

    /// Current observable lifecycle state.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    #[must_use]
    pub fn identity(&self) -> &ClusterIdentity {
        &self.identity
    }

    #[must_use]
    pub fn statistics(&self) -> ConnectionStatisticsSnapshot {
        self.stats.snapshot()
    }

    /// The error that tore this connection down, if any.
    #[must_use]
    pub fn terminal_error(&self) -> Option<Arc<VoltError>> {
        self.terminal_error.lock().unwrap().clone()
    }

    /// The client-facing status of a still-outstanding call (spec §6).
    ///
    /// Returns `Some(ResponseStatus::Pending)` while `call_id` is still in
    /// the execution cache awaiting its terminal transition, or `None` once
    /// it has resolved — by then its terminal status was already delivered
    /// to the callback via [`CallOutcome::status`].
    #[must_use]
    pub fn call_status(&self, call_id: u64) -> Option<ResponseStatus> {
        self.cache.contains(call_id).then_some(ResponseStatus::Pending)
    }

    /// Submits a stored-procedure call. Safe to call concurrently from
    /// many threads (spec §4.H, §5).
    ///
    /// `timeout_ms` is this call's own timeout; the effective deadline is
    /// `max(timeout_ms, connection_default_timeout_ms)`, with `-1` meaning
    /// "no timeout" for either value (spec §4.F).
    pub fn submit(
        self: &Arc<Self>,
        procedure: &str,
        params: &[Value],
        callback: impl FnOnce(CallOutcome) + Send + 'static,
        timeout_ms: i64,
    ) -> VoltResult<u64> {
        if self.status() != ConnectionStatus::Connected {
            if let Some(err) = self.terminal_error() {
                return Err(VoltError::Terminated(err.to_string()));
            }
            return Err(VoltError::ConnectionClosed);
        }

        let call_id = self.next_call_id.fetch_add(1, Ordering::SeqCst);
        let payload = crate::ser::encode_call(procedure, call_id, params)?;

        let now = Instant::now();
        let deadline = compute_deadline(timeout_ms, self.settings.default_command_timeout_ms)
            .map(|effective_ms| now + Duration::from_millis(effective_ms as u64));

        let entry = PendingEntry {
            call_id,
            procedure: procedure.to_string(),
            submitted_at: now,
            deadline,
            callback: Box::new(callback),
        };

        // Insert before writing: the reader must never observe a reply
        // whose entry has not yet been inserted (spec §5).
        self.cache.insert(entry);

        let write_result = {
            let mut guard = self.writer.lock().unwrap();
            match guard.as_mut() {
                Some(writer) => writer.write_frame(&payload),
                None => Err(VoltError::ConnectionClosed),
            }
        };

        if let Err(e) = write_result {
            // Best-effort: if a concurrent terminate() already claimed this
            // id and fired an Aborted callback, there is nothing left to
            // undo here; the caller still learns about the failure via the
            // synchronous Err this function returns.
            let _ = self.cache.begin_remove(call_id);
            return Err(e);
        }

        if self.settings.statistics_enabled {
            self.stats.record_submit();
            self.stats.record_bytes_written(payload.len() as u64);
        }

        Ok(call_id)
    }

    /// Refuses new submissions, waits until no calls are pending, then closes.
    pub fn drain(self: &Arc<Self>, max_wait: Duration) -> VoltResult<()> {
        self.status
            .compare_exchange(
                ConnectionStatus::Connected.to_u8(),
                ConnectionStatus::Draining.to_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|_| VoltError::ConnectionClosed)?;

        let deadline = Instant::now() + max_wait;
        let mut guard = self.drain_lock.lock().unwrap();
        while !self.cache.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return Err(VoltError::SocketTimeout);
            }
            let (g, _) = self.drain_signal.wait_timeout(guard, (deadline - now).min(Duration::from_millis(50))).unwrap();
            guard = g;
        }
        drop(guard);
        self.close();
        Ok(())
    }

    /// Aborts outstanding requests, stops the read/timeout loops, and
    /// closes the socket. Idempotent.
    pub fn close(self: &Arc<Self>) {
        let prev = self.status.swap(ConnectionStatus::Closing.to_u8(), Ordering::SeqCst);
        if prev == ConnectionStatus::Closed.to_u8() {
            return;
        }
        self.terminate(VoltError::ConnectionClosed);

        if let Some(handle) = self.reader_thread.lock().unwrap().take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.timeout_thread.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Tears the connection down: idempotent, swallows cascaded I/O errors.
    fn terminate(&self, err: VoltError) {
        let prev = self.status.swap(ConnectionStatus::Closed.to_u8(), Ordering::SeqCst);
        if prev == ConnectionStatus::Closed.to_u8() {
            return;
        }

        log::warn!("connection to {} terminated: {err}", self.endpoint);
        self.shutdown.store(true, Ordering::SeqCst);
        *self.terminal_error.lock().unwrap() = Some(Arc::new(err));

        if let Some(socket) = self.shutdown_socket.lock().unwrap().take() {
            let _ = socket.shutdown(std::net::Shutdown::Both);
        }
        *self.writer.lock().unwrap() = None;

        for id in self.cache.current_ids() {
            if let Some(entry) = self.cache.begin_remove(id) {
                if self.settings.statistics_enabled {
                    self.stats.record_abort();
                }
                self.executor.enqueue(entry.callback, CallOutcome::Aborted { call_id: id, procedure: entry.procedure });
            }
        }

        self.notify_drain();
    }

    fn notify_drain(&self) {
        let _guard = self.drain_lock.lock().unwrap();
        self.drain_signal.notify_all();
    }

    fn read_loop(self: Arc<Self>, mut frame_reader: FrameReader<TcpStream>) {
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return;
            }
            match frame_reader.read_frame() {
                Ok(payload) => self.handle_incoming_frame(&payload),
                Err(e) => {
                    self.terminate(e);
                    return;
                }
            }
        }
    }

    fn handle_incoming_frame(self: &Arc<Self>, payload: &[u8]) {
        if payload.len() < 8 {
            self.terminate(VoltError::UnexpectedEof);
            return;
        }
        let call_id = BigEndian::read_u64(&payload[0..8]);

        let Some(entry) = self.cache.begin_remove(call_id) else {
            log::trace!("dropping frame for already-resolved call {call_id}");
            return;
        };

        if self.settings.statistics_enabled {
            self.stats.record_bytes_read(payload.len() as u64);
        }

        match de::decode_reply(payload) {
            Ok(reply) => {
                if self.settings.statistics_enabled {
                    self.stats.record_reply();
                }
                self.dispatch_reply(reply, entry);
            }
            Err(e) => {
                log::warn!("failed to decode reply for call {call_id}: {e}");
                self.executor.enqueue(entry.callback, CallOutcome::Aborted { call_id, procedure: entry.procedure });
            }
        }
        self.notify_drain();
    }

    fn dispatch_reply(&self, reply: Reply, entry: PendingEntry) {
        self.executor.enqueue(entry.callback, CallOutcome::Reply(reply));
    }

    fn timeout_loop(self: Arc<Self>) {
        const IDLE_POLL: Duration = Duration::from_millis(100);
        const BUSY_POLL: Duration = Duration::from_millis(10);

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return;
            }
            let now = Instant::now();
            let expired = self.cache.expired_ids(now);
            if expired.is_empty() {
                thread::sleep(IDLE_POLL);
                continue;
            }
            for id in expired {
                if let Some(entry) = self.cache.begin_remove(id) {
                    if self.settings.statistics_enabled {
                        self.stats.record_timeout();
                    }
                    self.executor
                        .enqueue(entry.callback, CallOutcome::Timedout { call_id: id, procedure: entry.procedure });
                }
            }
            self.notify_drain();
            thread::sleep(BUSY_POLL);
        }
    }
}

/// `max(per_call, connection_default)`, where `-1` means "no timeout"
/// (spec §4.F). Returns `None` for no timeout, else the effective
/// millisecond budget.
fn compute_deadline(per_call_ms: i64, default_ms: i64) -> Option<i64> {
    let effective = per_call_ms.max(default_ms);
    if effective < 0 {
        None
    } else {
        Some(effective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_timeout_only_when_both_sides_say_so() {
        assert_eq!(compute_deadline(-1, -1), None);
        assert_eq!(compute_deadline(50, -1), Some(50));
        assert_eq!(compute_deadline(-1, 2_000), Some(2_000));
        assert_eq!(compute_deadline(50, 2_000), Some(2_000));
    }
}
