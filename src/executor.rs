//! Bounded worker pool that runs user completion handlers off the I/O path (spec §4.G).

use crate::response::{CallOutcome, Callback};
use crossbeam_channel::{unbounded, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

/// A shared pool of worker threads dequeuing `(callback, outcome)` pairs
/// from an unbounded FIFO queue.
///
/// `enqueue` never blocks: the queue is unbounded, so a `send` only fails
/// if every worker has already exited. `stop` relies on `crossbeam_channel`
/// draining semantics — dropping the sender lets workers finish whatever
/// is already queued before their `recv` finally returns `Disconnected`,
/// which is exactly "wait until the queue is empty, then signal workers to
/// exit" without any extra bookkeeping.
pub struct CallbackExecutor {
    sender: Option<Sender<(Callback, CallOutcome)>>,
    workers: Vec<JoinHandle<()>>,
}

impl CallbackExecutor {
    /// Default pool size: `max(cpu_hint - 3, 2)`, leaving headroom for the
    /// reader thread, the timeout thread, and the caller (spec §4.G).
    #[must_use]
    pub fn default_pool_size() -> usize {
        let cpus = thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(4);
        cpus.saturating_sub(3).max(2)
    }

    /// Spawns `pool_size` worker threads. Each connection using this
    /// executor should hold an `Arc` to one shared instance rather than
    /// calling `start` again per connection.
    #[must_use]
    pub fn start(pool_size: usize) -> Self {
        let (sender, receiver) = unbounded::<(Callback, CallOutcome)>();
        let mut workers = Vec::with_capacity(pool_size);
        for idx in 0..pool_size {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("voltwire-callback-{idx}"))
                .spawn(move || {
                    while let Ok((callback, outcome)) = receiver.recv() {
                        if catch_unwind(AssertUnwindSafe(|| callback(outcome))).is_err() {
                            log::warn!("callback panicked; suppressed");
                        }
                    }
                })
                .expect("failed to spawn callback worker thread");
            workers.push(handle);
        }
        Self { sender: Some(sender), workers }
    }

    /// Enqueues a callback invocation. Non-blocking; silently dropped if
    /// the executor has already been stopped.
    pub fn enqueue(&self, callback: Callback, outcome: CallOutcome) {
        if let Some(sender) = &self.sender {
            let _ = sender.send((callback, outcome));
        }
    }

    /// Drains the queue, then joins every worker thread.
    pub fn stop(mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
