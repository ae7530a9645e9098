//! Exercises spec.md §8's "Timeout" scenario and §4.H `close()`'s abort-all
//! behavior (spec §8 "Shutdown completeness").


use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use voltwire::{CallOutcome, CallbackExecutor, Connection, ConnectionSettings, Value};

#[test]
fn unanswered_call_times_out_between_50_and_150ms() {
    test_utils::init_logger();
    let (listener, addr) = test_utils::bind_loopback();
    let server = thread::spawn(move || {
        let stream = test_utils::accept_and_login(&listener);
        // Deliberately never read or answer the call; hold the socket open
        // until the test is done with it.
        thread::sleep(Duration::from_millis(400));
        stream
    });

    let executor = Arc::new(CallbackExecutor::start(2));
    let settings = ConnectionSettings::new(addr, "usr", "pwd");
    let conn = Connection::open(settings, executor).unwrap();

    let (tx, rx) = mpsc::channel();
    let submitted_at = Instant::now();
    conn.submit("Slow", &[Value::Integer(Some(1))], move |outcome| tx.send(outcome).unwrap(), 50).unwrap();

    let outcome = rx.recv_timeout(Duration::from_millis(500)).unwrap();
    let elapsed = submitted_at.elapsed();
    assert!(elapsed >= Duration::from_millis(50), "fired before the deadline: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(300), "fired suspiciously late: {elapsed:?}");
    assert!(matches!(outcome, CallOutcome::Timedout { .. }));

    conn.close();
    server.join().unwrap();
}

#[test]
fn close_aborts_every_outstanding_call() {
    test_utils::init_logger();
    let (listener, addr) = test_utils::bind_loopback();
    let server = thread::spawn(move || {
        let stream = test_utils::accept_and_login(&listener);
        // Never respond; the test closes the connection out from under this.
        thread::sleep(Duration::from_millis(200));
        stream
    });

    let executor = Arc::new(CallbackExecutor::start(2));
    let settings = ConnectionSettings::new(addr, "usr", "pwd");
    let conn = Connection::open(settings, executor).unwrap();

    let (tx, rx) = mpsc::channel();
    let mut submitted = Vec::new();
    for _ in 0..10 {
        let tx = tx.clone();
        let id = conn
            .submit("Slow", &[Value::Integer(Some(1))], move |outcome| tx.send(outcome).unwrap(), -1)
            .unwrap();
        submitted.push(id);
    }

    conn.close();

    let mut aborted_ids = Vec::new();
    for _ in 0..10 {
        let outcome = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        match outcome {
            CallOutcome::Aborted { call_id, .. } => aborted_ids.push(call_id),
            other => panic!("expected Aborted, got {other:?}"),
        }
    }
    aborted_ids.sort_unstable();
    submitted.sort_unstable();
    assert_eq!(aborted_ids, submitted);

    server.join().unwrap();
}
