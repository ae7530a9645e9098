//! Full submit → wire write → server reply → callback roundtrip, matching
//! spec.md §8's "Simple INTEGER procedure" scenario.


use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use voltwire::{CallOutcome, CallbackExecutor, Connection, ConnectionSettings, Value};

#[test]
fn echo_procedure_round_trips_an_integer() {
    test_utils::init_logger();
    let (listener, addr) = test_utils::bind_loopback();
    let server = thread::spawn(move || {
        let mut stream = test_utils::accept_and_login(&listener);
        let call_payload = test_utils::read_frame(&mut stream);
        // call id is the first 8 bytes after the 4-byte-length-prefixed name.
        let name_len = u32::from_be_bytes(call_payload[0..4].try_into().unwrap()) as usize;
        let call_id = u64::from_be_bytes(call_payload[4 + name_len..4 + name_len + 8].try_into().unwrap());
        test_utils::write_frame(&mut stream, &test_utils::success_reply_with_integer(call_id, 1));
        stream
    });

    let executor = Arc::new(CallbackExecutor::start(2));
    let settings = ConnectionSettings::new(addr, "usr", "pwd");
    let conn = Connection::open(settings, executor).unwrap();

    let (tx, rx) = mpsc::channel();
    let call_id = conn
        .submit("Echo", &[Value::Integer(Some(1))], move |outcome| {
            tx.send(outcome).unwrap();
        }, 2_000)
        .unwrap();

    let outcome = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    match outcome {
        CallOutcome::Reply(reply) => {
            assert_eq!(reply.call_id, call_id);
            assert!(reply.is_success());
            assert_eq!(reply.execution_duration_ms, 5);
            let table = reply.single_row_table().unwrap();
            assert_eq!(table.get_integer(0, 0).unwrap(), Some(1));
        }
        other => panic!("expected Reply, got {other:?}"),
    }

    conn.close();
    server.join().unwrap();
}

#[test]
fn call_ids_are_distinct_per_submission() {
    test_utils::init_logger();
    let (listener, addr) = test_utils::bind_loopback();
    let server = thread::spawn(move || {
        let mut stream = test_utils::accept_and_login(&listener);
        for _ in 0..5 {
            let call_payload = test_utils::read_frame(&mut stream);
            let name_len = u32::from_be_bytes(call_payload[0..4].try_into().unwrap()) as usize;
            let call_id =
                u64::from_be_bytes(call_payload[4 + name_len..4 + name_len + 8].try_into().unwrap());
            test_utils::write_frame(&mut stream, &test_utils::success_reply_with_integer(call_id, 0));
        }
        stream
    });

    let executor = Arc::new(CallbackExecutor::start(2));
    let settings = ConnectionSettings::new(addr, "usr", "pwd");
    let conn = Connection::open(settings, executor).unwrap();

    let mut ids = Vec::new();
    let (tx, rx) = mpsc::channel();
    for _ in 0..5 {
        let tx = tx.clone();
        let id = conn.submit("Echo", &[Value::Integer(Some(0))], move |o| tx.send(o).unwrap(), 2_000).unwrap();
        ids.push(id);
    }
    for _ in 0..5 {
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
    }

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5, "expected 5 distinct call ids");

    conn.close();
    server.join().unwrap();
}
