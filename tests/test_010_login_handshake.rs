//! Drives a loopback peer that speaks just enough of the wire protocol to
//! exercise `Connection::open`'s login handshake (spec §4.H, §8 "Login success").


use std::sync::Arc;
use std::thread;
use voltwire::{CallbackExecutor, Connection, ConnectionSettings, ConnectionStatus, VoltError};

#[test]
fn successful_login_decodes_cluster_identity() {
    test_utils::init_logger();
    let (listener, addr) = test_utils::bind_loopback();
    let server = thread::spawn(move || {
        let _stream = test_utils::accept_and_login(&listener);
        _stream
    });

    let executor = Arc::new(CallbackExecutor::start(2));
    let settings = ConnectionSettings::new(addr, "usr", "pwd");
    let conn = Connection::open(settings, executor).unwrap();

    assert_eq!(conn.status(), ConnectionStatus::Connected);
    assert_eq!(conn.identity().host_id, 7);
    assert_eq!(conn.identity().connection_id, 42);
    assert_eq!(conn.identity().build_tag, "v10");

    conn.close();
    server.join().unwrap();
}

#[test]
fn invalid_credentials_status_fails_open() {
    test_utils::init_logger();
    let (listener, addr) = test_utils::bind_loopback();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let _login_request = test_utils::read_frame(&mut stream);
        test_utils::write_frame(&mut stream, &[(-1i8) as u8]);
    });

    let executor = Arc::new(CallbackExecutor::start(2));
    let settings = ConnectionSettings::new(addr, "usr", "wrong");
    let err = Connection::open(settings, executor).unwrap_err();

    match err {
        VoltError::ConnectionFailed { cause, .. } => {
            assert!(matches!(*cause, VoltError::InvalidCredentials));
        }
        other => panic!("expected ConnectionFailed(InvalidCredentials), got {other:?}"),
    }

    server.join().unwrap();
}

#[test]
fn version_mismatch_on_login_response_is_fatal() {
    test_utils::init_logger();
    let (listener, addr) = test_utils::bind_loopback();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let _login_request = test_utils::read_frame(&mut stream);
        // Hand-write a frame whose version byte is 1, not 0.
        use std::io::Write;
        let payload = test_utils::accepting_login_response();
        let mut header = [0u8; 5];
        header[0..4].copy_from_slice(&((payload.len() as u32) + 1).to_be_bytes());
        header[4] = 1;
        stream.write_all(&header).unwrap();
        stream.write_all(&payload).unwrap();
    });

    let executor = Arc::new(CallbackExecutor::start(2));
    let settings = ConnectionSettings::new(addr, "usr", "pwd");
    let err = Connection::open(settings, executor).unwrap_err();
    match err {
        VoltError::ConnectionFailed { cause, .. } => {
            assert!(matches!(*cause, VoltError::VersionMismatch { got: 1, expected: 0 }));
        }
        other => panic!("expected ConnectionFailed(VersionMismatch), got {other:?}"),
    }

    server.join().unwrap();
}
