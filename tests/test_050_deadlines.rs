mod test_utils;

use edbconnect::{Connection, ConnectionState, EdbError};
use log::info;
use std::time::Duration;
use test_utils::{MockServer, Session};

#[test]
fn test_050_deadlines() {
    test_utils::init_logger();
    command_timeout_closes_the_connection();
    cancellation_closes_the_connection();
}

fn command_timeout_closes_the_connection() {
    info!("test the per-flow read deadline");
    let server = MockServer::start(|session: &mut Session| {
        session.accept_handshake();
        session.expect_frame(b'Q');
        session.expect_frame(b'S');
        // never answer; the client read deadline must fire
        std::thread::sleep(Duration::from_millis(1500));
    });

    let mut connection =
        Connection::connect(server.url_with("command_timeout_ms=300")).unwrap();
    let err = connection.execute_script("SELECT 1;").unwrap_err();
    assert!(matches!(err, EdbError::Timeout));
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(matches!(
        connection.execute_script("SELECT 1;"),
        Err(EdbError::ConnectionClosed)
    ));
    server.join();
}

fn cancellation_closes_the_connection() {
    info!("test cancellation from another thread");
    let server = MockServer::start(|session: &mut Session| {
        session.accept_handshake();
        session.expect_frame(b'Q');
        session.expect_frame(b'S');
        // never answer; the client gets cancelled meanwhile
        std::thread::sleep(Duration::from_millis(1500));
    });

    let mut connection = Connection::connect(server.url()).unwrap();
    let cancel_handle = connection.cancel_handle();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        cancel_handle.cancel();
    });

    let err = connection.execute_script("SELECT 1;").unwrap_err();
    assert!(matches!(err, EdbError::Cancelled));
    assert_eq!(connection.state(), ConnectionState::Closed);
    canceller.join().unwrap();
    server.join();
}
