mod test_utils;

use edbconnect::{Connection, ConnectionState, EdbError};
use log::info;
use test_utils::{MockServer, Session};

#[test]
fn test_010_connect() {
    test_utils::init_logger();
    connect_successfully();
    connect_with_version_negotiation();
    connect_with_scram_authentication();
    connect_with_wrong_password();
    connect_with_unsupported_server_version();
    connect_rejected_by_the_server();
}

fn connect_successfully() {
    info!("test a successful connection");
    let server = MockServer::start(|session: &mut Session| {
        session.accept_handshake();
    });

    let connection = Connection::connect(server.url()).unwrap();
    assert_eq!(connection.state(), ConnectionState::Ready);
    assert_eq!(
        connection.server_parameter("suggested_pool_concurrency"),
        Some("10")
    );
    assert_eq!(connection.server_parameter("nope"), None);
    server.join();
}

fn connect_with_version_negotiation() {
    info!("test a server that proposes a newer minor version");
    let server = MockServer::start(|session: &mut Session| {
        session.expect_frame(b'V');
        session.send(&test_utils::server_handshake(0, 14));
        session.send(&test_utils::ready_for_command(b'I'));
    });

    let connection = Connection::connect(server.url()).unwrap();
    assert_eq!(connection.state(), ConnectionState::Ready);
    server.join();
}

fn connect_with_scram_authentication() {
    info!("test a full SCRAM-SHA-256 exchange");
    let server = MockServer::start(|session: &mut Session| {
        session.expect_frame(b'V');
        session.send(&test_utils::authentication_sasl_required(&[
            "SCRAM-SHA-256",
        ]));

        let mut scram = test_utils::ScramServer::new("geheim");
        let mut body = test_utils::BodyReader::new(session.expect_frame(b'p'));
        assert_eq!(body.str_(), "SCRAM-SHA-256");
        let server_first = scram.first(&body.bytes());
        session.send(&test_utils::authentication_sasl_continue(&server_first));

        let mut body = test_utils::BodyReader::new(session.expect_frame(b'r'));
        let server_final = scram.last(&body.bytes());
        session.send(&test_utils::authentication_sasl_final(&server_final));
        session.send(&test_utils::authentication_ok());
        session.send(&test_utils::ready_for_command(b'I'));
    });

    let url = server.url().replace("edgedb@", "edgedb:geheim@");
    let connection = Connection::connect(url).unwrap();
    assert_eq!(connection.state(), ConnectionState::Ready);
    server.join();
}

fn connect_with_wrong_password() {
    info!("test a SCRAM exchange the server rejects");
    let server = MockServer::start(|session: &mut Session| {
        session.expect_frame(b'V');
        session.send(&test_utils::authentication_sasl_required(&[
            "SCRAM-SHA-256",
        ]));
        session.expect_frame(b'p');
        session.send(&test_utils::error_response(
            0x0a01_0001,
            "authentication failed",
        ));
    });

    let url = server.url().replace("edgedb@", "edgedb:falsch@");
    let err = Connection::connect(url).unwrap_err();
    assert!(matches!(err, EdbError::Authentication { .. }));
    server.join();
}

fn connect_with_unsupported_server_version() {
    info!("test a server that proposes an unsupported version");
    let server = MockServer::start(|session: &mut Session| {
        session.expect_frame(b'V');
        session.send(&test_utils::server_handshake(0, 9));
    });

    let err = Connection::connect(server.url()).unwrap_err();
    assert!(matches!(err, EdbError::VersionMismatch((0, 9))));
    server.join();
}

fn connect_rejected_by_the_server() {
    info!("test an ErrorResponse during the handshake");
    let server = MockServer::start(|session: &mut Session| {
        session.expect_frame(b'V');
        session.send(&test_utils::error_response(
            0x0100_0001,
            "database does not exist",
        ));
    });

    let err = Connection::connect(server.url()).unwrap_err();
    let source = match err {
        EdbError::Authentication { source } => source,
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(
        source.server_error().map(edbconnect::ServerError::message),
        Some("database does not exist")
    );
    server.join();
}
