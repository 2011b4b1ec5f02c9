mod test_utils;

use edbconnect::{
    Cardinality, Connection, ConnectionState, EdbError, EdbValue, OutputFormat, QueryArgs, Rows,
};
use log::info;
use test_utils::{BodyReader, MockServer, Session, STR_ID};

const ARGS_SHAPE_ID: u128 = 0x1111_2222_3333_4444_5555_6666_7777_8888;

#[test]
fn test_040_transaction() {
    test_utils::init_logger();
    transaction_saves();
    transaction_rolls_back();
    failed_statement_requires_rollback();
    finished_transaction_rejects_further_use();
    unstarted_transaction_rejects_queries();
}

fn expect_script(session: &mut Session, script: &str, tx_state_after: u8) {
    let mut body = BodyReader::new(session.expect_frame(b'Q'));
    assert_eq!(body.u16(), 0);
    assert_eq!(body.str_(), script);
    session.expect_frame(b'S');
    session.send(&test_utils::command_complete(script));
    session.send(&test_utils::ready_for_command(tx_state_after));
}

// serves one prepared insert/select round inside a transaction
fn serve_query(
    session: &mut Session,
    with_describe: bool,
    rows: &[&str],
    tx_state_after: u8,
) {
    session.expect_frame(b'P');
    session.expect_frame(b'S');
    session.send(&test_utils::prepare_complete(ARGS_SHAPE_ID, STR_ID));
    session.send(&test_utils::ready_for_command(tx_state_after));

    if with_describe {
        session.expect_frame(b'D');
        session.expect_frame(b'S');
        session.send(&test_utils::command_data_description(
            ARGS_SHAPE_ID,
            &test_utils::input_shape_blob(ARGS_SHAPE_ID, &[(0, "0", STR_ID)]),
            STR_ID,
            &test_utils::base_scalar_blob(STR_ID),
        ));
        session.send(&test_utils::ready_for_command(tx_state_after));
    }

    session.expect_frame(b'E');
    session.expect_frame(b'S');
    for row in rows {
        session.send(&test_utils::data_row(&test_utils::str_block(row)));
    }
    session.send(&test_utils::command_complete("done"));
    session.send(&test_utils::ready_for_command(tx_state_after));
}

fn transaction_saves() {
    info!("test insert + commit + select");
    let server = MockServer::start(|session: &mut Session| {
        session.accept_handshake();
        expect_script(session, "START TRANSACTION", b'T');
        serve_query(session, true, &[], b'T'); // INSERT
        expect_script(session, "COMMIT", b'I');
        serve_query(session, false, &["test42"], b'I'); // SELECT
    });

    let mut connection = Connection::connect(server.url()).unwrap();
    {
        let mut tx = connection.begin_transaction();
        tx.start().unwrap();
        let mut rows = Rows::new();
        tx.query(
            "INSERT User { name := <str>$0 }",
            &QueryArgs::positional(vec!["test42".into()]),
            &mut rows,
            Cardinality::Many,
            OutputFormat::Binary,
        )
        .unwrap();
        tx.commit().unwrap();
    }
    assert_eq!(connection.state(), ConnectionState::Ready);

    let mut rows = Rows::new();
    connection
        .query(
            "SELECT User.name FILTER User.name = <str>$0",
            &QueryArgs::positional(vec!["test42".into()]),
            &mut rows,
            Cardinality::One,
            OutputFormat::Binary,
        )
        .unwrap();
    assert_eq!(rows.into_single().unwrap(), EdbValue::from("test42"));
    server.join();
}

fn transaction_rolls_back() {
    info!("test insert + rollback + select");
    let server = MockServer::start(|session: &mut Session| {
        session.accept_handshake();
        expect_script(session, "START TRANSACTION", b'T');
        serve_query(session, true, &[], b'T'); // INSERT
        expect_script(session, "ROLLBACK", b'I');
        serve_query(session, false, &[], b'I'); // SELECT finds nothing
    });

    let mut connection = Connection::connect(server.url()).unwrap();
    {
        let mut tx = connection.begin_transaction();
        tx.start().unwrap();
        let mut rows = Rows::new();
        tx.query(
            "INSERT User { name := <str>$0 }",
            &QueryArgs::positional(vec!["test43".into()]),
            &mut rows,
            Cardinality::Many,
            OutputFormat::Binary,
        )
        .unwrap();
        tx.rollback().unwrap();
    }

    let mut rows = Rows::new();
    let err = connection
        .query(
            "SELECT User.name FILTER User.name = <str>$0",
            &QueryArgs::positional(vec!["test43".into()]),
            &mut rows,
            Cardinality::One,
            OutputFormat::Binary,
        )
        .unwrap_err();
    assert!(matches!(err, EdbError::Cardinality(_)));
    server.join();
}

fn failed_statement_requires_rollback() {
    info!("test the failed-transaction state");
    let server = MockServer::start(|session: &mut Session| {
        session.accept_handshake();
        expect_script(session, "START TRANSACTION", b'T');

        // a failing statement moves the server to the failed state
        session.expect_frame(b'Q');
        session.expect_frame(b'S');
        session.send(&test_utils::error_response(0x0401_0000, "no such table"));
        session.send(&test_utils::ready_for_command(b'E'));

        expect_script(session, "ROLLBACK", b'I');
    });

    let mut connection = Connection::connect(server.url()).unwrap();
    let mut tx = connection.begin_transaction();
    tx.start().unwrap();
    let err = tx.execute_script("INSERT Nonsense;").unwrap_err();
    assert!(err.server_error().is_some());
    tx.rollback().unwrap();
    drop(tx);
    assert_eq!(connection.state(), ConnectionState::Ready);
    server.join();
}

fn finished_transaction_rejects_further_use() {
    info!("test that a transaction object is one-shot");
    let server = MockServer::start(|session: &mut Session| {
        session.accept_handshake();
        expect_script(session, "START TRANSACTION", b'T');
        expect_script(session, "COMMIT", b'I');
    });

    let mut connection = Connection::connect(server.url()).unwrap();
    let mut tx = connection.begin_transaction();
    tx.start().unwrap();
    tx.commit().unwrap();
    assert!(matches!(
        tx.execute_script("SELECT 1;"),
        Err(EdbError::Usage(_))
    ));
    assert!(matches!(tx.commit(), Err(EdbError::Usage(_))));
    assert!(matches!(tx.rollback(), Err(EdbError::Usage(_))));
    assert!(matches!(tx.start(), Err(EdbError::Usage(_))));
    server.join();
}

fn unstarted_transaction_rejects_queries() {
    info!("test that queries need a started transaction");
    let server = MockServer::start(|session: &mut Session| {
        session.accept_handshake();
    });

    let mut connection = Connection::connect(server.url()).unwrap();
    let mut tx = connection.begin_transaction();
    assert!(matches!(
        tx.execute_script("SELECT 1;"),
        Err(EdbError::Usage(_))
    ));
    server.join();
}
