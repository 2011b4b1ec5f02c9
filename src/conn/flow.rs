//! The flow engine.
//!
//! A flow occupies the connection from its first request byte until the
//! terminating `ReadyForCommand`. Recoverable errors (server errors, type
//! mismatches, cardinality violations) are held back while the remaining
//! inbound messages drain, so the connection always returns to a ready
//! state before the error surfaces; fatal errors close the connection
//! immediately.

use crate::conn::ConnectionCore;
use crate::protocol::reply::ServerMessage;
use crate::protocol::request::Request;
use crate::protocol::value::QueryArgs;
use crate::protocol::{buffer::Reader, Cardinality, OutputFormat};
use crate::rows::RowSink;
use crate::{EdbError, EdbResult};
use uuid::Uuid;

/// Runs the ExecuteScript flow.
pub(crate) fn execute_script(conn_core: &mut ConnectionCore, query: &str) -> EdbResult<()> {
    assert_usable(conn_core)?;
    debug!("execute_script()");

    let mut request = Request::new();
    request.execute_script(query);
    request.sync();
    conn_core.send_request(request)?;

    read_until_ready(conn_core, |_, message| match message {
        ServerMessage::CommandComplete { status } => {
            trace!("script complete: {status}");
            Ok(())
        }
        message => Err(unexpected(&message, "script flow")),
    })
}

/// Runs the Prepare / Describe / Execute flow of a typed query.
pub(crate) fn query(
    conn_core: &mut ConnectionCore,
    query: &str,
    args: &QueryArgs,
    sink: &mut dyn RowSink,
    cardinality: Cardinality,
    format: OutputFormat,
) -> EdbResult<()> {
    assert_usable(conn_core)?;
    debug!("query() with cardinality {cardinality:?}");

    // 1: prepare, capturing the argument/result descriptor IDs
    let mut request = Request::new();
    request.prepare(format, cardinality, query);
    request.sync();
    conn_core.send_request(request)?;

    let mut descriptor_ids: Option<(Uuid, Uuid)> = None;
    read_until_ready(conn_core, |_, message| match message {
        ServerMessage::PrepareComplete {
            input_id,
            output_id,
        } => {
            descriptor_ids = Some((input_id, output_id));
            Ok(())
        }
        message => Err(unexpected(&message, "prepare flow")),
    })?;
    let Some((input_id, output_id)) = descriptor_ids else {
        return Err(fatal(
            conn_core,
            EdbError::Protocol("missing PrepareComplete".to_string()),
        ));
    };
    trace!("prepared; arguments {input_id}, results {output_id}");

    // 2: fetch and register missing type descriptors
    if !conn_core.registry().contains(&input_id) || !conn_core.registry().contains(&output_id) {
        let mut request = Request::new();
        request.describe_statement();
        request.sync();
        conn_core.send_request(request)?;

        read_until_ready(conn_core, |conn_core, message| match message {
            ServerMessage::CommandDataDescription {
                input_descriptor,
                output_descriptor,
                ..
            } => {
                crate::protocol::codecs::register_descriptors(
                    conn_core.registry_mut(),
                    &input_descriptor,
                )?;
                crate::protocol::codecs::register_descriptors(
                    conn_core.registry_mut(),
                    &output_descriptor,
                )?;
                Ok(())
            }
            message => Err(unexpected(&message, "describe flow")),
        })?;
    }
    let argument_codec = conn_core
        .registry()
        .get(&input_id)
        .map_err(|e| fatal(conn_core, e))?;
    let result_codec = conn_core
        .registry()
        .get(&output_id)
        .map_err(|e| fatal(conn_core, e))?;

    // 3: execute; argument encoding happens before the first byte is sent,
    // so encoding errors leave the connection untouched
    let mut request = Request::new();
    request.execute(|w| argument_codec.encode_arguments(args, w))?;
    request.sync();
    conn_core.send_request(request)?;

    let mut rows_seen = 0_usize;
    read_until_ready(conn_core, |_, message| match message {
        ServerMessage::Data { row } => {
            rows_seen += 1;
            match cardinality {
                Cardinality::NoResult => Err(EdbError::Cardinality(
                    "data row for a query declared to return nothing".to_string(),
                )),
                Cardinality::AtMostOne | Cardinality::One if rows_seen > 1 => Err(
                    EdbError::Cardinality("more than one row returned".to_string()),
                ),
                _ => {
                    let mut rdr = Reader::new(&row);
                    let value = result_codec.decode(&mut rdr)?;
                    rdr.expect_end()?;
                    sink.push_row(value)
                }
            }
        }
        ServerMessage::CommandComplete { status } => {
            trace!("command complete: {status}");
            Ok(())
        }
        message => Err(unexpected(&message, "execute flow")),
    })?;

    if cardinality == Cardinality::One && rows_seen == 0 {
        return Err(EdbError::Cardinality(
            "no row returned for a query declared to return exactly one".to_string(),
        ));
    }
    Ok(())
}

// protocol deviations leave the stream uninterpretable
fn fatal(conn_core: &mut ConnectionCore, error: EdbError) -> EdbError {
    conn_core.abandon();
    error
}

fn assert_usable(conn_core: &ConnectionCore) -> EdbResult<()> {
    if conn_core.is_closed() {
        Err(EdbError::ConnectionClosed)
    } else {
        Ok(())
    }
}

fn unexpected(message: &ServerMessage, flow: &str) -> EdbError {
    EdbError::Protocol(format!("unexpected message in {flow}: {message:?}"))
}

/// Consumes inbound messages until the terminating `ReadyForCommand`.
///
/// `ErrorResponse` fixes the flow's pending error; `LogMessage` is already
/// routed to the log facade during parsing. Every other message goes to
/// `on_message`, whose recoverable errors also become the pending error
/// while draining continues. Fatal errors abort immediately and close the
/// connection.
fn read_until_ready<F>(conn_core: &mut ConnectionCore, mut on_message: F) -> EdbResult<()>
where
    F: FnMut(&mut ConnectionCore, ServerMessage) -> EdbResult<()>,
{
    let mut pending: Option<EdbError> = None;
    loop {
        let message = conn_core.read_message()?;
        match message {
            ServerMessage::ReadyForCommand { transaction_status } => {
                conn_core.set_transaction_status(transaction_status);
                return match pending {
                    Some(error) => Err(error),
                    None => Ok(()),
                };
            }
            ServerMessage::ErrorResponse { error } => {
                if pending.is_none() {
                    pending = Some(EdbError::DbError { source: error });
                } else {
                    warn!("suppressing subsequent server error: {error}");
                }
            }
            ServerMessage::LogMessage => {}
            message => {
                // after an error is pending, the rest of the flow is drained
                if pending.is_none() {
                    if let Err(error) = on_message(conn_core, message) {
                        if error.is_fatal() {
                            conn_core.abandon();
                            return Err(error);
                        }
                        pending = Some(error);
                    }
                }
            }
        }
    }
}
