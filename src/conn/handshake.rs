//! The connection handshake.
//!
//! Sends `ClientHandshake` and consumes server messages until the first
//! `ReadyForCommand`. Version negotiation, SASL authentication, the server
//! key data and the parameter map are all handled here; an `ErrorResponse`
//! during the handshake aborts the connection.

use crate::conn::{Authenticator, ConnectionCore, ConnectionState};
use crate::protocol::reply::ServerMessage;
use crate::protocol::request::Request;
use crate::{EdbError, EdbResult, PROTOCOL_VERSION};

pub(crate) fn establish(
    conn_core: &mut ConnectionCore,
    authenticator: &mut dyn Authenticator,
) -> EdbResult<()> {
    conn_core.set_state(ConnectionState::Authenticating);

    let params = conn_core.connect_params().clone();
    let mut request = Request::new();
    request.client_handshake(
        PROTOCOL_VERSION.0,
        PROTOCOL_VERSION.1,
        &[
            ("database", params.database()),
            ("user", params.user()),
        ],
    );
    conn_core.send_request(request)?;

    loop {
        match conn_core.read_message()? {
            ServerMessage::ServerHandshake { major, minor } => {
                // the server proposes an alternative version; usable only
                // if it still covers the version this client speaks
                if major != PROTOCOL_VERSION.0 || minor < PROTOCOL_VERSION.1 {
                    return Err(EdbError::VersionMismatch((major, minor)));
                }
                debug!("server proposed protocol version {major}.{minor}");
            }
            ServerMessage::AuthenticationOk => {
                trace!("authentication accepted");
            }
            ServerMessage::AuthenticationSaslRequired { methods } => {
                sasl_exchange(conn_core, authenticator, &methods, &params)?;
            }
            ServerMessage::ServerKeyData { secret } => {
                conn_core.set_server_secret(secret);
            }
            ServerMessage::ParameterStatus { name, value } => {
                trace!("server parameter {name}={value}");
                conn_core.set_server_param(name, value);
            }
            ServerMessage::ReadyForCommand { transaction_status } => {
                conn_core.set_transaction_status(transaction_status);
                debug!("handshake complete");
                return Ok(());
            }
            ServerMessage::ErrorResponse { error } => {
                return Err(EdbError::Authentication {
                    source: Box::new(EdbError::DbError { source: error }),
                });
            }
            message => {
                return Err(EdbError::Protocol(format!(
                    "unexpected message during handshake: {message:?}"
                )));
            }
        }
    }
}

// Runs the SASL conversation with the injected authenticator. The inner
// loop ends when the server either accepts the exchange or rejects it.
fn sasl_exchange(
    conn_core: &mut ConnectionCore,
    authenticator: &mut dyn Authenticator,
    methods: &[String],
    params: &crate::ConnectParams,
) -> EdbResult<()> {
    if !methods.iter().any(|m| m == authenticator.method()) {
        return Err(EdbError::Authentication {
            source: Box::new(EdbError::ImplDetailed(format!(
                "server offers {methods:?}, authenticator speaks {}",
                authenticator.method()
            ))),
        });
    }
    debug!("authenticating with {}", authenticator.method());

    let initial = authenticator.initial_response(params.user(), params.password())?;
    let mut request = Request::new();
    request.sasl_initial_response(authenticator.method(), &initial);
    conn_core.send_request(request)?;

    loop {
        match conn_core.read_message()? {
            ServerMessage::AuthenticationSaslContinue { data } => {
                let response = authenticator.continue_response(&data, params.password())?;
                let mut request = Request::new();
                request.sasl_response(&response);
                conn_core.send_request(request)?;
            }
            ServerMessage::AuthenticationSaslFinal { data } => {
                authenticator.verify_final(&data)?;
            }
            ServerMessage::AuthenticationOk => {
                trace!("SASL exchange complete");
                return Ok(());
            }
            ServerMessage::ErrorResponse { error } => {
                return Err(EdbError::Authentication {
                    source: Box::new(EdbError::DbError { source: error }),
                });
            }
            message => {
                return Err(EdbError::Protocol(format!(
                    "unexpected message during authentication: {message:?}"
                )));
            }
        }
    }
}
