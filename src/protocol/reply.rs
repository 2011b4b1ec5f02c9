//! Parsing of inbound messages.
//!
//! The connection reads one frame (tag plus length-prefixed body) at a time
//! and hands it to [`ServerMessage::parse`], which fully consumes the body.
//! Unknown tags and malformed bodies are protocol violations and fatal for
//! the connection.

use crate::protocol::{
    buffer::Reader,
    message_type::ServerMessageType,
    server_error::{ServerError, Severity},
    TransactionStatus,
};
use crate::{EdbError, EdbResult};
use uuid::Uuid;

#[derive(Debug)]
pub(crate) enum ServerMessage {
    ServerHandshake {
        major: u16,
        minor: u16,
    },
    AuthenticationOk,
    AuthenticationSaslRequired {
        methods: Vec<String>,
    },
    AuthenticationSaslContinue {
        data: Vec<u8>,
    },
    AuthenticationSaslFinal {
        data: Vec<u8>,
    },
    ServerKeyData {
        secret: Vec<u8>,
    },
    ParameterStatus {
        name: String,
        value: String,
    },
    PrepareComplete {
        input_id: Uuid,
        output_id: Uuid,
    },
    CommandDataDescription {
        input_id: Uuid,
        input_descriptor: Vec<u8>,
        output_id: Uuid,
        output_descriptor: Vec<u8>,
    },
    /// Carries exactly one codec-encoded result row.
    Data {
        row: Vec<u8>,
    },
    CommandComplete {
        status: String,
    },
    ReadyForCommand {
        transaction_status: TransactionStatus,
    },
    ErrorResponse {
        error: ServerError,
    },
    /// Already routed to the `log` facade during parsing.
    LogMessage,
}

impl ServerMessage {
    pub(crate) fn parse(tag: u8, body: &[u8]) -> EdbResult<ServerMessage> {
        let mut rdr = Reader::new(body);
        let message = match ServerMessageType::from_u8(tag)? {
            ServerMessageType::ServerHandshake => parse_server_handshake(&mut rdr)?,
            ServerMessageType::Authentication => parse_authentication(&mut rdr)?,
            ServerMessageType::ServerKeyData => {
                let secret = body.to_vec();
                rdr.advance(secret.len())?;
                ServerMessage::ServerKeyData { secret }
            }
            ServerMessageType::ParameterStatus => ServerMessage::ParameterStatus {
                name: rdr.pop_str()?.to_string(),
                value: rdr.pop_str()?.to_string(),
            },
            ServerMessageType::PrepareComplete => {
                skip_headers(&mut rdr)?;
                rdr.pop_u8()?; // cardinality as inferred by the server
                ServerMessage::PrepareComplete {
                    input_id: rdr.pop_uuid()?,
                    output_id: rdr.pop_uuid()?,
                }
            }
            ServerMessageType::CommandDataDescription => {
                skip_headers(&mut rdr)?;
                rdr.pop_u8()?; // result cardinality
                ServerMessage::CommandDataDescription {
                    input_id: rdr.pop_uuid()?,
                    input_descriptor: rdr.pop_bytes()?.to_vec(),
                    output_id: rdr.pop_uuid()?,
                    output_descriptor: rdr.pop_bytes()?.to_vec(),
                }
            }
            ServerMessageType::Data => {
                let num_elements = rdr.pop_u16()?;
                if num_elements != 1 {
                    return Err(EdbError::Protocol(format!(
                        "Data message with {num_elements} elements, expected exactly 1"
                    )));
                }
                let row = body[2..].to_vec();
                rdr.advance(row.len())?;
                ServerMessage::Data { row }
            }
            ServerMessageType::CommandComplete => {
                skip_headers(&mut rdr)?;
                ServerMessage::CommandComplete {
                    status: rdr.pop_str()?.to_string(),
                }
            }
            ServerMessageType::ReadyForCommand => {
                skip_headers(&mut rdr)?;
                ServerMessage::ReadyForCommand {
                    transaction_status: TransactionStatus::from_u8(rdr.pop_u8()?)?,
                }
            }
            ServerMessageType::ErrorResponse => {
                let severity = Severity::from_u8(rdr.pop_u8()?);
                let code = rdr.pop_u32()?;
                let message = rdr.pop_str()?.to_string();
                let attributes = parse_attributes(&mut rdr)?;
                ServerMessage::ErrorResponse {
                    error: ServerError::new(severity, code, message, attributes),
                }
            }
            ServerMessageType::LogMessage => {
                let severity = rdr.pop_u8()?;
                let code = rdr.pop_u32()?;
                let text = rdr.pop_str()?.to_string();
                parse_attributes(&mut rdr)?;
                route_log_message(severity, code, &text);
                ServerMessage::LogMessage
            }
        };
        rdr.expect_end()?;
        Ok(message)
    }
}

fn parse_server_handshake(rdr: &mut Reader) -> EdbResult<ServerMessage> {
    let major = rdr.pop_u16()?;
    let minor = rdr.pop_u16()?;
    let num_extensions = rdr.pop_u16()?;
    for _ in 0..num_extensions {
        rdr.pop_str()?; // extension name
        skip_headers(rdr)?;
    }
    Ok(ServerMessage::ServerHandshake { major, minor })
}

// Authentication status values from the protocol: 0 = OK, 0x0a = SASL
// required, 0x0b = SASL continue, 0x0c = SASL final.
fn parse_authentication(rdr: &mut Reader) -> EdbResult<ServerMessage> {
    let status = rdr.pop_u32()?;
    match status {
        0x0 => Ok(ServerMessage::AuthenticationOk),
        0x0a => {
            let num_methods = rdr.pop_u32()?;
            let mut methods = Vec::with_capacity(num_methods as usize);
            for _ in 0..num_methods {
                methods.push(rdr.pop_str()?.to_string());
            }
            Ok(ServerMessage::AuthenticationSaslRequired { methods })
        }
        0x0b => Ok(ServerMessage::AuthenticationSaslContinue {
            data: rdr.pop_bytes()?.to_vec(),
        }),
        0x0c => Ok(ServerMessage::AuthenticationSaslFinal {
            data: rdr.pop_bytes()?.to_vec(),
        }),
        status => Err(EdbError::Protocol(format!(
            "unknown authentication status 0x{status:x}"
        ))),
    }
}

// Headers are pairs of a u16 code and a length-prefixed value. None of the
// currently defined header codes is relevant for this client.
fn skip_headers(rdr: &mut Reader) -> EdbResult<()> {
    let num_headers = rdr.pop_u16()?;
    for _ in 0..num_headers {
        rdr.pop_u16()?;
        rdr.pop_bytes()?;
    }
    Ok(())
}

fn parse_attributes(rdr: &mut Reader) -> EdbResult<Vec<(u16, String)>> {
    let num_attributes = rdr.pop_u16()?;
    let mut attributes = Vec::with_capacity(num_attributes as usize);
    for _ in 0..num_attributes {
        let code = rdr.pop_u16()?;
        let value = rdr.pop_str()?.to_string();
        attributes.push((code, value));
    }
    Ok(attributes)
}

// LogMessage severities: 20 = debug, 40 = info, 60 = notice, 80 = warning.
fn route_log_message(severity: u8, code: u32, text: &str) {
    match severity {
        20 => debug!("server: {text} (code 0x{code:08x})"),
        40 | 60 => info!("server: {text} (code 0x{code:08x})"),
        _ => warn!("server: {text} (code 0x{code:08x})"),
    }
}
