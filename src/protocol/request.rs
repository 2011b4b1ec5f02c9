//! Assembly of outgoing messages.
//!
//! A `Request` collects one or more framed client messages; a flow appends
//! the messages it needs, always terminated by `Sync`, and hands the
//! accumulated bytes to the connection in a single write.

use crate::protocol::{
    buffer::Writer, message_type::ClientMessageType, Cardinality, OutputFormat,
    ASPECT_DATA_DESCRIPTION,
};
use crate::EdbResult;

#[derive(Debug, Default)]
pub(crate) struct Request {
    writer: Writer,
}

impl Request {
    pub fn new() -> Request {
        Request::default()
    }

    pub fn client_handshake(&mut self, major: u16, minor: u16, params: &[(&str, &str)]) {
        let w = &mut self.writer;
        w.begin_message(ClientMessageType::ClientHandshake.as_u8());
        w.push_u16(major);
        w.push_u16(minor);
        #[allow(clippy::cast_possible_truncation)]
        w.push_u16(params.len() as u16);
        for (key, value) in params {
            w.push_str(key);
            w.push_str(value);
        }
        w.push_u16(0); // no extensions
        w.end_message();
    }

    pub fn sasl_initial_response(&mut self, method: &str, data: &[u8]) {
        let w = &mut self.writer;
        w.begin_message(ClientMessageType::AuthenticationSaslInitialResponse.as_u8());
        w.push_str(method);
        w.push_bytes(data);
        w.end_message();
    }

    pub fn sasl_response(&mut self, data: &[u8]) {
        let w = &mut self.writer;
        w.begin_message(ClientMessageType::AuthenticationSaslResponse.as_u8());
        w.push_bytes(data);
        w.end_message();
    }

    pub fn prepare(&mut self, io_format: OutputFormat, cardinality: Cardinality, query: &str) {
        let w = &mut self.writer;
        w.begin_message(ClientMessageType::Prepare.as_u8());
        w.push_u16(0); // no headers
        w.push_u8(io_format.as_u8());
        w.push_u8(cardinality.as_u8());
        w.push_bytes(b""); // no statement name
        w.push_str(query);
        w.end_message();
    }

    pub fn describe_statement(&mut self) {
        let w = &mut self.writer;
        w.begin_message(ClientMessageType::DescribeStatement.as_u8());
        w.push_u16(0); // no headers
        w.push_u8(ASPECT_DATA_DESCRIPTION);
        w.push_bytes(b""); // no statement name
        w.end_message();
    }

    /// Appends an `Execute` message; `encode_arguments` writes the encoded
    /// argument block into the message body.
    pub fn execute<F>(&mut self, encode_arguments: F) -> EdbResult<()>
    where
        F: FnOnce(&mut Writer) -> EdbResult<()>,
    {
        let w = &mut self.writer;
        w.begin_message(ClientMessageType::Execute.as_u8());
        w.push_u16(0); // no headers
        w.push_bytes(b""); // no statement name
        encode_arguments(w)?;
        w.end_message();
        Ok(())
    }

    pub fn execute_script(&mut self, query: &str) {
        let w = &mut self.writer;
        w.begin_message(ClientMessageType::ExecuteScript.as_u8());
        w.push_u16(0); // no headers
        w.push_str(query);
        w.end_message();
    }

    pub fn sync(&mut self) {
        self.empty_message(ClientMessageType::Sync);
    }

    pub fn flush(&mut self) {
        self.empty_message(ClientMessageType::Flush);
    }

    pub fn terminate(&mut self) {
        self.empty_message(ClientMessageType::Terminate);
    }

    fn empty_message(&mut self, message_type: ClientMessageType) {
        self.writer.begin_message(message_type.as_u8());
        self.writer.end_message();
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_bytes()
    }
}
