use crate::conn::{handshake, Authenticator, CancelState, ConnectionState, TcpClient};
use crate::protocol::codecs::CodecRegistry;
use crate::protocol::reply::ServerMessage;
use crate::protocol::request::Request;
use crate::protocol::TransactionStatus;
use crate::{ConnectParams, EdbError, EdbResult};
use byteorder::{BigEndian, ReadBytesExt};
use debug_ignore::DebugIgnore;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug)]
pub(crate) struct ConnectionCore {
    state: ConnectionState,
    tcp_client: TcpClient,
    server_params: HashMap<String, String>,
    server_secret: DebugIgnore<Option<Vec<u8>>>,
    registry: CodecRegistry,
    cancel_state: Arc<CancelState>,
}

impl ConnectionCore {
    /// Establishes the transport and performs the handshake.
    ///
    /// Connect attempts are retried until `wait_until_available` elapses,
    /// so a server that is still starting up does not fail the caller.
    pub fn try_new(
        params: ConnectParams,
        authenticator: &mut dyn Authenticator,
    ) -> EdbResult<Self> {
        let deadline = Instant::now() + params.wait_until_available();
        let tcp_client = loop {
            match TcpClient::try_new(params.clone()) {
                Ok(tcp_client) => break tcp_client,
                Err(EdbError::Io { source }) if is_retryable(&source) => {
                    if Instant::now() >= deadline {
                        return Err(EdbError::Io { source });
                    }
                    trace!("server not available yet ({source}), retrying");
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => return Err(e),
            }
        };

        let cancel_state = Arc::new(CancelState::default());
        cancel_state.arm(tcp_client.socket_clone());

        let mut conn_core = Self {
            state: ConnectionState::Unconnected,
            tcp_client,
            server_params: HashMap::new(),
            server_secret: DebugIgnore(None),
            registry: CodecRegistry::default(),
            cancel_state,
        };

        if let Err(e) = handshake::establish(&mut conn_core, authenticator) {
            conn_core.abandon();
            return Err(e);
        }

        // from now on flows run under the command deadline
        let command_timeout = conn_core.connect_params().command_timeout();
        conn_core.tcp_client.set_read_timeout(command_timeout)?;
        conn_core.tcp_client.set_write_timeout(command_timeout)?;
        Ok(conn_core)
    }

    pub fn connect_params(&self) -> &ConnectParams {
        self.tcp_client.connect_params()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        if state != self.state {
            trace!("connection state {:?} -> {state:?}", self.state);
            self.state = state;
        }
    }

    pub fn set_transaction_status(&mut self, status: TransactionStatus) {
        self.set_state(ConnectionState::from(status));
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CodecRegistry {
        &mut self.registry
    }

    pub fn cancel_state(&self) -> Arc<CancelState> {
        Arc::clone(&self.cancel_state)
    }

    pub fn set_server_param(&mut self, name: String, value: String) {
        self.server_params.insert(name, value);
    }

    pub fn server_param(&self, name: &str) -> Option<&str> {
        self.server_params.get(name).map(String::as_str)
    }

    pub fn set_server_secret(&mut self, secret: Vec<u8>) {
        self.server_secret = DebugIgnore(Some(secret));
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Marks the connection dead without notifying the server.
    pub fn abandon(&mut self) {
        self.tcp_client.die();
        self.set_state(ConnectionState::Closed);
    }

    // Converts a transport error into the error the caller should see and
    // closes the connection; every transport problem is fatal.
    fn transport_error(&mut self, error: EdbError) -> EdbError {
        let error = match error {
            EdbError::Io { source } if self.cancel_state.is_cancelled() => {
                trace!("transport error after cancellation: {source}");
                EdbError::Cancelled
            }
            EdbError::Io { source }
                if matches!(
                    source.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                EdbError::Timeout
            }
            error => error,
        };
        self.abandon();
        error
    }

    /// Writes one assembled request to the transport.
    pub fn send_request(&mut self, request: Request) -> EdbResult<()> {
        let bytes = request.into_bytes();
        trace!("sending {} request bytes", bytes.len());
        let result = (|| -> EdbResult<()> {
            let w = self.tcp_client.writer()?;
            w.write_all(&bytes)?;
            w.flush()?;
            Ok(())
        })();
        result.map_err(|e| self.transport_error(e))
    }

    /// Reads and parses one framed message from the transport.
    pub fn read_message(&mut self) -> EdbResult<ServerMessage> {
        let frame = (|| -> EdbResult<(u8, Vec<u8>)> {
            let rdr = self.tcp_client.reader()?;
            let tag = rdr.read_u8()?;
            let len = rdr.read_u32::<BigEndian>()?;
            if len < 4 {
                return Err(EdbError::Protocol(format!(
                    "message length {len} is shorter than the length field itself"
                )));
            }
            let mut body = vec![0_u8; (len - 4) as usize];
            rdr.read_exact(&mut body)?;
            Ok((tag, body))
        })();
        let (tag, body) = frame.map_err(|e| self.transport_error(e))?;

        match ServerMessage::parse(tag, &body) {
            Ok(message) => {
                trace!("received {message:?}");
                Ok(message)
            }
            // a message we cannot parse leaves the stream unusable
            Err(e) => Err(self.transport_error(e)),
        }
    }

    /// Sends `Terminate` (fire and forget) and closes the transport.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        debug!("closing the connection");
        let mut request = Request::new();
        request.terminate();
        self.send_request(request).ok();
        self.abandon();
    }
}

impl Drop for ConnectionCore {
    // try to send a Terminate to the server, ignore all errors
    fn drop(&mut self) {
        trace!("Drop of ConnectionCore");
        if !self.is_closed() {
            self.close();
        }
    }
}

fn is_retryable(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::WouldBlock
    )
}
