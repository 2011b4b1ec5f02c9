mod plain_tcp_client;
mod tls_tcp_client;

use crate::{ConnectParams, EdbError, EdbResult};
use plain_tcp_client::PlainTcpClient;
use std::net::TcpStream;
use std::time::{Duration, Instant};
use tls_tcp_client::TlsTcpClient;

// A blocking tcp connection, with or without TLS.
#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
pub(crate) enum TcpClient {
    // A blocking tcp connection without TLS.
    Plain(PlainTcpClient),

    // A blocking tcp connection with TLS.
    Tls(TlsTcpClient),

    // Needed if communication issues made the stream unusable.
    Dead,
}

impl TcpClient {
    // Constructs a tcp connection, with or without TLS, depending on the
    // given connect parameters. The connect timeout also serves as the
    // initial read timeout, until the handshake has completed.
    pub fn try_new(params: ConnectParams) -> EdbResult<Self> {
        let start = Instant::now();
        trace!("TcpClient: Connecting to {:?}", params.addr());

        let mut tcp_conn = if params.is_tls() {
            Self::Tls(TlsTcpClient::try_new(params)?)
        } else {
            Self::Plain(PlainTcpClient::try_new(params)?)
        };
        let connect_timeout = tcp_conn.connect_params().connect_timeout();
        tcp_conn.set_read_timeout(Some(connect_timeout))?;
        tcp_conn.set_write_timeout(Some(connect_timeout))?;
        trace!(
            "Connection of type {} is initialized ({} µs)",
            tcp_conn.s_type(),
            Instant::now().duration_since(start).as_micros(),
        );
        Ok(tcp_conn)
    }

    // Returns a descriptor of the chosen type
    pub fn s_type(&self) -> &'static str {
        match self {
            Self::Plain(_) => "Plain TCP",
            Self::Tls(_) => "TLS TCP",
            Self::Dead => "Physical connection lost",
        }
    }

    pub fn connect_params(&self) -> &ConnectParams {
        match self {
            Self::Plain(client) => client.connect_params(),
            Self::Tls(client) => client.connect_params(),
            Self::Dead => unreachable!("connect_params of a dead connection"),
        }
    }

    pub fn writer(&mut self) -> EdbResult<&mut dyn std::io::Write> {
        match self {
            Self::Plain(client) => Ok(client.writer()),
            Self::Tls(client) => Ok(client.writer()),
            Self::Dead => Err(EdbError::ConnectionClosed),
        }
    }

    pub fn reader(&mut self) -> EdbResult<&mut dyn std::io::Read> {
        match self {
            Self::Plain(client) => Ok(client.reader()),
            Self::Tls(client) => Ok(client.reader()),
            Self::Dead => Err(EdbError::ConnectionClosed),
        }
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> EdbResult<()> {
        match self {
            Self::Plain(client) => Ok(client.set_read_timeout(timeout)?),
            Self::Tls(client) => Ok(client.set_read_timeout(timeout)?),
            Self::Dead => Err(EdbError::ConnectionClosed),
        }
    }

    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> EdbResult<()> {
        match self {
            Self::Plain(client) => Ok(client.set_write_timeout(timeout)?),
            Self::Tls(client) => Ok(client.set_write_timeout(timeout)?),
            Self::Dead => Err(EdbError::ConnectionClosed),
        }
    }

    // A second handle on the underlying socket, for out-of-band shutdown.
    pub fn socket_clone(&self) -> Option<TcpStream> {
        match self {
            Self::Plain(client) => client.socket().try_clone().ok(),
            Self::Tls(client) => client.socket().try_clone().ok(),
            Self::Dead => None,
        }
    }

    pub fn die(&mut self) {
        if !self.has_died() {
            trace!("TcpClient::die()");
            if let Some(socket) = self.socket_clone() {
                socket.shutdown(std::net::Shutdown::Both).ok();
            }
            *self = Self::Dead;
        }
    }

    pub fn has_died(&self) -> bool {
        matches!(*self, Self::Dead)
    }
}
