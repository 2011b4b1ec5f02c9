use crate::conn::tcp_client::plain_tcp_client::connect_with_timeout;
use crate::{ConnectParams, EdbError, EdbResult};
use rustls::pki_types::ServerName;
use rustls::{ClientConnection, StreamOwned};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

pub(crate) struct TlsTcpClient {
    params: ConnectParams,
    tls_stream: StreamOwned<ClientConnection, TcpStream>,
}
impl std::fmt::Debug for TlsTcpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "TlsTcpClient {{params: {:?}, ... }}", &self.params)
    }
}
impl TlsTcpClient {
    pub fn try_new(params: ConnectParams) -> EdbResult<Self> {
        Ok(Self {
            tls_stream: try_new_tls_stream(&params)?,
            params,
        })
    }

    pub fn connect_params(&self) -> &ConnectParams {
        &self.params
    }

    pub fn socket(&self) -> &TcpStream {
        &self.tls_stream.sock
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.tls_stream.sock.set_read_timeout(timeout)
    }

    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.tls_stream.sock.set_write_timeout(timeout)
    }

    pub fn writer(&mut self) -> &mut dyn std::io::Write {
        &mut self.tls_stream
    }

    pub fn reader(&mut self) -> &mut dyn std::io::Read {
        &mut self.tls_stream
    }
}

fn try_new_tls_stream(
    params: &ConnectParams,
) -> EdbResult<StreamOwned<ClientConnection, TcpStream>> {
    let a_client_config = Arc::new(params.rustls_clientconfig()?);
    let server_name = ServerName::try_from(params.host().to_owned())
        .map_err(|_| EdbError::TlsServerName)?;
    let client_connection = ClientConnection::new(a_client_config, server_name)?;
    debug!("ClientConnection: {client_connection:?}");

    debug!("Connecting to {:?}", params.addr());
    let tcpstream = connect_with_timeout(params.addr(), params.connect_timeout())?;
    trace!("tcpstream working");

    Ok(StreamOwned::new(client_connection, tcpstream))
}
