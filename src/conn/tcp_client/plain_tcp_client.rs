use crate::{ConnectParams, EdbError, EdbResult};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

#[derive(Debug)]
pub(crate) struct PlainTcpClient {
    params: ConnectParams,
    reader: TcpStream,
    writer: TcpStream,
}

impl PlainTcpClient {
    // Returns an initialized plain tcp connection
    pub fn try_new(params: ConnectParams) -> EdbResult<Self> {
        let tcpstream = connect_with_timeout(params.addr(), params.connect_timeout())?;
        Ok(Self {
            writer: tcpstream.try_clone().map_err(EdbError::from)?,
            reader: tcpstream,
            params,
        })
    }

    pub fn connect_params(&self) -> &ConnectParams {
        &self.params
    }

    pub fn socket(&self) -> &TcpStream {
        &self.reader
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.reader.set_read_timeout(timeout)
    }

    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.writer.set_write_timeout(timeout)
    }

    pub fn writer(&mut self) -> &mut TcpStream {
        &mut self.writer
    }

    pub fn reader(&mut self) -> &mut TcpStream {
        &mut self.reader
    }
}

pub(crate) fn connect_with_timeout(addr: &str, timeout: Duration) -> EdbResult<TcpStream> {
    let socket_addr = addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| EdbError::conn_params(format!("cannot resolve {addr:?}").into()))?;
    Ok(TcpStream::connect_timeout(&socket_addr, timeout)?)
}
