use crate::conn::{flow, Authenticator, CancelHandle, ConnectionCore, ConnectionState, ScramSha256};
use crate::protocol::value::QueryArgs;
use crate::protocol::{Cardinality, OutputFormat};
use crate::rows::RowSink;
use crate::transaction::Transaction;
use crate::{EdbResult, IntoConnectParams};

/// A blocking connection to the database.
///
/// All commands on a connection run strictly one after the other; a flow
/// occupies the connection from its first request byte until the server's
/// terminating `ReadyForCommand`.
///
/// # Example
///
/// ```rust,no_run
/// use edbconnect::Connection;
/// let mut connection = Connection::connect("edgedb://edgedb@localhost:5656/edgedb").unwrap();
/// ```
#[derive(Debug)]
pub struct Connection {
    conn_core: ConnectionCore,
}

impl Connection {
    /// Connects and authenticates with the default (SCRAM-SHA-256)
    /// authenticator.
    ///
    /// # Errors
    ///
    /// Several variants of `EdbError` can occur.
    pub fn connect<P: IntoConnectParams>(params: P) -> EdbResult<Connection> {
        let mut authenticator = ScramSha256::boxed_authenticator();
        Self::connect_with_authenticator(params, &mut *authenticator)
    }

    /// Connects and authenticates with a caller-supplied authenticator.
    ///
    /// The authenticator is only invoked if the server demands SASL
    /// authentication.
    pub fn connect_with_authenticator<P: IntoConnectParams>(
        params: P,
        authenticator: &mut dyn Authenticator,
    ) -> EdbResult<Connection> {
        let params = params.into_connect_params()?;
        debug!("connecting to {params}");
        Ok(Connection {
            conn_core: ConnectionCore::try_new(params, authenticator)?,
        })
    }

    /// Executes an EdgeQL script (one or more commands, no arguments, no
    /// results).
    ///
    /// # Errors
    ///
    /// Several variants of `EdbError` can occur.
    pub fn execute_script(&mut self, query: &str) -> EdbResult<()> {
        flow::execute_script(&mut self.conn_core, query)
    }

    /// Executes a typed query.
    ///
    /// Arguments are encoded with the server-described argument codec;
    /// every result row is decoded and appended to `sink`. The declared
    /// `cardinality` is enforced against the rows that actually arrive.
    ///
    /// # Errors
    ///
    /// Several variants of `EdbError` can occur.
    pub fn query(
        &mut self,
        query: &str,
        args: &QueryArgs,
        sink: &mut dyn RowSink,
        cardinality: Cardinality,
        format: OutputFormat,
    ) -> EdbResult<()> {
        flow::query(&mut self.conn_core, query, args, sink, cardinality, format)
    }

    /// Starts an explicit transaction.
    ///
    /// The returned [`Transaction`] borrows the connection exclusively;
    /// queries go through the transaction object until it is committed or
    /// rolled back.
    pub fn begin_transaction(&mut self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Sends `Terminate` and closes the connection.
    ///
    /// `Terminate` is fire-and-forget, no reply is expected. Every
    /// operation after `close` fails with a closed-connection error.
    pub fn close(&mut self) -> EdbResult<()> {
        self.conn_core.close();
        Ok(())
    }

    /// A handle that cancels the currently running flow from another
    /// thread, closing the connection.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(self.conn_core.cancel_state())
    }

    /// The current connection state.
    pub fn state(&self) -> ConnectionState {
        self.conn_core.state()
    }

    /// A parameter the server announced during the handshake.
    pub fn server_parameter(&self, name: &str) -> Option<&str> {
        self.conn_core.server_param(name)
    }

    /// The parameters this connection was built from.
    pub fn connect_params(&self) -> &crate::ConnectParams {
        self.conn_core.connect_params()
    }
}
