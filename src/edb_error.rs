use crate::protocol::server_error::ServerError;
use thiserror::Error;

/// A list specifying categories of [`EdbError`](crate::EdbError).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EdbError {
    /// Erroneous connection parameters, e.g. from a malformed connection URL.
    #[error("Erroneous connection parameters")]
    ConnParams {
        /// The causing Error.
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Database server responded with an error;
    /// the contained `ServerError` describes the concrete reason.
    #[error("Database server responded with an error")]
    DbError {
        /// The causing Error.
        #[from]
        source: ServerError,
    },

    /// The inbound byte stream violated the wire protocol
    /// (broken framing, unknown message tag, malformed message body).
    #[error("Protocol violation: {}", _0)]
    Protocol(String),

    /// The server proposed a protocol version this client cannot speak.
    #[error("Unsupported protocol version {0:?} proposed by the server")]
    VersionMismatch((u16, u16)),

    /// The server rejected the authentication exchange, or the exchange
    /// itself could not be completed.
    #[error("Authentication failed")]
    Authentication {
        /// The causing Error.
        source: Box<EdbError>,
    },

    /// A supplied value does not match the type expected by a codec, or a
    /// result sink rejected a decoded value.
    #[error("Type mismatch: {}", _0)]
    TypeMismatch(String),

    /// The query produced a number of rows that is not allowed by the
    /// requested cardinality.
    #[error("Cardinality violation: {}", _0)]
    Cardinality(String),

    /// Error occured in communication with the database.
    #[error(transparent)]
    Io {
        /// The causing Error.
        #[from]
        source: std::io::Error,
    },

    /// TLS set up failed because the server name was not valid.
    #[error("TLS setup failed because the server name was not valid")]
    TlsServerName,

    /// TLS protocol error.
    #[error(
        "TLS set up failed, after setting up the TCP connection; is the database prepared for TLS?"
    )]
    TlsProtocol {
        /// The causing Error.
        #[from]
        source: rustls::Error,
    },

    /// A read or write deadline expired; the connection is closed.
    #[error("Operation timed out")]
    Timeout,

    /// The flow was cancelled through a [`CancelHandle`](crate::CancelHandle);
    /// the connection is closed.
    #[error("Operation was cancelled")]
    Cancelled,

    /// The connection was closed; it cannot be used anymore.
    #[error("Connection is closed")]
    ConnectionClosed,

    /// Implementation error.
    #[error("Implementation error: {}", _0)]
    Impl(&'static str),

    /// Implementation error.
    #[error("Implementation error: {}", _0)]
    ImplDetailed(String),

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    Usage(&'static str),

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    UsageDetailed(String),
}

/// Abbreviation of `Result<T, EdbError>`.
pub type EdbResult<T> = std::result::Result<T, EdbError>;

impl EdbError {
    /// Returns the contained `ServerError`, if any.
    ///
    /// This method helps in case you need programmatic access to e.g. the
    /// error code the server sent.
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Self::DbError {
                source: server_error,
            } => Some(server_error),
            _ => None,
        }
    }

    /// Reveal the inner error.
    pub fn inner(&self) -> Option<&dyn std::error::Error> {
        match self {
            Self::ConnParams { source } => Some(&**source),
            Self::DbError { source } => Some(source),
            Self::Authentication { source } => Some(&**source),
            Self::TlsProtocol { source } => Some(source),
            Self::Io { source } => Some(source),
            _ => None,
        }
    }

    pub(crate) fn conn_params(error: Box<dyn std::error::Error + Send + Sync + 'static>) -> Self {
        Self::ConnParams { source: error }
    }

    // Fatal errors close the connection; recoverable ones leave it usable
    // once the current flow has drained its terminating ReadyForCommand.
    pub(crate) fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Protocol(_)
                | Self::VersionMismatch(_)
                | Self::Io { .. }
                | Self::TlsProtocol { .. }
                | Self::TlsServerName
                | Self::Timeout
                | Self::Cancelled
                | Self::ConnectionClosed
        )
    }
}
