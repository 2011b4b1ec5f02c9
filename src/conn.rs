mod authentication;
mod cancellation;
mod connection;
mod connection_core;
mod flow;
mod handshake;
mod params;
mod session_state;
mod tcp_client;

pub use authentication::Authenticator;
pub use cancellation::CancelHandle;
pub use connection::Connection;
pub use params::{ConnectParams, ConnectParamsBuilder, IntoConnectParams, Tls, TlsSecurity};
pub use session_state::ConnectionState;

pub(crate) use authentication::ScramSha256;
pub(crate) use cancellation::CancelState;
pub(crate) use connection_core::ConnectionCore;
pub(crate) use tcp_client::TcpClient;
