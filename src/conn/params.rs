mod connect_params;
mod connect_params_builder;
mod cp_url;
mod tls;

pub use connect_params::{ConnectParams, IntoConnectParams};
pub use connect_params_builder::ConnectParamsBuilder;
pub use tls::{Tls, TlsSecurity};
