use crate::conn::params::connect_params::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_DATABASE, DEFAULT_USER, DEFAULT_WAIT_UNTIL_AVAILABLE,
};
use crate::conn::params::{ConnectParams, Tls, TlsSecurity};
use crate::{EdbError, EdbResult, DEFAULT_PORT};
use secstr::SecUtf8;
use std::time::Duration;

/// A builder for [`ConnectParams`].
///
/// ```rust,no_run
/// use edbconnect::ConnectParams;
/// let connect_params = ConnectParams::builder()
///     .hostname("the_host")
///     .database("tournament")
///     .user("my_user")
///     .password("my_passwd")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConnectParamsBuilder {
    hostname: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    user: Option<String>,
    password: Option<SecUtf8>,
    tls: Tls,
    tls_ca: Option<String>,
    wait_until_available: Option<Duration>,
    connect_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
}

impl ConnectParamsBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hostname.
    pub fn hostname<H: AsRef<str>>(&mut self, hostname: H) -> &mut Self {
        self.hostname = Some(hostname.as_ref().to_owned());
        self
    }

    /// Sets the port.
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Sets the database name.
    pub fn database<D: AsRef<str>>(&mut self, database: D) -> &mut Self {
        self.database = Some(database.as_ref().to_owned());
        self
    }

    /// Sets the database user.
    pub fn user<U: AsRef<str>>(&mut self, user: U) -> &mut Self {
        self.user = Some(user.as_ref().to_owned());
        self
    }

    /// Sets the password.
    pub fn password<P: AsRef<str>>(&mut self, password: P) -> &mut Self {
        self.password = Some(SecUtf8::from(password.as_ref()));
        self
    }

    /// Enables TLS with the given validation policy.
    pub fn tls_with(&mut self, security: TlsSecurity) -> &mut Self {
        self.tls = Tls::On(security);
        self
    }

    /// Sets the CA certificate (PEM) against which the server certificate
    /// is validated; implies TLS with strict validation unless another
    /// policy was chosen.
    pub fn tls_ca<C: AsRef<str>>(&mut self, pem: C) -> &mut Self {
        if matches!(self.tls, Tls::Off) {
            self.tls = Tls::On(TlsSecurity::Strict);
        }
        self.tls_ca = Some(pem.as_ref().to_owned());
        self
    }

    /// How long connect attempts are retried while the server is not
    /// reachable yet.
    pub fn wait_until_available_ms(&mut self, millis: u64) -> &mut Self {
        self.wait_until_available = Some(Duration::from_millis(millis));
        self
    }

    /// The timeout of a single connect attempt.
    pub fn connect_timeout_ms(&mut self, millis: u64) -> &mut Self {
        self.connect_timeout = Some(Duration::from_millis(millis));
        self
    }

    /// The read/write deadline applied to every flow.
    pub fn command_timeout_ms(&mut self, millis: u64) -> &mut Self {
        self.command_timeout = Some(Duration::from_millis(millis));
        self
    }

    /// Constructs the `ConnectParams`.
    pub fn build(&self) -> EdbResult<ConnectParams> {
        let host = self
            .hostname
            .clone()
            .ok_or_else(|| EdbError::conn_params("hostname is missing".into()))?;
        Ok(ConnectParams::new(
            host,
            self.port.unwrap_or(DEFAULT_PORT),
            self.database
                .clone()
                .unwrap_or_else(|| DEFAULT_DATABASE.to_owned()),
            self.user.clone().unwrap_or_else(|| DEFAULT_USER.to_owned()),
            self.password.clone().unwrap_or_else(|| SecUtf8::from("")),
            self.tls.clone(),
            self.tls_ca.clone(),
            self.wait_until_available
                .unwrap_or(DEFAULT_WAIT_UNTIL_AVAILABLE),
            self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            self.command_timeout,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectParamsBuilder;

    #[test]
    fn defaults_are_applied() {
        let params = ConnectParamsBuilder::new()
            .hostname("localhost")
            .build()
            .unwrap();
        assert_eq!(params.addr(), "localhost:5656");
        assert_eq!(params.database(), "edgedb");
        assert_eq!(params.user(), "edgedb");
        assert!(!params.is_tls());
    }

    #[test]
    fn missing_hostname_is_an_error() {
        assert!(ConnectParamsBuilder::new().build().is_err());
    }
}
