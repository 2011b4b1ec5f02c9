use crate::EdbResult;
use secstr::SecUtf8;

/// Drives one SASL exchange during the connection handshake.
///
/// The handshake invokes the authenticator only when the server demands
/// SASL authentication; servers that skip authentication never touch it.
/// The default implementation speaks SCRAM-SHA-256; alternative mechanisms
/// can be injected through
/// [`Connection::connect_with_authenticator`](crate::Connection::connect_with_authenticator).
pub trait Authenticator: std::fmt::Debug + Send {
    /// The SASL mechanism name this authenticator implements.
    fn method(&self) -> &str;

    /// Produces the payload of `AuthenticationSASLInitialResponse`.
    fn initial_response(&mut self, user: &str, password: &SecUtf8) -> EdbResult<Vec<u8>>;

    /// Produces the payload of `AuthenticationSASLResponse` for a server
    /// challenge.
    fn continue_response(&mut self, challenge: &[u8], password: &SecUtf8) -> EdbResult<Vec<u8>>;

    /// Verifies the server's final SASL message.
    fn verify_final(&self, data: &[u8]) -> EdbResult<()>;
}
