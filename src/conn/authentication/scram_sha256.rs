//! SCRAM-SHA-256 (RFC 5802 / RFC 7677) over the SASL messages of the
//! handshake.

use crate::conn::authentication::{crypto_util, Authenticator};
use crate::{EdbError, EdbResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::{thread_rng, RngCore};
use secstr::SecUtf8;
use std::time::Instant;

const MECHANISM: &str = "SCRAM-SHA-256";
const GS2_HEADER: &str = "n,,";
const CHANNEL_BINDING: &str = "c=biws"; // base64("n,,")
const MIN_ITERATIONS: u32 = 4096;

#[derive(Debug, Default)]
pub(crate) struct ScramSha256 {
    client_nonce: String,
    client_first_bare: Option<String>,
    server_signature: Option<Vec<u8>>,
}

impl ScramSha256 {
    pub fn boxed_authenticator() -> Box<dyn Authenticator + Send + Sync> {
        let mut nonce = [0_u8; 18];
        let mut rng = thread_rng();
        rng.fill_bytes(&mut nonce);
        Box::new(Self {
            client_nonce: BASE64.encode(nonce),
            client_first_bare: None,
            server_signature: None,
        })
    }

    #[cfg(test)]
    fn with_nonce(nonce: &str) -> Self {
        Self {
            client_nonce: nonce.to_string(),
            client_first_bare: None,
            server_signature: None,
        }
    }
}

impl Authenticator for ScramSha256 {
    fn method(&self) -> &str {
        MECHANISM
    }

    fn initial_response(&mut self, user: &str, _password: &SecUtf8) -> EdbResult<Vec<u8>> {
        let bare = format!("n={},r={}", saslprep_name(user), self.client_nonce);
        let message = format!("{GS2_HEADER}{bare}");
        self.client_first_bare = Some(bare);
        Ok(message.into_bytes())
    }

    fn continue_response(&mut self, challenge: &[u8], password: &SecUtf8) -> EdbResult<Vec<u8>> {
        let client_first_bare = self
            .client_first_bare
            .take()
            .ok_or_else(|| auth_error("server challenge before the initial response"))?;
        let server_first = std::str::from_utf8(challenge)
            .map_err(|_| auth_error("server challenge is not UTF-8"))?;
        let (server_nonce, salt, iterations) = parse_server_first(server_first)?;
        if !server_nonce.starts_with(&self.client_nonce) {
            return Err(auth_error("server nonce does not extend the client nonce"));
        }

        let start = Instant::now();
        let salted_password =
            crypto_util::use_pbkdf2(password.unsecure().as_bytes(), &salt, iterations);
        debug!(
            "pbkdf2 took {} µs",
            Instant::now().duration_since(start).as_micros(),
        );

        let client_key = hmac(&salted_password, b"Client Key")?;
        let stored_key = crypto_util::sha256(&client_key);
        let client_final_bare = format!("{CHANNEL_BINDING},r={server_nonce}");
        let auth_message = format!("{client_first_bare},{server_first},{client_final_bare}");
        let client_signature = hmac(&stored_key, auth_message.as_bytes())?;
        let client_proof = crypto_util::xor(&client_key, &client_signature);

        let server_key = hmac(&salted_password, b"Server Key")?;
        self.server_signature = Some(hmac(&server_key, auth_message.as_bytes())?);

        Ok(format!("{client_final_bare},p={}", BASE64.encode(client_proof)).into_bytes())
    }

    fn verify_final(&self, data: &[u8]) -> EdbResult<()> {
        let message =
            std::str::from_utf8(data).map_err(|_| auth_error("final message is not UTF-8"))?;
        let signature = message
            .strip_prefix("v=")
            .ok_or_else(|| auth_error("final message carries no server signature"))?;
        let signature = BASE64
            .decode(signature.trim_end())
            .map_err(|_| auth_error("server signature is not valid base64"))?;

        match self.server_signature {
            Some(ref expected) if *expected == signature => Ok(()),
            _ => {
                let msg = "SCRAM: server signature mismatch - \
                           this indicates a severe security issue with the server's identity!";
                warn!("{}", msg);
                Err(auth_error(msg))
            }
        }
    }
}

fn hmac(key: &[u8], data: &[u8]) -> EdbResult<Vec<u8>> {
    crypto_util::hmac_sha256(key, data).map_err(|_| EdbError::Impl("crypto_common::InvalidLength"))
}

fn auth_error(detail: &str) -> EdbError {
    EdbError::Authentication {
        source: Box::new(EdbError::ImplDetailed(detail.to_string())),
    }
}

// server-first-message: r=<nonce>,s=<salt base64>,i=<iterations>
fn parse_server_first(message: &str) -> EdbResult<(String, Vec<u8>, u32)> {
    let mut nonce = None;
    let mut salt = None;
    let mut iterations = None;
    for part in message.split(',') {
        match part.split_once('=') {
            Some(("r", value)) => nonce = Some(value.to_string()),
            Some(("s", value)) => {
                salt = Some(
                    BASE64
                        .decode(value)
                        .map_err(|_| auth_error("salt is not valid base64"))?,
                );
            }
            Some(("i", value)) => {
                iterations = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| auth_error("iteration count is not a number"))?,
                );
            }
            _ => {} // extensions are allowed and ignored
        }
    }
    match (nonce, salt, iterations) {
        (Some(nonce), Some(salt), Some(iterations)) => {
            if iterations < MIN_ITERATIONS {
                return Err(auth_error("iteration count is too small"));
            }
            if salt.is_empty() {
                return Err(auth_error("salt is empty"));
            }
            Ok((nonce, salt, iterations))
        }
        _ => Err(auth_error("incomplete server challenge")),
    }
}

// RFC 5802 username escaping.
fn saslprep_name(user: &str) -> String {
    user.replace('=', "=3D").replace(',', "=2C")
}
