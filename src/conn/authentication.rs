mod authenticator;
mod crypto_util;
mod scram_sha256;

pub use authenticator::Authenticator;
pub(crate) use scram_sha256::ScramSha256;
