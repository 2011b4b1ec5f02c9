use crate::{EdbError, EdbResult};
use rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;

/// Describes whether and how TLS is to be used.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
pub enum Tls {
    /// Plain TCP connection.
    #[default]
    Off,
    /// TLS with the given server validation policy.
    On(TlsSecurity),
}

/// How far the server certificate is validated when TLS is on.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsSecurity {
    /// No certificate validation at all - dangerous!
    Insecure,
    /// The certificate chain is validated, the host name is not.
    NoHostVerification,
    /// Full validation of chain and host name.
    #[default]
    Strict,
}

impl TlsSecurity {
    pub(crate) fn from_option_value(value: &str) -> EdbResult<TlsSecurity> {
        match value {
            "insecure" => Ok(TlsSecurity::Insecure),
            "no_host_verification" => Ok(TlsSecurity::NoHostVerification),
            "strict" => Ok(TlsSecurity::Strict),
            value => Err(EdbError::conn_params(
                format!("invalid tls_security value {value:?}").into(),
            )),
        }
    }

    pub(crate) fn option_value(self) -> &'static str {
        match self {
            TlsSecurity::Insecure => "insecure",
            TlsSecurity::NoHostVerification => "no_host_verification",
            TlsSecurity::Strict => "strict",
        }
    }
}

// Builds the rustls configuration for the chosen security policy. The
// trust store is either the custom CA from the connection parameters or
// the bundled webpki roots.
pub(crate) fn build_client_config(
    security: TlsSecurity,
    tls_ca: Option<&str>,
) -> EdbResult<ClientConfig> {
    let roots = Arc::new(root_store(tls_ca)?);
    let config = match security {
        TlsSecurity::Strict => ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
        TlsSecurity::NoHostVerification => {
            let inner = WebPkiServerVerifier::builder(roots)
                .build()
                .map_err(|e| EdbError::ImplDetailed(format!("cannot build verifier: {e}")))?;
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoHostVerification { inner }))
                .with_no_client_auth()
        }
        TlsSecurity::Insecure => ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
            .with_no_client_auth(),
    };
    Ok(config)
}

fn root_store(tls_ca: Option<&str>) -> EdbResult<RootCertStore> {
    let mut roots = RootCertStore::empty();
    match tls_ca {
        Some(pem) => {
            let certs = rustls_pemfile::certs(&mut pem.as_bytes())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    EdbError::conn_params(format!("cannot parse tls_ca PEM: {e}").into())
                })?;
            let (added, ignored) = roots.add_parsable_certificates(certs);
            if added == 0 {
                return Err(EdbError::conn_params(
                    "tls_ca contains no usable certificate".into(),
                ));
            }
            if ignored > 0 {
                info!("{ignored} certificates in tls_ca were not accepted");
            }
        }
        None => {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }
    }
    Ok(roots)
}

// Validates the chain through the webpki verifier but tolerates a
// certificate that does not match the host name.
#[derive(Debug)]
struct NoHostVerification {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for NoHostVerification {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(rustls::Error::InvalidCertificate(
                CertificateError::NotValidForName
                | CertificateError::NotValidForNameContext { .. },
            )) => Ok(ServerCertVerified::assertion()),
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

#[derive(Debug)]
struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}
