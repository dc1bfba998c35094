//! EAP-TLS session state (experimental)
//!
//! Drives a TLS 1.2 client handshake over EAP-TLS fragments carried in NAS
//! Authentication Request messages. The TLS engine is `rustls` operated in
//! memory: received fragment bytes are fed with `read_tls`, produced
//! handshake bytes are drained with `write_tls`. On completion 128 bytes of
//! keying material are exported with the label `"client EAP encryption"`;
//! the KAUSF slice taken from it is an implementation choice, not normative
//! 3GPP behaviour.
//!
//! Peer verification checks the certificate chain against the configured CA
//! bundle. EAP-TLS carries no server hostname, so name mismatches against
//! the placeholder SNI are tolerated; every other certificate error is
//! fatal. The client private key may be an encrypted PKCS#8 file; the
//! passphrase callback is consulted only when the key file actually asks
//! for one.
//!
//! All TLS resources live inside the session value, so dropping it releases
//! them on every exit path.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore,
    SignatureScheme,
};
use thiserror::Error;
use tracing::debug;

use uecore_common::config::UeConfig;

/// Label for the EAP-TLS exported keying material (RFC 5216 Section 2.3)
const EKM_LABEL: &[u8] = b"client EAP encryption";

/// Size of the exported keying material block
pub const EKM_SIZE: usize = 128;

/// Errors raised while establishing or driving an EAP-TLS session.
#[derive(Debug, Error)]
pub enum EapTlsError {
    /// A required configuration option is missing
    #[error("missing EAP-TLS configuration option: {0}")]
    MissingConfig(&'static str),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Private key file could not be parsed
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    /// Private key is encrypted and no passphrase was supplied
    #[error("private key is encrypted but no passphrase is configured")]
    PassphraseRequired,
    /// Certificate verifier construction failed
    #[error("verifier error: {0}")]
    Verifier(String),
    /// TLS-level error
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),
}

/// EAP-TLS session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsState {
    /// Handshake in progress
    TlsHandshake,
    /// Handshake completed, keys exported
    TlsDone,
}

/// Outcome of feeding one EAP-TLS fragment into the session.
pub enum TlsStepOutcome {
    /// Handshake completed; keying material exported
    Completed {
        /// 128 bytes of exported keying material
        key_material: [u8; EKM_SIZE],
    },
    /// Handshake wants more I/O; `outgoing` bytes go back to the network
    InProgress {
        /// TLS record bytes produced for the peer
        outgoing: Vec<u8>,
    },
}

/// Verifier that checks the chain against the configured CA but tolerates
/// the placeholder server name.
#[derive(Debug)]
struct ChainOnlyVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for ChainOnlyVerifier {
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
            Err(rustls::Error::InvalidCertificate(CertificateError::NotValidForName)) => {
                Ok(ServerCertVerified::assertion())
            }
            Err(rustls::Error::InvalidCertificate(
                CertificateError::NotValidForNameContext { .. },
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

fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, EapTlsError> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    Ok(certs)
}

/// Loads a PEM private key, decrypting PKCS#8 material when needed.
///
/// `passphrase` is invoked only when the key file is an encrypted PKCS#8
/// document.
fn load_private_key(
    path: &Path,
    passphrase: impl FnOnce() -> Option<String>,
) -> Result<PrivateKeyDer<'static>, EapTlsError> {
    let (label, doc) = pkcs8::Document::read_pem_file(path)
        .map_err(|e| EapTlsError::InvalidKey(e.to_string()))?;

    match label.as_str() {
        "PRIVATE KEY" => Ok(PrivateKeyDer::Pkcs8(doc.as_bytes().to_vec().into())),
        "RSA PRIVATE KEY" => Ok(PrivateKeyDer::Pkcs1(doc.as_bytes().to_vec().into())),
        "ENCRYPTED PRIVATE KEY" => {
            let password = passphrase().ok_or(EapTlsError::PassphraseRequired)?;
            let info = pkcs8::EncryptedPrivateKeyInfo::try_from(doc.as_bytes())
                .map_err(|e| EapTlsError::InvalidKey(e.to_string()))?;
            let secret = info
                .decrypt(password.as_bytes())
                .map_err(|e| EapTlsError::InvalidKey(e.to_string()))?;
            Ok(PrivateKeyDer::Pkcs8(secret.as_bytes().to_vec().into()))
        }
        other => Err(EapTlsError::InvalidKey(format!(
            "unsupported PEM label: {other}"
        ))),
    }
}

/// One EAP-TLS client session, spanning `TLS_START` to `TLS_DONE`.
pub struct EapTlsSession {
    state: TlsState,
    conn: ClientConnection,
}

impl EapTlsSession {
    /// Builds the TLS client context and connection from the UE
    /// configuration. Called when the EAP-TLS Start fragment arrives; the
    /// session then sits in the handshake state.
    pub fn establish(config: &UeConfig) -> Result<Self, EapTlsError> {
        let ca_path = config
            .ca_certificate
            .as_deref()
            .ok_or(EapTlsError::MissingConfig("ca_certificate"))?;
        let cert_path = config
            .client_certificate
            .as_deref()
            .ok_or(EapTlsError::MissingConfig("client_certificate"))?;
        let key_path = config
            .client_private_key
            .as_deref()
            .ok_or(EapTlsError::MissingConfig("client_private_key"))?;

        let mut roots = RootCertStore::empty();
        for cert in load_certificates(ca_path)? {
            roots.add(cert)?;
        }

        let inner = WebPkiServerVerifier::builder(Arc::new(roots))
            .build()
            .map_err(|e| EapTlsError::Verifier(e.to_string()))?;

        let client_certs = load_certificates(cert_path)?;
        let key = load_private_key(key_path, || config.client_password.clone())?;

        let tls_config =
            ClientConfig::builder_with_protocol_versions(&[&rustls::version::TLS12])
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(ChainOnlyVerifier { inner }))
                .with_client_auth_cert(client_certs, key)?;

        // EAP-TLS has no server hostname; the verifier above ignores the
        // placeholder name.
        let server_name = ServerName::try_from("eap-tls.invalid".to_string())
            .unwrap_or_else(|_| unreachable!("placeholder server name is a valid DNS name"));

        let conn = ClientConnection::new(Arc::new(tls_config), server_name)?;
        debug!("EAP-TLS session established, entering handshake");

        Ok(Self {
            state: TlsState::TlsHandshake,
            conn,
        })
    }

    /// The current session state.
    pub fn state(&self) -> TlsState {
        self.state
    }

    /// Feeds received TLS bytes into the handshake and drives it one step.
    pub fn step(&mut self, tls_data: &[u8]) -> Result<TlsStepOutcome, EapTlsError> {
        let mut reader = Cursor::new(tls_data);
        while (reader.position() as usize) < tls_data.len() {
            if self.conn.read_tls(&mut reader)? == 0 {
                break;
            }
            self.conn.process_new_packets()?;
        }

        let mut outgoing = Vec::new();
        while self.conn.wants_write() {
            self.conn.write_tls(&mut outgoing)?;
        }

        if self.conn.is_handshaking() {
            return Ok(TlsStepOutcome::InProgress { outgoing });
        }

        self.state = TlsState::TlsDone;
        let key_material = self
            .conn
            .export_keying_material([0u8; EKM_SIZE], EKM_LABEL, None)?;
        debug!("EAP-TLS handshake completed, keying material exported");

        Ok(TlsStepOutcome::Completed { key_material })
    }
}

impl std::fmt::Debug for EapTlsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EapTlsSession")
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uecore_common::types::Plmn;

    fn tls_config_missing_ca() -> UeConfig {
        UeConfig {
            supi: None,
            hplmn: Plmn::new(1, 1, false),
            key: [0x01; 16],
            op: [0x02; 16],
            op_type: Default::default(),
            amf: [0x80, 0x00],
            ca_certificate: None,
            client_certificate: None,
            client_private_key: None,
            client_password: None,
        }
    }

    #[test]
    fn test_establish_requires_ca_certificate() {
        let config = tls_config_missing_ca();
        assert!(matches!(
            EapTlsSession::establish(&config),
            Err(EapTlsError::MissingConfig("ca_certificate"))
        ));
    }

    #[test]
    fn test_establish_requires_client_material() {
        let mut config = tls_config_missing_ca();
        config.ca_certificate = Some("/nonexistent/ca.pem".into());
        assert!(matches!(
            EapTlsSession::establish(&config),
            Err(EapTlsError::MissingConfig("client_certificate"))
        ));
    }

    #[test]
    fn test_missing_key_file_is_io_error() {
        let mut config = tls_config_missing_ca();
        config.ca_certificate = Some("/nonexistent/ca.pem".into());
        config.client_certificate = Some("/nonexistent/cert.pem".into());
        config.client_private_key = Some("/nonexistent/key.pem".into());
        // CA file open fails before anything else
        assert!(matches!(
            EapTlsSession::establish(&config),
            Err(EapTlsError::Io(_))
        ));
    }
}
