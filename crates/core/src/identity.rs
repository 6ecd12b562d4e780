//! Client identity and signing.
//!
//! A ledger client authenticates with an X.509 certificate bound to a membership service
//! provider (MSP) and signs every outbound proposal, transaction and commit-status request
//! with the matching ECDSA P-256 private key.
//!
//! ## Signature format
//!
//! - Signed payload: the SHA-256 digest of the message bytes, computed by the caller.
//! - Signature bytes: ASN.1 DER encoded `(r, s)` with `s` normalised to the lower half of the
//!   curve order. Peers reject high-S signatures.
//!
//! ## Credential layout
//!
//! Certificate and key paths may point at a file, or at a directory such as an MSP `signcerts/`
//! or `keystore/` folder. For a directory the first regular file in lexical order is used.

use crate::{GatewayConfig, LedgerError, LedgerResult};
use nhms_proto::msp::SerializedIdentity;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use prost::Message;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use x509_parser::prelude::*;

/// Signs a message digest, returning the signature bytes.
pub type SignFn = Arc<dyn Fn(&[u8]) -> LedgerResult<Vec<u8>> + Send + Sync>;

/// An X.509 client identity within a membership service provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    msp_id: String,
    certificate_pem: Vec<u8>,
}

impl Identity {
    /// Bind a PEM certificate to an MSP. The certificate must parse as X.509.
    pub fn new(msp_id: impl Into<String>, certificate_pem: Vec<u8>) -> LedgerResult<Self> {
        let msp_id = msp_id.into();
        if msp_id.trim().is_empty() {
            return Err(LedgerError::InvalidInput("msp_id cannot be empty".into()));
        }
        parse_certificate_pem(&certificate_pem)?;
        Ok(Self {
            msp_id,
            certificate_pem,
        })
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn certificate_pem(&self) -> &[u8] {
        &self.certificate_pem
    }

    /// Wire form of this identity, used as the creator of proposals and commit-status requests.
    pub fn serialize(&self) -> Vec<u8> {
        SerializedIdentity {
            mspid: self.msp_id.clone(),
            id_bytes: self.certificate_pem.clone(),
        }
        .encode_to_vec()
    }
}

/// Load the client identity named by `cfg`.
pub fn load_identity(cfg: &GatewayConfig) -> LedgerResult<Identity> {
    let certificate_pem = read_credential(cfg.cert_path())?;
    Identity::new(cfg.msp_id(), certificate_pem)
}

/// Load the client private key named by `cfg` and return a signing function closed over it.
///
/// The key must belong to `identity`'s certificate.
pub fn load_sign(cfg: &GatewayConfig, identity: &Identity) -> LedgerResult<SignFn> {
    let key_pem = read_credential(cfg.key_path())?;
    let signing_key = signing_key_from_pem(&key_pem)?;

    let cert_public_key = certificate_public_key_sec1(identity.certificate_pem())?;
    let key_public_key = signing_key
        .verifying_key()
        .to_encoded_point(false)
        .as_bytes()
        .to_vec();
    if cert_public_key != key_public_key {
        return Err(LedgerError::CertificateKeyMismatch);
    }

    Ok(new_private_key_sign(signing_key))
}

/// Wrap a P-256 key as a [`SignFn`] producing low-S DER signatures over prehashed digests.
pub fn new_private_key_sign(signing_key: SigningKey) -> SignFn {
    Arc::new(move |digest: &[u8]| -> LedgerResult<Vec<u8>> {
        let signature: Signature = signing_key
            .sign_prehash(digest)
            .map_err(|e| LedgerError::Sign(Box::new(e)))?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_der().as_bytes().to_vec())
    })
}

/// Parse an ECDSA P-256 private key in PKCS#8 (`PRIVATE KEY`) or SEC1 (`EC PRIVATE KEY`) PEM.
pub fn signing_key_from_pem(key_pem: &[u8]) -> LedgerResult<SigningKey> {
    let key_pem = std::str::from_utf8(key_pem)
        .map_err(|e| LedgerError::PrivateKeyParse(Box::new(e)))?;

    match SigningKey::from_pkcs8_pem(key_pem) {
        Ok(key) => Ok(key),
        Err(pkcs8_error) => p256::SecretKey::from_sec1_pem(key_pem)
            .map(SigningKey::from)
            .map_err(|_| LedgerError::PrivateKeyParse(Box::new(pkcs8_error))),
    }
}

/// Parse the first PEM certificate in `pem_bytes`, returning its DER encoding.
pub(crate) fn parse_certificate_pem(pem_bytes: &[u8]) -> LedgerResult<Vec<u8>> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(pem_bytes)
        .map_err(|e| LedgerError::CertificateParse(Box::new(e)))?;
    if pem.label != "CERTIFICATE" {
        return Err(LedgerError::CertificateParse(
            format!("expected CERTIFICATE PEM block, found {}", pem.label).into(),
        ));
    }
    X509Certificate::from_der(&pem.contents)
        .map_err(|e| LedgerError::CertificateParse(Box::new(e)))?;
    Ok(pem.contents)
}

fn certificate_public_key_sec1(certificate_pem: &[u8]) -> LedgerResult<Vec<u8>> {
    let der = parse_certificate_pem(certificate_pem)?;
    let (_, cert) = X509Certificate::from_der(&der)
        .map_err(|e| LedgerError::CertificateParse(Box::new(e)))?;
    Ok(cert.public_key().subject_public_key.data.to_vec())
}

/// Read a credential file, or the first regular file inside a credential directory.
pub fn read_credential(path: &Path) -> LedgerResult<Vec<u8>> {
    let file = if path.is_dir() {
        first_file_in(path)?
    } else {
        path.to_path_buf()
    };

    tracing::debug!("reading credential {}", file.display());
    fs::read(&file).map_err(|source| LedgerError::CredentialRead { path: file, source })
}

fn first_file_in(dir: &Path) -> LedgerResult<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|source| LedgerError::CredentialRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    files
        .into_iter()
        .next()
        .ok_or_else(|| LedgerError::CredentialMissing {
            path: dir.to_path_buf(),
        })
}
