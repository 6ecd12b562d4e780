//! Throwaway Fabric-style credentials for tests.
//!
//! Generates P-256 client certificates and a TLS CA, and can lay them out on disk the way
//! `cryptogen` lays out an organisation's MSP directory.

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, Ia5String, IsCa, KeyPair,
    KeyUsagePurpose, SanType, SerialNumber, PKCS_ECDSA_P256_SHA256,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during certificate creation.
#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Failed to generate certificate: {0}")]
    GenerationError(String),
    #[error("Failed to write {path}: {source}", path = path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct Certificate;

impl Certificate {
    /// Creates a self-signed P-256 client certificate.
    ///
    /// # Arguments
    ///
    /// * `common_name` - The enrolled user, e.g. `User1@org1.example.com`.
    /// * `organisation` - The organisation domain, e.g. `org1.example.com`.
    ///
    /// # Returns
    ///
    /// A tuple of (X.509 certificate PEM, PKCS#8 private key PEM).
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::GenerationError` if certificate generation fails.
    pub fn create_client(
        common_name: &str,
        organisation: &str,
    ) -> Result<(String, String), CertificateError> {
        let mut params = base_params(common_name);
        params
            .distinguished_name
            .push(DnType::OrganizationName, organisation);
        params
            .distinguished_name
            .push(DnType::OrganizationalUnitName, "client");
        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];

        self_signed(params)
    }

    /// Creates a self-signed TLS CA certificate naming `host` as a subject alternative name.
    pub fn create_tls_ca(host: &str) -> Result<(String, String), CertificateError> {
        let mut params = base_params(host);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let dns_name = Ia5String::try_from(host)
            .map_err(|e| CertificateError::GenerationError(e.to_string()))?;
        params.subject_alt_names.push(SanType::DnsName(dns_name));

        self_signed(params)
    }
}

fn base_params(common_name: &str) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut subject = DistinguishedName::new();
    subject.push(DnType::CommonName, common_name);
    params.distinguished_name = subject;

    let now = time::OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + time::Duration::days(365);
    params.serial_number = Some(SerialNumber::from(vec![0, 1, 2, 3, 4, 5, 6, 7]));
    params
}

fn self_signed(params: CertificateParams) -> Result<(String, String), CertificateError> {
    let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)
        .map_err(|e| CertificateError::GenerationError(e.to_string()))?;
    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| CertificateError::GenerationError(e.to_string()))?;

    Ok((cert.pem(), key_pair.serialize_pem()))
}

/// An MSP credential tree for one user, rooted in a caller-owned directory.
///
/// ```text
/// <root>/users/<user>/msp/signcerts/<user>-cert.pem
/// <root>/users/<user>/msp/keystore/priv_sk
/// <root>/peers/peer0.org1.example.com/tls/ca.crt
/// ```
#[derive(Clone, Debug)]
pub struct MspLayout {
    pub root: PathBuf,
    pub signcerts_dir: PathBuf,
    pub keystore_dir: PathBuf,
    pub tls_ca_path: PathBuf,
}

impl MspLayout {
    pub fn create(root: &Path, user: &str) -> Result<Self, CertificateError> {
        let organisation = user.split_once('@').map_or(user, |(_, org)| org);
        let msp_dir = root.join("users").join(user).join("msp");
        let layout = Self {
            root: root.to_path_buf(),
            signcerts_dir: msp_dir.join("signcerts"),
            keystore_dir: msp_dir.join("keystore"),
            tls_ca_path: root
                .join("peers")
                .join(format!("peer0.{organisation}"))
                .join("tls")
                .join("ca.crt"),
        };

        let (cert_pem, key_pem) = Certificate::create_client(user, organisation)?;
        let (ca_pem, _) = Certificate::create_tls_ca(&format!("peer0.{organisation}"))?;

        write(&layout.signcerts_dir.join(format!("{user}-cert.pem")), &cert_pem)?;
        write(&layout.key_path(), &key_pem)?;
        write(&layout.tls_ca_path, &ca_pem)?;

        Ok(layout)
    }

    pub fn key_path(&self) -> PathBuf {
        self.keystore_dir.join("priv_sk")
    }
}

fn write(path: &Path, contents: &str) -> Result<(), CertificateError> {
    let to_error = |source| CertificateError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, contents).map_err(to_error)
}
