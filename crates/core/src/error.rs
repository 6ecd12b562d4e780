use std::path::PathBuf;
use std::time::Duration;

/// The gateway phase a remote failure happened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Evaluate,
    Endorse,
    Submit,
    CommitStatus,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Evaluate => "evaluate",
            Self::Endorse => "endorse",
            Self::Submit => "submit",
            Self::CommitStatus => "commit status",
        })
    }
}

/// Coarse classification of a [`LedgerError`], used by callers deciding exit-vs-continue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration or unusable credentials. A deployment problem.
    Configuration,
    /// The transport or gateway session could not be established.
    Connection,
    /// Caller-supplied input was rejected before any remote call.
    Validation,
    /// The ledger rejected or failed to answer a call.
    Remote,
    /// The ledger answered with bytes that are not the expected shape.
    Decode,
    /// A value could not be encoded for output or transmission.
    Encode,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read {path}: {source}", path = path.display())]
    CredentialRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no credential file found in directory {path}", path = path.display())]
    CredentialMissing { path: PathBuf },
    #[error("failed to parse certificate: {0}")]
    CertificateParse(Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to parse ECDSA private key: {0}")]
    PrivateKeyParse(Box<dyn std::error::Error + Send + Sync>),
    #[error("client certificate public key does not match the private key")]
    CertificateKeyMismatch,
    #[error("failed to sign: {0}")]
    Sign(Box<dyn std::error::Error + Send + Sync>),
    #[error("invalid peer endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to connect to gateway: {0}")]
    Connect(#[from] tonic::transport::Error),
    #[error("{phase} call failed: {status}", status = .status.message())]
    Remote {
        phase: Phase,
        #[source]
        status: Box<tonic::Status>,
    },
    #[error("{phase} call timed out after {timeout:?}")]
    Timeout { phase: Phase, timeout: Duration },
    #[error("chaincode returned status {status}: {message}")]
    ChaincodeResponse { status: i32, message: String },
    #[error("transaction {transaction_id} failed to commit with status code {code}")]
    CommitFailed { transaction_id: String, code: String },
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),
    #[error("failed to decode gateway message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("failed to serialize patient: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize patient: {0}")]
    Deserialization(serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl LedgerError {
    pub(crate) fn remote(phase: Phase, status: tonic::Status) -> Self {
        Self::Remote {
            phase,
            status: Box::new(status),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_)
            | Self::CredentialRead { .. }
            | Self::CredentialMissing { .. }
            | Self::CertificateParse(_)
            | Self::PrivateKeyParse(_)
            | Self::CertificateKeyMismatch
            | Self::Sign(_) => ErrorKind::Configuration,
            Self::InvalidEndpoint { .. } | Self::Connect(_) => ErrorKind::Connection,
            Self::InvalidInput(_) => ErrorKind::Validation,
            Self::Remote { .. }
            | Self::Timeout { .. }
            | Self::ChaincodeResponse { .. }
            | Self::CommitFailed { .. } => ErrorKind::Remote,
            Self::MalformedResponse(_) | Self::Decode(_) | Self::Deserialization(_) => {
                ErrorKind::Decode
            }
            Self::Serialization(_) => ErrorKind::Encode,
        }
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failures_are_classified_separately_from_decode_failures() {
        let remote = LedgerError::remote(Phase::Evaluate, tonic::Status::unavailable("down"));
        assert_eq!(remote.kind(), ErrorKind::Remote);
        assert!(remote.to_string().contains("evaluate call failed: down"));

        let decode = serde_json::from_str::<Vec<String>>("{")
            .map_err(LedgerError::Deserialization)
            .unwrap_err();
        assert_eq!(decode.kind(), ErrorKind::Decode);
    }

    #[test]
    fn signing_failures_are_configuration_errors() {
        let err = LedgerError::Sign("signing key rejected digest".into());
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(LedgerError::CertificateKeyMismatch.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn timeout_message_names_phase() {
        let err = LedgerError::Timeout {
            phase: Phase::CommitStatus,
            timeout: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "commit status call timed out after 60s");
    }
}
