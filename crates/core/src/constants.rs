//! Constants used throughout the NHMS core crate.
//!
//! Defaults describe the Fabric test network the client was first deployed against. Every one
//! of them can be overridden through [`crate::GatewayConfig`].

use std::time::Duration;

/// Membership service provider the client identity belongs to.
pub const DEFAULT_MSP_ID: &str = "Org1MSP";

/// Root of the organisation's crypto material.
pub const DEFAULT_CRYPTO_PATH: &str =
    "/home/nhms/fabric-samples/test-network/organizations/peerOrganizations/org1.example.com";

/// Client signing certificate, relative to the crypto root.
pub const DEFAULT_CERT_PATH: &str =
    "users/User1@org1.example.com/msp/signcerts/User1@org1.example.com-cert.pem";

/// Client private key, relative to the crypto root.
pub const DEFAULT_KEY_PATH: &str = "users/User1@org1.example.com/msp/keystore/priv_sk";

/// TLS CA certificate of the gateway peer, relative to the crypto root.
pub const DEFAULT_TLS_CERT_PATH: &str = "peers/peer0.org1.example.com/tls/ca.crt";

/// Gateway peer gRPC endpoint (`host:port`).
pub const DEFAULT_PEER_ENDPOINT: &str = "localhost:7051";

/// Name the gateway peer's TLS certificate is issued to.
pub const DEFAULT_GATEWAY_PEER: &str = "peer0.org1.example.com";

/// Channel the patient chaincode is deployed on.
pub const DEFAULT_CHANNEL: &str = "mychannel";

/// Chaincode (contract) name of the patient registry.
pub const DEFAULT_CHAINCODE: &str = "basic";

pub const DEFAULT_EVALUATE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_ENDORSE_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_COMMIT_STATUS_TIMEOUT: Duration = Duration::from_secs(60);

/// Remote transaction reading a single patient by national identifier.
pub const READ_PATIENT_TRANSACTION: &str = "ReadPatient";

/// Remote transaction listing every patient on the ledger.
pub const GET_ALL_PATIENTS_TRANSACTION: &str = "GetAllPatients";

/// Remote transaction recording a new patient.
pub const CREATE_PATIENT_TRANSACTION: &str = "CreatePatient";

/// Default for optional free-text medical fields left unset on creation.
pub const UNSET_MEDICAL_FIELD: &str = "None";

/// Length of the random nonce carried in every proposal signature header.
pub const NONCE_LENGTH: usize = 24;
