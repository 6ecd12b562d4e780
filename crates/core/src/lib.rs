//! # NHMS Core
//!
//! Client-side logic for the NHMS patient registry on a Hyperledger Fabric network.
//!
//! This crate contains everything between the command line and the wire:
//! - Connection settings resolved once from the environment ([`GatewayConfig`])
//! - Client identity and transaction signing from MSP credential files
//! - A Fabric Gateway session with evaluate and submit semantics
//! - Patient record types and the read, list and create operations
//!
//! **No CLI concerns**: argument parsing, output formatting and exit codes belong in `nhms-cli`.

pub mod config;
pub mod constants;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod patient;

pub use config::{GatewayConfig, Timeouts};
pub use contract::{Connector, Contract};
pub use error::{ErrorKind, LedgerError, LedgerResult, Phase};
pub use gateway::{Gateway, GatewayConnector, GatewayContract, Network};
pub use identity::{Identity, SignFn};
pub use patient::{NewPatient, PatientRecord, PatientService};
