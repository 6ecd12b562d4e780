//! Capabilities the record operations depend on.
//!
//! The ledger is reached through two traits so everything above the wire can be exercised with
//! an in-memory double:
//! - [`Contract`]: a named chaincode on a channel, offering read-only `evaluate` and
//!   state-changing `submit` calls.
//! - [`Connector`]: produces a ready [`Contract`] for one process run.

use crate::LedgerResult;

#[tonic::async_trait]
pub trait Contract: Send + Sync {
    /// Run a read-only transaction and return its result payload. No ledger state changes.
    async fn evaluate(&self, transaction: &str, args: &[&str]) -> LedgerResult<Vec<u8>>;

    /// Endorse, order and commit a transaction, returning its result payload once committed.
    async fn submit(&self, transaction: &str, args: &[&str]) -> LedgerResult<Vec<u8>>;
}

#[tonic::async_trait]
pub trait Connector: Send + Sync {
    type Contract: Contract;

    /// Load credentials, open the transport and resolve the configured contract.
    async fn connect(&self) -> LedgerResult<Self::Contract>;
}
