//! Gateway runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the credential
//! loader and gateway session. Nothing below reads the environment after that point, which
//! keeps tests free to build a `GatewayConfig` from fixtures.

use crate::constants::{
    DEFAULT_CERT_PATH, DEFAULT_CHAINCODE, DEFAULT_CHANNEL, DEFAULT_COMMIT_STATUS_TIMEOUT,
    DEFAULT_CRYPTO_PATH, DEFAULT_ENDORSE_TIMEOUT, DEFAULT_EVALUATE_TIMEOUT, DEFAULT_GATEWAY_PEER,
    DEFAULT_KEY_PATH, DEFAULT_MSP_ID, DEFAULT_PEER_ENDPOINT, DEFAULT_SUBMIT_TIMEOUT,
    DEFAULT_TLS_CERT_PATH,
};
use crate::{LedgerError, LedgerResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bounds on how long each gateway call may take before it is treated as failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub evaluate: Duration,
    pub endorse: Duration,
    pub submit: Duration,
    pub commit_status: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            evaluate: DEFAULT_EVALUATE_TIMEOUT,
            endorse: DEFAULT_ENDORSE_TIMEOUT,
            submit: DEFAULT_SUBMIT_TIMEOUT,
            commit_status: DEFAULT_COMMIT_STATUS_TIMEOUT,
        }
    }
}

/// Everything needed to reach the ledger as a given client identity.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    msp_id: String,
    peer_endpoint: String,
    gateway_peer: String,
    tls_cert_path: PathBuf,
    cert_path: PathBuf,
    key_path: PathBuf,
    channel: String,
    chaincode: String,
    timeouts: Timeouts,
}

impl GatewayConfig {
    /// Create a new `GatewayConfig`.
    ///
    /// `cert_path` and `key_path` may each name a file or a directory holding it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        msp_id: impl Into<String>,
        peer_endpoint: impl Into<String>,
        gateway_peer: impl Into<String>,
        tls_cert_path: PathBuf,
        cert_path: PathBuf,
        key_path: PathBuf,
        channel: impl Into<String>,
        chaincode: impl Into<String>,
        timeouts: Timeouts,
    ) -> LedgerResult<Self> {
        let cfg = Self {
            msp_id: msp_id.into(),
            peer_endpoint: peer_endpoint.into(),
            gateway_peer: gateway_peer.into(),
            tls_cert_path,
            cert_path,
            key_path,
            channel: channel.into(),
            chaincode: chaincode.into(),
            timeouts,
        };

        for (name, value) in [
            ("msp_id", &cfg.msp_id),
            ("peer_endpoint", &cfg.peer_endpoint),
            ("gateway_peer", &cfg.gateway_peer),
            ("channel", &cfg.channel),
            ("chaincode", &cfg.chaincode),
        ] {
            if value.trim().is_empty() {
                return Err(LedgerError::Config(format!("{name} cannot be empty")));
            }
        }

        Ok(cfg)
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> LedgerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    ///
    /// Unset or blank keys fall back to the defaults in [`crate::constants`]. Credential paths
    /// that are relative are resolved against `NHMS_CRYPTO_PATH`.
    pub fn from_lookup<F>(lookup: F) -> LedgerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let string_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let crypto_path = PathBuf::from(string_or("NHMS_CRYPTO_PATH", DEFAULT_CRYPTO_PATH));
        let credential_path = |key: &str, default: &str| -> PathBuf {
            let path = PathBuf::from(string_or(key, default));
            if path.is_absolute() {
                path
            } else {
                crypto_path.join(path)
            }
        };

        let defaults = Timeouts::default();
        let timeout = |key: &str, default: Duration| -> LedgerResult<Duration> {
            match get(key) {
                None => Ok(default),
                Some(value) => parse_timeout_secs(key, &value),
            }
        };
        let timeouts = Timeouts {
            evaluate: timeout("NHMS_EVALUATE_TIMEOUT_SECS", defaults.evaluate)?,
            endorse: timeout("NHMS_ENDORSE_TIMEOUT_SECS", defaults.endorse)?,
            submit: timeout("NHMS_SUBMIT_TIMEOUT_SECS", defaults.submit)?,
            commit_status: timeout("NHMS_COMMIT_STATUS_TIMEOUT_SECS", defaults.commit_status)?,
        };

        Self::new(
            string_or("NHMS_MSP_ID", DEFAULT_MSP_ID),
            string_or("NHMS_PEER_ENDPOINT", DEFAULT_PEER_ENDPOINT),
            string_or("NHMS_GATEWAY_PEER", DEFAULT_GATEWAY_PEER),
            credential_path("NHMS_TLS_CERT_PATH", DEFAULT_TLS_CERT_PATH),
            credential_path("NHMS_CERT_PATH", DEFAULT_CERT_PATH),
            credential_path("NHMS_KEY_PATH", DEFAULT_KEY_PATH),
            string_or("NHMS_CHANNEL", DEFAULT_CHANNEL),
            string_or("NHMS_CHAINCODE", DEFAULT_CHAINCODE),
            timeouts,
        )
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn peer_endpoint(&self) -> &str {
        &self.peer_endpoint
    }

    pub fn gateway_peer(&self) -> &str {
        &self.gateway_peer
    }

    pub fn tls_cert_path(&self) -> &Path {
        &self.tls_cert_path
    }

    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn chaincode(&self) -> &str {
        &self.chaincode
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }
}

fn parse_timeout_secs(key: &str, value: &str) -> LedgerResult<Duration> {
    match value.parse::<u64>() {
        Ok(0) => Err(LedgerError::Config(format!("{key} must be greater than zero"))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(LedgerError::Config(format!(
            "{key} must be a whole number of seconds: {e}"
        ))),
    }
}
