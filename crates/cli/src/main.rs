use std::io;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nhms_cli::{dispatch, parse_action, report_usage, EXIT_FAILURE};
use nhms_core::{GatewayConfig, GatewayConnector};

/// Entry point for the `nhms-client` binary.
///
/// Runs one action against the ledger and exits:
/// - `publish`: record a new patient (fatal on failure)
/// - `get`: print one patient as JSON
/// - `get-all`: print every patient as a JSON array
///
/// # Environment Variables
/// - `NHMS_PEER_ENDPOINT`, `NHMS_GATEWAY_PEER`: gateway address and TLS server name
/// - `NHMS_MSP_ID`, `NHMS_CRYPTO_PATH`, `NHMS_CERT_PATH`, `NHMS_KEY_PATH`, `NHMS_TLS_CERT_PATH`:
///   client identity and trust root
/// - `NHMS_CHANNEL`, `NHMS_CHAINCODE`: contract location
/// - `NHMS_*_TIMEOUT_SECS`: per-phase call timeouts
/// - `RUST_LOG`: log filter for stderr output (default: "warn")
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new("warn"))?,
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let (mut stdout, mut stderr) = (io::stdout(), io::stderr());

    let action = match parse_action(std::env::args_os()) {
        Ok(action) => action,
        Err(usage_error) => {
            let code = report_usage(&usage_error, &mut stdout, &mut stderr)?;
            return Ok(ExitCode::from(code));
        }
    };

    let cfg = match GatewayConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            eprintln!("Failed to load configuration: {e}");
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
    };
    tracing::debug!(
        "connecting to {} as {}",
        cfg.peer_endpoint(),
        cfg.msp_id()
    );

    let code = dispatch(
        action,
        &GatewayConnector::new(cfg),
        &mut stdout,
        &mut stderr,
    )
    .await?;
    Ok(ExitCode::from(code))
}
