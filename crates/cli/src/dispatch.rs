//! Routing an [`Action`] to the record operations and rendering the outcome.
//!
//! Reads degrade gracefully: a failed `get` or `get-all` prints a `{"code","message"}` object
//! on stdout and the run still succeeds. A failed `publish`, or a failure to connect at all,
//! is reported on stderr and exits non-zero.

use crate::args::{parse_action, usage, Action, UsageError};
use nhms_core::{Connector, ErrorKind, LedgerError, LedgerResult, PatientService};
use serde::Serialize;
use std::ffi::OsString;
use std::io::{self, Write};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Machine-readable failure of a read operation.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub code: u8,
    pub message: String,
}

impl ErrorReport {
    pub const REMOTE: u8 = 1;
    pub const DECODE: u8 = 2;
    pub const ENCODE: u8 = 3;
}

impl From<&LedgerError> for ErrorReport {
    fn from(err: &LedgerError) -> Self {
        let code = match err.kind() {
            ErrorKind::Decode => Self::DECODE,
            ErrorKind::Encode => Self::ENCODE,
            _ => Self::REMOTE,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

/// Parse `args`, then run the selected action against `connector`.
///
/// Returns the process exit status. Nothing connects unless the arguments are valid.
pub async fn run<I, T, C, O, E>(
    args: I,
    connector: &C,
    out: &mut O,
    err: &mut E,
) -> io::Result<u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    C: Connector,
    O: Write,
    E: Write,
{
    match parse_action(args) {
        Ok(action) => dispatch(action, connector, out, err).await,
        Err(usage_error) => report_usage(&usage_error, out, err),
    }
}

/// Print a usage problem (or requested help) and return the matching exit status.
pub fn report_usage<O: Write, E: Write>(
    usage_error: &UsageError,
    out: &mut O,
    err: &mut E,
) -> io::Result<u8> {
    match usage_error {
        UsageError::Parse(e) if usage_error.is_informational() => {
            write!(out, "{e}")?;
            Ok(EXIT_SUCCESS)
        }
        UsageError::Parse(e) => {
            write!(err, "{e}")?;
            Ok(EXIT_FAILURE)
        }
        other => {
            writeln!(err, "error: {other}\n\n{}", usage())?;
            writeln!(err, "For more information, try '--help'.")?;
            Ok(EXIT_FAILURE)
        }
    }
}

/// Connect and perform one validated action.
pub async fn dispatch<C, O, E>(
    action: Action,
    connector: &C,
    out: &mut O,
    err: &mut E,
) -> io::Result<u8>
where
    C: Connector,
    O: Write,
    E: Write,
{
    let contract = match connector.connect().await {
        Ok(contract) => contract,
        Err(e) => {
            tracing::error!("failed to connect: {e}");
            writeln!(err, "Failed to connect to gateway: {e}")?;
            return Ok(EXIT_FAILURE);
        }
    };
    let service = PatientService::new(contract);

    match action {
        Action::Get { nin } => {
            let patient = service.read_patient(&nin).await;
            print_json(out, patient)
        }
        Action::GetAll => {
            let patients = service.get_all_patients().await;
            print_json(out, patients)
        }
        Action::Publish(patient) => match service.create_patient(&patient).await {
            Ok(()) => {
                writeln!(
                    out,
                    "Patient with ID {} published successfully.",
                    patient.nin()
                )?;
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                tracing::error!(kind = ?e.kind(), "failed to publish patient: {e}");
                writeln!(err, "Failed to submit transaction: {e}")?;
                Ok(EXIT_FAILURE)
            }
        },
    }
}

/// Print a read result as one JSON line, or its [`ErrorReport`] if it failed.
fn print_json<O: Write, T: Serialize>(out: &mut O, result: LedgerResult<T>) -> io::Result<u8> {
    let line = result.and_then(|value| {
        serde_json::to_string(&value).map_err(LedgerError::Serialization)
    });

    match line {
        Ok(line) => writeln!(out, "{line}")?,
        Err(e) => {
            tracing::warn!(kind = ?e.kind(), "read failed: {e}");
            let report = serde_json::to_string(&ErrorReport::from(&e)).map_err(io::Error::other)?;
            writeln!(out, "{report}")?;
        }
    }
    Ok(EXIT_SUCCESS)
}
