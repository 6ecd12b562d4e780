//! Command-line flags and the actions they select.

use clap::{CommandFactory, Parser};
use nhms_core::{LedgerError, NewPatient};
use std::ffi::OsString;

#[derive(Debug, Parser)]
#[command(name = "nhms-client")]
#[command(version, about = "NHMS patient registry client for Hyperledger Fabric")]
#[command(args_override_self = true)]
pub struct Cli {
    /// Action to perform: publish, get or get-all
    #[arg(long, value_name = "ACTION", allow_hyphen_values = true)]
    pub action: Option<String>,
    /// Patient national identification number
    #[arg(long, allow_hyphen_values = true)]
    pub patient_id: Option<String>,
    /// Patient first name
    #[arg(long, allow_hyphen_values = true)]
    pub first_name: Option<String>,
    /// Patient last name
    #[arg(long, allow_hyphen_values = true)]
    pub last_name: Option<String>,
    /// Date of birth
    #[arg(long, allow_hyphen_values = true)]
    pub dob: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub sex: Option<String>,
    /// Mother's national identification number
    #[arg(long, allow_hyphen_values = true)]
    pub mother_nin: Option<String>,
    /// Father's national identification number
    #[arg(long, allow_hyphen_values = true)]
    pub father_nin: Option<String>,
    #[arg(long, default_value = "None", allow_hyphen_values = true)]
    pub family_history: String,
    #[arg(long, default_value = "None", allow_hyphen_values = true)]
    pub allergies: String,
    #[arg(long, default_value = "None", allow_hyphen_values = true)]
    pub chronic_illnesses: String,
    /// Who submitted or amended the record
    #[arg(long, allow_hyphen_values = true)]
    pub amended_from: Option<String>,
}

/// What one run of the client does.
#[derive(Debug)]
pub enum Action {
    Publish(NewPatient),
    Get { nin: String },
    GetAll,
}

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// Help or version output requested, or clap rejected the flags.
    #[error("{0}")]
    Parse(#[from] clap::Error),
    #[error("no action specified")]
    MissingAction,
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("action {action} requires {}", .flags.join(", "))]
    MissingFlags {
        action: &'static str,
        flags: Vec<&'static str>,
    },
    #[error(transparent)]
    Rejected(#[from] LedgerError),
}

impl UsageError {
    /// Help and version requests are not failures.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::Parse(e) if !e.use_stderr())
    }
}

/// The short usage line printed alongside validation errors.
pub fn usage() -> String {
    Cli::command().render_usage().to_string()
}

/// Rewrite Go-style single-dash long flags (`-patient-id=1`, `-dob 1990-01-01`) as `--` flags.
///
/// The first argument is the program name and is left alone, as are flag values and anything
/// after a bare `--`.
pub fn normalise_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut normalised: Vec<OsString> = args.next().into_iter().collect();
    let mut expecting_value = false;

    while let Some(arg) = args.next() {
        if expecting_value {
            expecting_value = false;
            normalised.push(arg);
            continue;
        }
        let Some(text) = arg.to_str() else {
            normalised.push(arg);
            continue;
        };
        if text == "--" {
            normalised.push(arg);
            normalised.extend(args.by_ref());
            break;
        }

        let flag = if let Some(long) = text.strip_prefix("--") {
            long
        } else if text.len() > 2 && text.starts_with('-') {
            &text[1..]
        } else {
            normalised.push(arg);
            continue;
        };

        if !flag.contains('=') && !matches!(flag, "help" | "version") {
            expecting_value = true;
        }
        normalised.push(format!("--{flag}").into());
    }

    normalised
}

/// Parse raw process arguments into an [`Action`], checking every required flag.
///
/// Nothing here touches credentials or the network.
pub fn parse_action<I, T>(args: I) -> Result<Action, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let cli = Cli::try_parse_from(normalise_flags(args))?;
    cli.into_action()
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Cli {
    pub fn into_action(self) -> Result<Action, UsageError> {
        let action = self
            .action
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or(UsageError::MissingAction)?;

        match action {
            "publish" => {
                let missing: Vec<&'static str> = [
                    ("-patient-id", &self.patient_id),
                    ("-first-name", &self.first_name),
                    ("-last-name", &self.last_name),
                    ("-dob", &self.dob),
                    ("-sex", &self.sex),
                    ("-mother-nin", &self.mother_nin),
                    ("-father-nin", &self.father_nin),
                ]
                .into_iter()
                .filter(|(_, value)| !present(value))
                .map(|(flag, _)| flag)
                .collect();
                if !missing.is_empty() {
                    return Err(UsageError::MissingFlags {
                        action: "publish",
                        flags: missing,
                    });
                }

                let patient = NewPatient::new(
                    self.patient_id.unwrap_or_default(),
                    self.first_name.unwrap_or_default(),
                    self.last_name.unwrap_or_default(),
                    self.dob.unwrap_or_default(),
                    self.sex.unwrap_or_default(),
                    self.mother_nin.unwrap_or_default(),
                    self.father_nin.unwrap_or_default(),
                )?
                .with_family_medical_history(self.family_history)
                .with_allergy(self.allergies)
                .with_chronic_illnesses(self.chronic_illnesses)
                .with_amended_from(self.amended_from.unwrap_or_default());
                Ok(Action::Publish(patient))
            }
            "get" => match self.patient_id {
                Some(nin) if !nin.trim().is_empty() => Ok(Action::Get { nin }),
                _ => Err(UsageError::MissingFlags {
                    action: "get",
                    flags: vec!["-patient-id"],
                }),
            },
            "get-all" => Ok(Action::GetAll),
            other => Err(UsageError::UnknownAction(other.to_string())),
        }
    }
}
