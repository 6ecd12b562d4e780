use nhms_cli::{run, EXIT_FAILURE, EXIT_SUCCESS};
use nhms_core::{Connector, Contract, LedgerError, LedgerResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq, Eq)]
struct Call {
    submit: bool,
    transaction: String,
    args: Vec<String>,
}

type Answer = fn() -> LedgerResult<Vec<u8>>;

#[derive(Default)]
struct Ledger {
    connects: Mutex<usize>,
    calls: Arc<Mutex<Vec<Call>>>,
    answers: HashMap<&'static str, Answer>,
    refuse_connection: bool,
}

struct LedgerContract {
    calls: Arc<Mutex<Vec<Call>>>,
    answers: HashMap<&'static str, Answer>,
}

impl LedgerContract {
    fn call(&self, submit: bool, transaction: &str, args: &[&str]) -> LedgerResult<Vec<u8>> {
        self.calls.lock().unwrap().push(Call {
            submit,
            transaction: transaction.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        });
        match self.answers.get(transaction) {
            Some(answer) => answer(),
            None => Ok(Vec::new()),
        }
    }
}

#[tonic::async_trait]
impl Contract for LedgerContract {
    async fn evaluate(&self, transaction: &str, args: &[&str]) -> LedgerResult<Vec<u8>> {
        self.call(false, transaction, args)
    }

    async fn submit(&self, transaction: &str, args: &[&str]) -> LedgerResult<Vec<u8>> {
        self.call(true, transaction, args)
    }
}

#[tonic::async_trait]
impl Connector for Ledger {
    type Contract = LedgerContract;

    async fn connect(&self) -> LedgerResult<LedgerContract> {
        *self.connects.lock().unwrap() += 1;
        if self.refuse_connection {
            return Err(LedgerError::InvalidEndpoint {
                endpoint: "localhost:7051".into(),
                reason: "connection refused".into(),
            });
        }
        Ok(LedgerContract {
            calls: Arc::clone(&self.calls),
            answers: self.answers.clone(),
        })
    }
}

impl Ledger {
    fn answering(transaction: &'static str, answer: Answer) -> Self {
        let mut ledger = Self::default();
        ledger.answers.insert(transaction, answer);
        ledger
    }

    fn connects(&self) -> usize {
        *self.connects.lock().unwrap()
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

struct Output {
    code: u8,
    stdout: String,
    stderr: String,
}

async fn run_client(ledger: &Ledger, args: &[&str]) -> Output {
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let argv = std::iter::once("nhms-client").chain(args.iter().copied());
    let code = run(argv, ledger, &mut out, &mut err).await.unwrap();
    Output {
        code,
        stdout: String::from_utf8(out).unwrap(),
        stderr: String::from_utf8(err).unwrap(),
    }
}

fn alice() -> LedgerResult<Vec<u8>> {
    Ok(br#"{"nin":"111223333","firstName":"Alice","lastName":"Smith","dateOfBirth":"1990-01-01","sex":"F","motherNin":"444","fatherNin":"555","familyMedicalHistory":"None","allergy":"None","chronicIllnesses":"None","amendedFrom":""}"#.to_vec())
}

fn remote_failure() -> LedgerResult<Vec<u8>> {
    Err(LedgerError::ChaincodeResponse {
        status: 500,
        message: "the patient 111223333 does not exist".into(),
    })
}

const PUBLISH_REQUIRED: [&str; 8] = [
    "-action=publish",
    "-patient-id=111223333",
    "-first-name=Alice",
    "-last-name=Smith",
    "-dob=1990-01-01",
    "-sex=F",
    "-mother-nin=444",
    "-father-nin=555",
];

#[tokio::test]
async fn missing_action_fails_without_connecting() {
    let ledger = Ledger::default();
    let output = run_client(&ledger, &["-patient-id=1"]).await;

    assert_eq!(output.code, EXIT_FAILURE);
    assert!(output.stderr.contains("no action specified"));
    assert!(output.stdout.is_empty());
    assert_eq!(ledger.connects(), 0);
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn unknown_action_fails_without_connecting() {
    let ledger = Ledger::default();
    let output = run_client(&ledger, &["-action=delete", "-patient-id=1"]).await;

    assert_eq!(output.code, EXIT_FAILURE);
    assert!(output.stderr.contains("unknown action \"delete\""));
    assert!(output.stderr.contains("Usage:"));
    assert_eq!(ledger.connects(), 0);
}

#[tokio::test]
async fn publish_without_dob_fails_without_connecting() {
    let ledger = Ledger::default();
    let args: Vec<&str> = PUBLISH_REQUIRED
        .iter()
        .copied()
        .filter(|arg| !arg.starts_with("-dob"))
        .collect();
    let output = run_client(&ledger, &args).await;

    assert_eq!(output.code, EXIT_FAILURE);
    assert!(output.stderr.contains("action publish requires -dob"));
    assert_eq!(ledger.connects(), 0);
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn get_without_patient_id_fails_without_connecting() {
    let ledger = Ledger::default();
    let output = run_client(&ledger, &["-action=get"]).await;

    assert_eq!(output.code, EXIT_FAILURE);
    assert!(output.stderr.contains("action get requires -patient-id"));
    assert_eq!(ledger.connects(), 0);
}

#[tokio::test]
async fn get_prints_the_patient_as_one_json_line() {
    let ledger = Ledger::answering("ReadPatient", alice);
    let output = run_client(&ledger, &["-action=get", "-patient-id=111223333"]).await;

    assert_eq!(output.code, EXIT_SUCCESS);
    assert!(output.stdout.contains("111223333"));
    assert!(output.stdout.contains("Alice"));
    assert_eq!(output.stdout.lines().count(), 1);

    let printed: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    let expected: serde_json::Value = serde_json::from_slice(&alice().unwrap()).unwrap();
    assert_eq!(printed, expected);

    assert_eq!(
        ledger.calls(),
        vec![Call {
            submit: false,
            transaction: "ReadPatient".into(),
            args: vec!["111223333".into()],
        }]
    );
}

#[tokio::test]
async fn get_prints_null_fields_as_empty_strings() {
    fn sparse() -> LedgerResult<Vec<u8>> {
        Ok(br#"{"nin":"111223333","firstName":"Alice","amendedFrom":null}"#.to_vec())
    }
    let ledger = Ledger::answering("ReadPatient", sparse);
    let output = run_client(&ledger, &["-action=get", "-patient-id=111223333"]).await;

    assert_eq!(output.code, EXIT_SUCCESS);
    let printed: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(printed["nin"], "111223333");
    assert_eq!(printed["amendedFrom"], "");
    assert_eq!(printed["lastName"], "");
}

#[tokio::test]
async fn padded_action_is_unknown() {
    let ledger = Ledger::default();
    let output = run_client(&ledger, &["-action= get ", "-patient-id=1"]).await;

    assert_eq!(output.code, EXIT_FAILURE);
    assert!(output.stderr.contains("unknown action \" get \""));
    assert_eq!(ledger.connects(), 0);
}

#[tokio::test]
async fn get_accepts_double_dash_flags() {
    let ledger = Ledger::answering("ReadPatient", alice);
    let output = run_client(&ledger, &["--action", "get", "--patient-id", "111223333"]).await;

    assert_eq!(output.code, EXIT_SUCCESS);
    assert!(output.stdout.contains("Alice"));
}

#[tokio::test]
async fn get_all_prints_a_json_array() {
    fn two_patients() -> LedgerResult<Vec<u8>> {
        Ok(br#"[{"nin":"111223333","firstName":"Alice"},{"nin":"999887777","firstName":"Bob"}]"#.to_vec())
    }
    let ledger = Ledger::answering("GetAllPatients", two_patients);
    let output = run_client(&ledger, &["-action=get-all"]).await;

    assert_eq!(output.code, EXIT_SUCCESS);
    let printed: Vec<serde_json::Value> = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(printed.len(), 2);
    assert_eq!(printed[0]["nin"], "111223333");
    assert_eq!(printed[1]["firstName"], "Bob");

    let calls = ledger.calls();
    assert_eq!(calls[0].transaction, "GetAllPatients");
    assert!(calls[0].args.is_empty());
}

#[tokio::test]
async fn empty_ledger_prints_an_empty_array() {
    fn nothing() -> LedgerResult<Vec<u8>> {
        Ok(b"null".to_vec())
    }
    let ledger = Ledger::answering("GetAllPatients", nothing);
    let output = run_client(&ledger, &["-action=get-all"]).await;

    assert_eq!(output.code, EXIT_SUCCESS);
    assert_eq!(output.stdout.trim(), "[]");
}

#[tokio::test]
async fn remote_read_failure_is_reported_not_fatal() {
    for action in [&["-action=get", "-patient-id=111223333"][..], &["-action=get-all"][..]] {
        let mut ledger = Ledger::default();
        ledger.answers.insert("ReadPatient", remote_failure);
        ledger.answers.insert("GetAllPatients", remote_failure);
        let output = run_client(&ledger, action).await;

        assert_eq!(output.code, EXIT_SUCCESS);
        let report: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
        assert_eq!(report["code"], 1);
        assert!(report["message"]
            .as_str()
            .unwrap()
            .contains("does not exist"));
    }
}

#[tokio::test]
async fn malformed_read_response_is_a_decode_report() {
    fn garbage() -> LedgerResult<Vec<u8>> {
        Ok(b"<html>".to_vec())
    }
    let ledger = Ledger::answering("ReadPatient", garbage);
    let output = run_client(&ledger, &["-action=get", "-patient-id=111223333"]).await;

    assert_eq!(output.code, EXIT_SUCCESS);
    let report: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(report["code"], 2);
}

#[tokio::test]
async fn publish_submits_create_patient_in_order() {
    let ledger = Ledger::default();
    let mut args = PUBLISH_REQUIRED.to_vec();
    args.push("-allergies=Peanuts");
    let output = run_client(&ledger, &args).await;

    assert_eq!(output.code, EXIT_SUCCESS);
    assert_eq!(
        output.stdout,
        "Patient with ID 111223333 published successfully.\n"
    );
    assert_eq!(
        ledger.calls(),
        vec![Call {
            submit: true,
            transaction: "CreatePatient".into(),
            args: [
                "111223333",
                "Alice",
                "Smith",
                "1990-01-01",
                "F",
                "444",
                "555",
                "None",
                "Peanuts",
                "None",
                "",
            ]
            .map(String::from)
            .to_vec(),
        }]
    );
}

#[tokio::test]
async fn publish_failure_is_fatal() {
    let ledger = Ledger::answering("CreatePatient", remote_failure);
    let output = run_client(&ledger, &PUBLISH_REQUIRED).await;

    assert_eq!(output.code, EXIT_FAILURE);
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("Failed to submit transaction"));
}

#[tokio::test]
async fn connection_failure_is_fatal() {
    let ledger = Ledger {
        refuse_connection: true,
        ..Ledger::default()
    };
    let output = run_client(&ledger, &["-action=get-all"]).await;

    assert_eq!(output.code, EXIT_FAILURE);
    assert!(output.stderr.contains("Failed to connect to gateway"));
    assert_eq!(ledger.connects(), 1);
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn help_prints_usage_and_succeeds() {
    let ledger = Ledger::default();
    let output = run_client(&ledger, &["-help"]).await;

    assert_eq!(output.code, EXIT_SUCCESS);
    assert!(output.stdout.contains("--patient-id"));
    assert_eq!(ledger.connects(), 0);
}
