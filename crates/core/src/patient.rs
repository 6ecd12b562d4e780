//! Patient records and the operations that read and create them on the ledger.
//!
//! Every field is an opaque string. Uniqueness of the national identifier and any format rules
//! are the chaincode's business. The client only checks that required fields are present
//! before creating a record.

use crate::constants::{
    CREATE_PATIENT_TRANSACTION, GET_ALL_PATIENTS_TRANSACTION, READ_PATIENT_TRANSACTION,
    UNSET_MEDICAL_FIELD,
};
use crate::{Contract, LedgerError, LedgerResult};
use serde::{Deserialize, Deserializer, Serialize};

/// A patient record as stored by the registry chaincode.
///
/// Fields missing from a ledger response, or set to `null`, decode as empty strings. Unknown
/// fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientRecord {
    /// National identification number. The record's unique key.
    #[serde(deserialize_with = "null_as_empty")]
    pub nin: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub date_of_birth: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub sex: String,
    /// National identification number of the patient's mother.
    #[serde(deserialize_with = "null_as_empty")]
    pub mother_nin: String,
    /// National identification number of the patient's father.
    #[serde(deserialize_with = "null_as_empty")]
    pub father_nin: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub family_medical_history: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub allergy: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub chronic_illnesses: String,
    /// Who submitted or amended this record.
    #[serde(deserialize_with = "null_as_empty")]
    pub amended_from: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Input for creating a patient record.
///
/// Construct with [`NewPatient::new`], which checks the required fields, then fill the optional
/// ones with the `with_*` methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPatient {
    nin: String,
    first_name: String,
    last_name: String,
    date_of_birth: String,
    sex: String,
    mother_nin: String,
    father_nin: String,
    family_medical_history: String,
    allergy: String,
    chronic_illnesses: String,
    amended_from: String,
}

impl NewPatient {
    /// Create the input for a new record.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidInput` naming every required field that is empty or blank.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nin: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: impl Into<String>,
        sex: impl Into<String>,
        mother_nin: impl Into<String>,
        father_nin: impl Into<String>,
    ) -> LedgerResult<Self> {
        let patient = Self {
            nin: nin.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: date_of_birth.into(),
            sex: sex.into(),
            mother_nin: mother_nin.into(),
            father_nin: father_nin.into(),
            family_medical_history: UNSET_MEDICAL_FIELD.to_string(),
            allergy: UNSET_MEDICAL_FIELD.to_string(),
            chronic_illnesses: UNSET_MEDICAL_FIELD.to_string(),
            amended_from: String::new(),
        };

        let missing = patient.missing_required_fields();
        if !missing.is_empty() {
            return Err(LedgerError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        Ok(patient)
    }

    fn missing_required_fields(&self) -> Vec<&'static str> {
        [
            ("nin", &self.nin),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("date_of_birth", &self.date_of_birth),
            ("sex", &self.sex),
            ("mother_nin", &self.mother_nin),
            ("father_nin", &self.father_nin),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn with_family_medical_history(mut self, value: impl Into<String>) -> Self {
        self.family_medical_history = value.into();
        self
    }

    pub fn with_allergy(mut self, value: impl Into<String>) -> Self {
        self.allergy = value.into();
        self
    }

    pub fn with_chronic_illnesses(mut self, value: impl Into<String>) -> Self {
        self.chronic_illnesses = value.into();
        self
    }

    pub fn with_amended_from(mut self, value: impl Into<String>) -> Self {
        self.amended_from = value.into();
        self
    }

    pub fn nin(&self) -> &str {
        &self.nin
    }

    /// The `CreatePatient` arguments, in the order the chaincode expects them.
    pub fn transaction_args(&self) -> [&str; 11] {
        [
            &self.nin,
            &self.first_name,
            &self.last_name,
            &self.date_of_birth,
            &self.sex,
            &self.mother_nin,
            &self.father_nin,
            &self.family_medical_history,
            &self.allergy,
            &self.chronic_illnesses,
            &self.amended_from,
        ]
    }
}

/// Patient operations over a ledger contract. Holds no state beyond the contract handle.
#[derive(Clone, Debug)]
pub struct PatientService<C> {
    contract: C,
}

impl<C: Contract> PatientService<C> {
    pub fn new(contract: C) -> Self {
        Self { contract }
    }

    /// Read one patient by national identifier.
    ///
    /// # Errors
    ///
    /// Remote failures keep their [`crate::ErrorKind::Remote`] kind. A response that is not a
    /// patient record is `LedgerError::Deserialization`. A `null` result is an empty record.
    pub async fn read_patient(&self, nin: &str) -> LedgerResult<PatientRecord> {
        let bytes = self
            .contract
            .evaluate(READ_PATIENT_TRANSACTION, &[nin])
            .await?;
        let patient: Option<PatientRecord> =
            serde_json::from_slice(&bytes).map_err(LedgerError::Deserialization)?;
        Ok(patient.unwrap_or_default())
    }

    /// Read every patient on the ledger. An empty or `null` result is an empty list.
    pub async fn get_all_patients(&self) -> LedgerResult<Vec<PatientRecord>> {
        let bytes = self
            .contract
            .evaluate(GET_ALL_PATIENTS_TRANSACTION, &[])
            .await?;
        let patients: Option<Vec<PatientRecord>> =
            serde_json::from_slice(&bytes).map_err(LedgerError::Deserialization)?;
        Ok(patients.unwrap_or_default())
    }

    /// Record a new patient and wait for the transaction to commit.
    pub async fn create_patient(&self, patient: &NewPatient) -> LedgerResult<()> {
        tracing::info!("creating patient record");
        self.contract
            .submit(CREATE_PATIENT_TRANSACTION, &patient.transaction_args())
            .await?;
        Ok(())
    }

    pub fn into_contract(self) -> C {
        self.contract
    }
}
