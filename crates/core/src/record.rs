//! Patient records as returned by the document store, and their display form.
//!
//! The core treats a [`Record`] as an opaque JSON payload keyed by its [`RecordId`]. Only the
//! details screen looks inside, through [`PatientDetails::from_record`], and it checks nothing
//! beyond the presence of the fields it shows.

use crate::constants::{DISPLAY_DATE_FORMAT, PATIENT_ID_DISPLAY_WIDTH};
use crate::error::{PatientError, PatientResult};
use chrono::{DateTime, NaiveDate, Utc};
use records_types::RecordId;
use serde::Serialize;
use serde_json::{Map, Value};

/// One stored patient document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: RecordId, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }
}

/// A labelled line of the details screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

/// Display-ready view of a patient record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientDetails {
    pub id: RecordId,
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date: String,
    pub sex: String,
    pub blood_pressure: String,
    pub cholesterol_level: String,
    pub history_of_stroke: String,
    pub history_of_diabetes: String,
    pub smoker: String,
    pub risk_result: Option<String>,
}

impl PatientDetails {
    /// Builds the display form of `record`.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::MissingField`] when a displayed field is absent and
    /// [`PatientError::InvalidField`] when the timestamp cannot be read as a date.
    pub fn from_record(record: &Record) -> PatientResult<Self> {
        let fields = &record.fields;

        Ok(Self {
            id: record.id.clone(),
            patient_id: pad_patient_id(&scalar_text(required(fields, "patientID")?)),
            first_name: scalar_text(required(fields, "firstname")?),
            last_name: scalar_text(required(fields, "lastname")?),
            date: format_timestamp(required(fields, "timestamp")?)?,
            sex: scalar_text(required(fields, "sex")?),
            blood_pressure: scalar_text(required(fields, "blood_pressure")?),
            cholesterol_level: scalar_text(required(fields, "cholesterol_level")?),
            history_of_stroke: scalar_text(required(fields, "history_of_stroke")?),
            history_of_diabetes: scalar_text(required(fields, "history_of_diabetes")?),
            smoker: scalar_text(required(fields, "smoker")?),
            risk_result: fields
                .get("risk_result")
                .filter(|v| is_present(v))
                .map(scalar_text),
        })
    }

    /// Rows in screen order. The risk result row only appears when a result exists.
    pub fn rows(&self) -> Vec<DetailRow> {
        let mut rows = vec![
            row("Patient ID", &self.patient_id),
            row("First Name", &self.first_name),
            row("Last Name", &self.last_name),
            row("Date", &self.date),
            row("Sex", &self.sex),
            row("Blood Pressure", &self.blood_pressure),
            row("Cholesterol Level", &self.cholesterol_level),
            row("Stroke History", &self.history_of_stroke),
            row("Diabetes History", &self.history_of_diabetes),
            row("Smoker", &self.smoker),
        ];
        if let Some(risk) = &self.risk_result {
            rows.push(row("Risk Result", risk));
        }
        rows
    }
}

fn row(label: &'static str, value: &str) -> DetailRow {
    DetailRow {
        label,
        value: value.to_string(),
    }
}

fn required<'a>(fields: &'a Map<String, Value>, name: &'static str) -> PatientResult<&'a Value> {
    match fields.get(name) {
        Some(Value::Null) | None => Err(PatientError::MissingField(name)),
        Some(value) => Ok(value),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Left-pads the patient number with zeros to the display width.
pub fn pad_patient_id(raw: &str) -> String {
    format!("{:0>width$}", raw, width = PATIENT_ID_DISPLAY_WIDTH)
}

/// Formats a stored timestamp as `MM/dd/yyyy`.
///
/// Accepts RFC 3339 strings, plain `YYYY-MM-DD` dates, and document-store timestamp objects
/// carrying `seconds` (or `_seconds`) and optional `nanoseconds`.
pub fn format_timestamp(value: &Value) -> PatientResult<String> {
    let invalid = |reason: String| PatientError::InvalidField {
        field: "timestamp",
        reason,
    };

    let parsed: DateTime<Utc> = match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                dt.with_timezone(&Utc)
            } else {
                let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| invalid(format!("{s:?}: {e}")))?;
                return Ok(date.format(DISPLAY_DATE_FORMAT).to_string());
            }
        }
        Value::Object(obj) => {
            let seconds = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(Value::as_i64)
                .ok_or_else(|| invalid("timestamp object without seconds".into()))?;
            let nanos = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos)
                .map_err(|_| invalid(format!("nanoseconds out of range: {nanos}")))?;
            DateTime::from_timestamp(seconds, nanos)
                .ok_or_else(|| invalid(format!("seconds out of range: {seconds}")))?
        }
        other => return Err(invalid(format!("unsupported value {other}"))),
    };

    Ok(parsed.format(DISPLAY_DATE_FORMAT).to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_record(id: &str) -> Record {
        let fields = json!({
            "patientID": 7,
            "firstname": "Jane",
            "lastname": "Doe",
            "timestamp": "2024-03-05T10:15:00Z",
            "sex": "Female",
            "blood_pressure": "High",
            "cholesterol_level": "Normal",
            "history_of_stroke": "No",
            "history_of_diabetes": "Yes",
            "smoker": "No",
        });
        let Value::Object(fields) = fields else {
            unreachable!("literal is an object")
        };
        Record::new(RecordId::parse(id).unwrap(), fields)
    }

    #[test]
    fn test_from_record_renders_all_fields() {
        let record = sample_record("p42");
        let details = PatientDetails::from_record(&record).expect("record should render");

        assert_eq!(details.patient_id, "0007");
        assert_eq!(details.first_name, "Jane");
        assert_eq!(details.last_name, "Doe");
        assert_eq!(details.date, "03/05/2024");
        assert_eq!(details.history_of_diabetes, "Yes");
        assert_eq!(details.risk_result, None);
        assert_eq!(details.rows().len(), 10);
    }

    #[test]
    fn test_risk_result_row_only_when_present() {
        let mut record = sample_record("p42");
        record
            .fields
            .insert("risk_result".into(), json!("High risk"));
        let details = PatientDetails::from_record(&record).unwrap();
        let last = details.rows().pop().unwrap();
        assert_eq!(last.label, "Risk Result");
        assert_eq!(last.value, "High risk");

        record.fields.insert("risk_result".into(), json!(""));
        let details = PatientDetails::from_record(&record).unwrap();
        assert_eq!(details.risk_result, None);
    }

    #[test]
    fn test_missing_field_is_reported() {
        let mut record = sample_record("p42");
        record.fields.remove("smoker");
        let err = PatientDetails::from_record(&record).expect_err("smoker is required");
        assert!(matches!(err, PatientError::MissingField("smoker")));
    }

    #[test]
    fn test_pad_patient_id() {
        assert_eq!(pad_patient_id("7"), "0007");
        assert_eq!(pad_patient_id("123"), "0123");
        assert_eq!(pad_patient_id("12345"), "12345");
    }

    #[test]
    fn test_string_patient_id_is_padded() {
        let mut record = sample_record("p42");
        record.fields.insert("patientID".into(), json!("42"));
        let details = PatientDetails::from_record(&record).unwrap();
        assert_eq!(details.patient_id, "0042");
    }

    #[test]
    fn test_format_timestamp_variants() {
        assert_eq!(
            format_timestamp(&json!({"seconds": 1_700_000_000, "nanoseconds": 0})).unwrap(),
            "11/14/2023"
        );
        assert_eq!(
            format_timestamp(&json!({"_seconds": 0})).unwrap(),
            "01/01/1970"
        );
        assert_eq!(format_timestamp(&json!("2023-12-31")).unwrap(), "12/31/2023");
        assert!(format_timestamp(&json!("yesterday")).is_err());
        assert!(format_timestamp(&json!(12)).is_err());
    }

    #[test]
    fn test_out_of_range_nanoseconds_are_rejected() {
        let err = format_timestamp(&json!({"seconds": 0, "nanoseconds": 5_000_000_000u64}))
            .expect_err("nanoseconds beyond u32 must not wrap into a valid date");
        assert!(matches!(
            err,
            PatientError::InvalidField { field: "timestamp", .. }
        ));
    }
}
