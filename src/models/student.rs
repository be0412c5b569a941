//! Student record - the 14-field prediction input
//!
//! The request body arrives as untyped JSON. [`StudentRecord::from_json`] is
//! the single validate-and-construct entry point: every field's coercion rule
//! is spelled out there and every problem is reported, not just the first.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Request field names in declaration order
pub const FIELD_NAMES: [&str; 14] = [
    "age_at_enrollment",
    "gender",
    "marital_status",
    "admission_grade",
    "daytime_evening_attendance",
    "scholarship_holder",
    "tuition_fees_up_to_date",
    "curricular_units_1st_sem_enrolled",
    "curricular_units_1st_sem_approved",
    "curricular_units_1st_sem_grade",
    "curricular_units_2nd_sem_enrolled",
    "curricular_units_2nd_sem_approved",
    "curricular_units_2nd_sem_grade",
    "unemployment_rate",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    // Personal
    pub age_at_enrollment: i64,
    /// 0 = female, 1 = male
    pub gender: i64,
    /// 1 = single, 2 = married, 3 = divorced, 4 = widowed
    pub marital_status: i64,

    // Academic
    /// 0-200
    pub admission_grade: f64,
    /// 0 = evening, 1 = daytime
    pub daytime_evening_attendance: i64,

    // Financial
    pub scholarship_holder: i64,
    pub tuition_fees_up_to_date: i64,

    // 1st semester
    pub curricular_units_1st_sem_enrolled: i64,
    pub curricular_units_1st_sem_approved: i64,
    /// 0-20
    pub curricular_units_1st_sem_grade: f64,

    // 2nd semester
    pub curricular_units_2nd_sem_enrolled: i64,
    pub curricular_units_2nd_sem_approved: i64,
    /// 0-20
    pub curricular_units_2nd_sem_grade: f64,

    // Economic context
    /// Percent
    pub unemployment_rate: f64,
}

/// A problem with one request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field problem found in one request body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation errors: {}", join_messages(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Error for a body that is not a JSON object at all
    pub fn body(message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: "body".to_string(),
                message: message.into(),
            }],
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

impl StudentRecord {
    /// Validate an untyped JSON body and build a record.
    ///
    /// Integers accept JSON integers, booleans, finite floats (truncated)
    /// and numeric strings. Floats accept JSON numbers, booleans and
    /// numeric strings. Unknown keys are ignored.
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let Some(map) = body.as_object() else {
            return Err(ValidationErrors::body(format!(
                "Request body must be a JSON object, got {}",
                json_type_name(body)
            )));
        };

        let mut reader = FieldReader::new(map);
        let record = Self {
            age_at_enrollment: reader.int("age_at_enrollment"),
            gender: reader.int("gender"),
            marital_status: reader.int("marital_status"),
            admission_grade: reader.float("admission_grade"),
            daytime_evening_attendance: reader.int("daytime_evening_attendance"),
            scholarship_holder: reader.int("scholarship_holder"),
            tuition_fees_up_to_date: reader.int("tuition_fees_up_to_date"),
            curricular_units_1st_sem_enrolled: reader.int("curricular_units_1st_sem_enrolled"),
            curricular_units_1st_sem_approved: reader.int("curricular_units_1st_sem_approved"),
            curricular_units_1st_sem_grade: reader.float("curricular_units_1st_sem_grade"),
            curricular_units_2nd_sem_enrolled: reader.int("curricular_units_2nd_sem_enrolled"),
            curricular_units_2nd_sem_approved: reader.int("curricular_units_2nd_sem_approved"),
            curricular_units_2nd_sem_grade: reader.float("curricular_units_2nd_sem_grade"),
            unemployment_rate: reader.float("unemployment_rate"),
        };

        reader.finish().map(|()| record)
    }

    /// Canonical example used by `/api/predict-example`
    pub fn example() -> Self {
        Self {
            age_at_enrollment: 18,
            gender: 0,
            marital_status: 1,
            admission_grade: 140.0,
            daytime_evening_attendance: 1,
            scholarship_holder: 1,
            tuition_fees_up_to_date: 1,
            curricular_units_1st_sem_enrolled: 8,
            curricular_units_1st_sem_approved: 8,
            curricular_units_1st_sem_grade: 14.0,
            curricular_units_2nd_sem_enrolled: 8,
            curricular_units_2nd_sem_approved: 8,
            curricular_units_2nd_sem_grade: 14.5,
            unemployment_rate: 10.8,
        }
    }
}

/// Collects field values and errors in one pass
struct FieldReader<'a> {
    body: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    fn new(body: &'a Map<String, Value>) -> Self {
        Self {
            body,
            errors: Vec::new(),
        }
    }

    fn int(&mut self, field: &str) -> i64 {
        let Some(value) = self.lookup(field) else {
            return 0;
        };
        match coerce_int(value) {
            Some(v) => v,
            None => {
                self.type_error(field, "int", value);
                0
            }
        }
    }

    fn float(&mut self, field: &str) -> f64 {
        let Some(value) = self.lookup(field) else {
            return 0.0;
        };
        match coerce_float(value) {
            Some(v) => v,
            None => {
                self.type_error(field, "float", value);
                0.0
            }
        }
    }

    fn lookup(&mut self, field: &str) -> Option<&'a Value> {
        let value = self.body.get(field);
        if value.is_none() {
            self.errors.push(FieldError {
                field: field.to_string(),
                message: format!("Field '{}' is required", field),
            });
        }
        value
    }

    fn type_error(&mut self, field: &str, expected: &str, value: &Value) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: format!(
                "Field '{}' must be of type {}, got {}",
                field,
                expected,
                json_type_name(value)
            ),
        });
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors: self.errors })
        }
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.trunc() as i64)
        }),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
