//! Feature Layout - request fields to training-time columns
//!
//! The classifier is positional. Rows are built by column NAME and then
//! ordered by the artifact's `feature_names`, never by the declaration
//! order of [`StudentRecord`].

use crate::models::StudentRecord;

/// Request field → training column, one entry per record field
pub const FEATURE_MAPPING: [(&str, &str); 14] = [
    ("age_at_enrollment", "Age at enrollment"),
    ("gender", "Gender"),
    ("marital_status", "Marital status"),
    ("admission_grade", "Admission grade"),
    ("daytime_evening_attendance", "Daytime/evening attendance"),
    ("scholarship_holder", "Scholarship holder"),
    ("tuition_fees_up_to_date", "Tuition fees up to date"),
    ("curricular_units_1st_sem_enrolled", "Curricular units 1st sem (enrolled)"),
    ("curricular_units_1st_sem_approved", "Curricular units 1st sem (approved)"),
    ("curricular_units_1st_sem_grade", "Curricular units 1st sem (grade)"),
    ("curricular_units_2nd_sem_enrolled", "Curricular units 2nd sem (enrolled)"),
    ("curricular_units_2nd_sem_approved", "Curricular units 2nd sem (approved)"),
    ("curricular_units_2nd_sem_grade", "Curricular units 2nd sem (grade)"),
    ("unemployment_rate", "Unemployment rate"),
];

const FEATURE_DESCRIPTIONS: [(&str, &str); 14] = [
    ("Age at enrollment", "Student age at enrollment (16-80 years)"),
    ("Gender", "Gender (0=Female, 1=Male)"),
    ("Marital status", "Marital status (1=Single, 2=Married, 3=Divorced, 4=Widowed)"),
    ("Admission grade", "Admission grade (0-200)"),
    ("Daytime/evening attendance", "Attendance period (0=Evening, 1=Daytime)"),
    ("Scholarship holder", "Scholarship holder (0=No, 1=Yes)"),
    ("Tuition fees up to date", "Tuition fees up to date (0=No, 1=Yes)"),
    ("Curricular units 1st sem (enrolled)", "Curricular units enrolled in the 1st semester"),
    ("Curricular units 1st sem (approved)", "Curricular units approved in the 1st semester"),
    ("Curricular units 1st sem (grade)", "Average grade in the 1st semester (0-20)"),
    ("Curricular units 2nd sem (enrolled)", "Curricular units enrolled in the 2nd semester"),
    ("Curricular units 2nd sem (approved)", "Curricular units approved in the 2nd semester"),
    ("Curricular units 2nd sem (grade)", "Average grade in the 2nd semester (0-20)"),
    ("Unemployment rate", "Unemployment rate (%)"),
];

pub const DESCRIPTION_UNAVAILABLE: &str = "Description not available";

/// Human-readable description of a training column
pub fn describe(column: &str) -> &'static str {
    FEATURE_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, description)| *description)
        .unwrap_or(DESCRIPTION_UNAVAILABLE)
}

/// Record values keyed by training column name
pub fn to_columns(record: &StudentRecord) -> [(&'static str, f64); 14] {
    let values = [
        record.age_at_enrollment as f64,
        record.gender as f64,
        record.marital_status as f64,
        record.admission_grade,
        record.daytime_evening_attendance as f64,
        record.scholarship_holder as f64,
        record.tuition_fees_up_to_date as f64,
        record.curricular_units_1st_sem_enrolled as f64,
        record.curricular_units_1st_sem_approved as f64,
        record.curricular_units_1st_sem_grade,
        record.curricular_units_2nd_sem_enrolled as f64,
        record.curricular_units_2nd_sem_approved as f64,
        record.curricular_units_2nd_sem_grade,
        record.unemployment_rate,
    ];

    let mut columns = [("", 0.0); 14];
    let named = FEATURE_MAPPING.iter().zip(values);
    for (slot, ((_, column), value)) in columns.iter_mut().zip(named) {
        *slot = (*column, value);
    }
    columns
}

/// Build the single classifier row, ordered by `feature_names`.
///
/// Fails with the list of columns the record cannot supply.
pub fn build_row(record: &StudentRecord, feature_names: &[String]) -> Result<Vec<f64>, String> {
    let columns = to_columns(record);
    let mut row = Vec::with_capacity(feature_names.len());
    let mut missing = Vec::new();

    for name in feature_names {
        match columns.iter().find(|(column, _)| column == name) {
            Some((_, value)) => row.push(*value),
            None => missing.push(name.as_str()),
        }
    }

    if missing.is_empty() {
        Ok(row)
    } else {
        Err(format!("columns {:?} not in record", missing))
    }
}
