use super::error::RowError;
use super::header::{HeaderMap, MARK_COLUMNS, STUDENT_COLUMNS};
use crate::model::FeeStatus;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Outcome of validating one row. Both arms keep the raw cells as they appeared in the file;
/// a valid row also carries the typed value ready to merge, an invalid one the first reason it
/// was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<V, R> {
    Valid { raw: R, value: V },
    Invalid { raw: R, error: RowError },
}

impl<V, R> Parsed<V, R> {
    pub fn valid(&self) -> Option<&V> {
        match self {
            Parsed::Valid { value, .. } => Some(value),
            Parsed::Invalid { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RowError> {
        match self {
            Parsed::Valid { .. } => None,
            Parsed::Invalid { error, .. } => Some(error),
        }
    }
}

/// Cells of a student row as they appeared in the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub name: String,
    pub class: String,
    pub roll_no: String,
    pub parent_email: String,
    pub parent_password: String,
    pub fee_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub class: String,
    pub roll_no: String,
    pub parent_email: String,
    pub parent_password: String,
    pub fee_status: FeeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRow {
    pub roll_no: String,
    pub student_name: String,
    pub marks: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRecord {
    pub roll_no: String,
    pub student_name: String,
    pub score: f64,
}

pub type StudentRecord = Parsed<NewStudent, StudentRow>;
pub type MarkImportRecord = Parsed<MarkRecord, MarkRow>;

pub fn is_valid_email(s: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
        .is_match(s)
}

/// Score in [0, 100]. Non-numeric and non-finite input is rejected, never clamped.
pub fn parse_score(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() && (0.0..=100.0).contains(&v) {
        Some(v)
    } else {
        None
    }
}

/// `None` when the row has fewer cells than there are required columns.
pub fn validate_student_row(row: &[String], header: &HeaderMap) -> Option<StudentRecord> {
    if row.len() < STUDENT_COLUMNS.len() {
        return None;
    }

    let raw = StudentRow {
        name: header.cell(row, "name").to_string(),
        class: header.cell(row, "class").to_string(),
        roll_no: header.cell(row, "roll no").to_string(),
        parent_email: header.cell(row, "parent email").to_string(),
        parent_password: header.cell(row, "parent password").to_string(),
        fee_status: header.cell(row, "fee status").to_string(),
    };

    let any_blank = [
        &raw.name,
        &raw.class,
        &raw.roll_no,
        &raw.parent_email,
        &raw.parent_password,
        &raw.fee_status,
    ]
    .iter()
    .any(|f| f.trim().is_empty());
    if any_blank {
        return Some(Parsed::Invalid {
            raw,
            error: RowError::MissingFields,
        });
    }
    if !is_valid_email(&raw.parent_email) {
        return Some(Parsed::Invalid {
            raw,
            error: RowError::InvalidEmail,
        });
    }
    let Some(fee_status) = FeeStatus::parse(&raw.fee_status) else {
        return Some(Parsed::Invalid {
            raw,
            error: RowError::InvalidFeeStatus,
        });
    };

    let value = NewStudent {
        name: raw.name.clone(),
        class: raw.class.clone(),
        roll_no: raw.roll_no.clone(),
        parent_email: raw.parent_email.clone(),
        parent_password: raw.parent_password.clone(),
        fee_status,
    };
    Some(Parsed::Valid { raw, value })
}

pub fn validate_mark_row(row: &[String], header: &HeaderMap) -> Option<MarkImportRecord> {
    if row.len() < MARK_COLUMNS.len() {
        return None;
    }

    let raw = MarkRow {
        roll_no: header.cell(row, "rollno").to_string(),
        student_name: header.cell(row, "studentname").to_string(),
        marks: header.cell(row, "marks").to_string(),
    };

    if raw.roll_no.trim().is_empty()
        || raw.student_name.trim().is_empty()
        || raw.marks.trim().is_empty()
    {
        return Some(Parsed::Invalid {
            raw,
            error: RowError::MissingFields,
        });
    }
    let Some(score) = parse_score(&raw.marks) else {
        return Some(Parsed::Invalid {
            raw,
            error: RowError::InvalidMarks,
        });
    };

    let value = MarkRecord {
        roll_no: raw.roll_no.clone(),
        student_name: raw.student_name.clone(),
        score,
    };
    Some(Parsed::Valid { raw, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(line: &str) -> Vec<String> {
        line.split(',').map(|s| s.trim().to_string()).collect()
    }

    fn student_header() -> HeaderMap {
        HeaderMap::resolve(
            &cells("Name,Class,Roll No,Parent Email,Parent Password,Fee Status"),
            &STUDENT_COLUMNS,
            "",
        )
        .expect("student header")
    }

    fn mark_header() -> HeaderMap {
        HeaderMap::resolve(&cells("RollNo,StudentName,Marks"), &MARK_COLUMNS, "")
            .expect("mark header")
    }

    #[test]
    fn valid_student_row_types_fee_status() {
        let r = validate_student_row(
            &cells("John Doe,12-A,12A01,parent1@example.com,parent123,paid"),
            &student_header(),
        )
        .expect("row kept");
        let v = r.valid().expect("valid");
        assert_eq!(v.fee_status, FeeStatus::Paid);
        assert_eq!(v.roll_no, "12A01");
    }

    #[test]
    fn presence_is_checked_before_format() {
        let r = validate_student_row(
            &cells("John Doe,12-A,,not-an-email,parent123,Unknown"),
            &student_header(),
        )
        .expect("row kept");
        assert_eq!(r.error(), Some(&RowError::MissingFields));
    }

    #[test]
    fn format_is_checked_before_domain() {
        let r = validate_student_row(
            &cells("John Doe,12-A,12A01,not-an-email,parent123,Unknown"),
            &student_header(),
        )
        .expect("row kept");
        assert_eq!(r.error(), Some(&RowError::InvalidEmail));
        assert_eq!(r.error().map(|e| e.code()), Some("invalid_format"));
    }

    #[test]
    fn unknown_fee_status_is_a_domain_error() {
        let r = validate_student_row(
            &cells("John Doe,12-A,12A01,p@example.com,parent123,Waived"),
            &student_header(),
        )
        .expect("row kept");
        assert_eq!(r.error(), Some(&RowError::InvalidFeeStatus));
        assert_eq!(r.error().map(|e| e.code()), Some("invalid_domain"));
    }

    #[test]
    fn short_rows_are_dropped() {
        assert!(validate_student_row(&cells("John Doe,12-A,12A01"), &student_header()).is_none());
        assert!(validate_mark_row(&cells("12A01,John"), &mark_header()).is_none());
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
    }

    #[test]
    fn marks_outside_range_are_rejected_not_clamped() {
        let h = mark_header();
        for bad in ["150", "-1", "100.5", "abc", "NaN", "inf"] {
            let r = validate_mark_row(&cells(&format!("12A01,John Doe,{bad}")), &h)
                .expect("row kept");
            assert_eq!(r.error(), Some(&RowError::InvalidMarks), "input {bad}");
            assert_eq!(r.error().map(|e| e.to_string()).as_deref(), Some("Marks must be number between 0-100"));
        }
        for good in ["0", "100", "72.5"] {
            let r = validate_mark_row(&cells(&format!("12A01,John Doe,{good}")), &h)
                .expect("row kept");
            let v = r.valid().expect("valid");
            assert!((0.0..=100.0).contains(&v.score));
        }
    }

    #[test]
    fn blank_marks_is_missing_field() {
        let r = validate_mark_row(&cells("12A01,John Doe,"), &mark_header()).expect("row kept");
        assert_eq!(r.error(), Some(&RowError::MissingFields));
    }
}
