//! CSV import of students and marks.
//!
//! Text goes through [`parser::parse_rows`], the header row through [`header::HeaderMap`], and
//! each data row through a validator that yields a [`validate::Parsed`] record. Nothing here
//! touches the record store: the merge functions take a collection and return a new one.

pub mod error;
pub mod header;
pub mod merge;
pub mod parser;
pub mod validate;

pub use error::{ImportError, RowError};
pub use merge::{merge_marks, merge_students, MarkMergeOutcome, StudentMergeOutcome};
pub use validate::{MarkImportRecord, MarkRecord, NewStudent, Parsed, StudentRecord};

use header::{HeaderMap, MARK_COLUMNS, STUDENT_COLUMNS};
use std::path::Path;
use tracing::debug;

pub const STUDENT_TEMPLATE_FILE_NAME: &str = "students_template.csv";
pub const STUDENT_TEMPLATE: &str = "Name,Class,Roll No,Parent Email,Parent Password,Fee Status\nJohn Doe,12-A,12A01,parent1@example.com,parent123,Paid";

const STUDENT_COLUMNS_LABEL: &str = "name, class, roll no, parent email, parent password, fee status";
const MARK_COLUMNS_LABEL: &str = "RollNo, StudentName, Marks.";

/// One data row of a previewed file. `line` is 1-based and counts the header as line 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow<T> {
    pub line: usize,
    pub record: T,
}

pub type StudentPreview = Vec<PreviewRow<StudentRecord>>;
pub type MarkPreview = Vec<PreviewRow<MarkImportRecord>>;

pub fn read_import_file(path: &Path) -> Result<String, ImportError> {
    Ok(std::fs::read_to_string(path)?)
}

pub fn valid_records<V: Clone, R>(rows: &[PreviewRow<Parsed<V, R>>]) -> Vec<V> {
    rows.iter()
        .filter_map(|r| r.record.valid().cloned())
        .collect()
}

pub fn parse_student_import(text: &str, max_rows: usize) -> Result<StudentPreview, ImportError> {
    parse_with(text, max_rows, &STUDENT_COLUMNS, STUDENT_COLUMNS_LABEL, validate::validate_student_row)
}

pub fn parse_mark_import(text: &str, max_rows: usize) -> Result<MarkPreview, ImportError> {
    parse_with(text, max_rows, &MARK_COLUMNS, MARK_COLUMNS_LABEL, validate::validate_mark_row)
}

fn parse_with<T>(
    text: &str,
    max_rows: usize,
    required: &[&'static str],
    label: &str,
    validate: impl Fn(&[String], &HeaderMap) -> Option<T>,
) -> Result<Vec<PreviewRow<T>>, ImportError> {
    // Spreadsheet exports may lead with a byte order mark.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rows = parser::parse_rows(text);
    if rows.len() < 2 {
        return Err(ImportError::Empty);
    }
    let data_rows = rows.len() - 1;
    if data_rows > max_rows {
        return Err(ImportError::TooManyRows {
            rows: data_rows,
            limit: max_rows,
        });
    }

    let header = HeaderMap::resolve(&rows[0], required, label)?;
    let out = rows
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(i, row)| {
            validate(row, &header).map(|record| PreviewRow { line: i + 1, record })
        })
        .collect::<Vec<_>>();

    debug!(
        rows = data_rows,
        kept = out.len(),
        dropped = data_rows - out.len(),
        "parsed import rows"
    );
    Ok(out)
}
