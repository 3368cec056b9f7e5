use super::error::ImportError;
use std::collections::HashMap;

pub const STUDENT_COLUMNS: [&str; 6] = [
    "name",
    "class",
    "roll no",
    "parent email",
    "parent password",
    "fee status",
];

pub const MARK_COLUMNS: [&str; 3] = ["rollno", "studentname", "marks"];

/// Required column name -> index in the header row.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    indices: HashMap<&'static str, usize>,
}

impl HeaderMap {
    /// First occurrence wins when a header repeats a column name.
    pub fn resolve(
        header: &[String],
        required: &[&'static str],
        expected_label: &str,
    ) -> Result<Self, ImportError> {
        let lowered = header
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect::<Vec<_>>();

        let mut indices = HashMap::new();
        let mut missing = Vec::new();
        for &name in required {
            match lowered.iter().position(|h| h == name) {
                Some(i) => {
                    indices.insert(name, i);
                }
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ImportError::MissingColumns {
                expected: expected_label.to_string(),
                missing,
            });
        }
        Ok(Self { indices })
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// Cell for `name`, or "" when the row is too short or the column is unknown.
    pub fn cell<'a>(&self, row: &'a [String], name: &str) -> &'a str {
        self.index(name)
            .and_then(|i| row.get(i))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}
