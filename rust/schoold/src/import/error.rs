use thiserror::Error;

/// Failures that abort a whole import before any row is validated.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read CSV file: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("CSV appears empty or invalid.")]
    Empty,

    #[error("CSV missing required columns: {expected}")]
    MissingColumns {
        expected: String,
        missing: Vec<String>,
    },

    #[error("CSV has {rows} data rows; the limit is {limit}.")]
    TooManyRows { rows: usize, limit: usize },
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::Unreadable(_) => "import_read_failed",
            ImportError::Empty | ImportError::MissingColumns { .. } | ImportError::TooManyRows { .. } => {
                "import_structural"
            }
        }
    }
}

/// Reason a single row was rejected. Attached to the row, never aborts the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid parent email")]
    InvalidEmail,

    #[error("Fee status must be Paid, Pending or Partial")]
    InvalidFeeStatus,

    #[error("Marks must be number between 0-100")]
    InvalidMarks,
}

impl RowError {
    pub fn code(&self) -> &'static str {
        match self {
            RowError::MissingFields => "missing_field",
            RowError::InvalidEmail => "invalid_format",
            RowError::InvalidFeeStatus | RowError::InvalidMarks => "invalid_domain",
        }
    }
}
