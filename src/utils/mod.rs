use thiserror::Error;

/// Precondition failures raised while preparing or decomposing a table.
///
/// Every variant names the column, row or counts that triggered it so callers
/// can report the failure without further inspection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("no columns were selected for analysis")]
    EmptySelection,

    #[error("column `{0}` is not present in the table")]
    UnknownColumn(String),

    #[error("column `{column}` has a missing value in row {row}")]
    MissingValue { column: String, row: usize },

    #[error("column `{column}` holds a non-numeric value in row {row}")]
    NonNumeric { column: String, row: usize },

    #[error("{rows} complete rows remain but at least {required} are required")]
    InsufficientRows { rows: usize, required: usize },

    #[error("column `{column}` has zero variance and cannot be scaled")]
    ZeroVariance { column: String },

    #[error("expected {expected} columns, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("component {index} is out of range ({available} available)")]
    ComponentOutOfRange { index: usize, available: usize },

    #[error("decomposition failed: {0}")]
    Decomposition(String),
}

pub(crate) fn column_names<C: AsRef<str>>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.as_ref().to_string()).collect()
}
