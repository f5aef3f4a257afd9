use std::path::PathBuf;

/// Input data that cannot be turned into a model
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Shape mismatch in '{tensor}': expected {expected}, found {found}")]
    Shape {
        tensor: &'static str,
        expected: String,
        found: String,
    },

    #[error("Invalid value: {0}")]
    Domain(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

impl DataError {
    pub(crate) fn shape(tensor: &'static str, expected: impl ToString, found: impl ToString) -> Self {
        DataError::Shape {
            tensor,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
