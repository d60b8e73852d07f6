use std::io;
use thiserror::Error;

/// Errors raised while writing, reading or running a TFLite model.
#[derive(Debug, Error)]
pub enum TfliteError {
    /// Filesystem failures while reading or writing the model file.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The file does not carry the TFLite file identifier.
    #[error("not a TFLite model: missing '{0}' file identifier")]
    BadIdentifier(&'static str),
    /// The flatbuffer failed structural verification.
    #[error("malformed flatbuffer: {0}")]
    Flatbuffer(#[from] flatbuffers::InvalidFlatbuffer),
    /// A field the interpreter needs is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// Valid TFLite, but outside what this interpreter runs.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// A tensor's declared type, shape or data is inconsistent.
    #[error("tensor {index} ('{name}'): {reason}")]
    InvalidTensor {
        index:  usize,
        name:   String,
        reason: String,
    },
    /// A token id fell outside the embedding table.
    #[error("gather index {index} out of range for {limit} rows")]
    GatherIndexOutOfRange { index: i32, limit: usize },
    /// `invoke` or `set_input` was called before `allocate_tensors`.
    #[error("tensors are not allocated; call allocate_tensors first")]
    NotAllocated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TfliteError::GatherIndexOutOfRange { index: 1200, limit: 1000 };
        assert!(err.to_string().contains("1200"));
        assert!(err.to_string().contains("1000"));

        let err = TfliteError::MissingField("subgraphs");
        assert_eq!(err.to_string(), "missing required field: subgraphs");
    }
}
