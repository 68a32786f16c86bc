use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode record '{key}': {message}")]
    Encode { key: String, message: String },

    #[error("Failed to decode record '{key}': {message}")]
    Decode { key: String, message: String },

    #[error("Write-ahead log error: {0}")]
    Wal(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn encode(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub fn decode(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_the_key() {
        let err = StoreError::decode("project/p1", "expected struct Project");
        assert_eq!(
            err.to_string(),
            "Failed to decode record 'project/p1': expected struct Project"
        );
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn open_missing() -> Result<()> {
            std::fs::File::open("/definitely/not/here")?;
            Ok(())
        }
        assert!(matches!(open_missing(), Err(StoreError::Io(_))));
    }
}
