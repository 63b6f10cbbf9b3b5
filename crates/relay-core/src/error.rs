use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {name}")]
    MissingCredential { name: &'static str },
}

impl RelayError {
    /// Short error code string used in structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::MissingCredential { .. } => "MISSING_CREDENTIAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
