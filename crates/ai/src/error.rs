use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AiError {
    #[error("invalid model input: {0}")]
    InvalidInput(String),

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("model fit failed: {0}")]
    FitFailed(String),
}
