use thiserror::Error;

#[derive(Debug, Error)]
pub enum WavecalcError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Non-finite input: {field} = {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("Result overflowed: {value} * {multiplier} is not finite")]
    Overflow { value: f64, multiplier: f64 },
}

pub type Result<T> = std::result::Result<T, WavecalcError>;
