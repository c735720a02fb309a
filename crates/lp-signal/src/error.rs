use thiserror::Error;

pub type SignalResult<T> = Result<T, SignalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("Insufficient data for {what}: got {got} sample(s), need at least {need}")]
    InsufficientData {
        what: &'static str,
        got: usize,
        need: usize,
    },

    #[error("Missing column: {name}")]
    MissingColumn { name: String },

    #[error("Length mismatch in {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: String,
        expected: usize,
        got: usize,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
