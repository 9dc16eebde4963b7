use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment configuration error: {0}")]
    Configuration(String),
    #[error(
        "Payment mode '{mode}' is not implemented yet. Use mock mode for development."
    )]
    NotImplemented { mode: String },
    #[error("Unknown payment mode: {0}")]
    UnknownMode(String),
    #[error("Payment not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PaymentError>;
