use crate::images::SkipReason;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// Wrong password, or the payload was altered after encryption.
    #[error("Could not decrypt: check the password or file integrity.")]
    Authentication,

    #[error("Encryption failed.")]
    Encryption,

    #[error("Invalid encrypted payload: {0}")]
    InvalidPayload(String),

    #[error("Payload field '{field}' is not valid base64: {source}")]
    Base64 {
        field: &'static str,
        source: base64::DecodeError,
    },

    #[error("Image #{position} ('{name}') on trade {trade_id} was rejected: {reason}")]
    ImageDecode {
        trade_id: String,
        position: usize,
        name: String,
        reason: SkipReason,
    },

    #[error("Key derivation needs at least {minimum} iterations, got {requested}.")]
    WeakKeyDerivation { requested: u32, minimum: u32 },

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    Json(#[from] serde_json::Error),

    #[error("A background encoding task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
