use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid event row #{index}: {reason}")]
    InvalidRow { index: usize, reason: String },

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("fetch ticket {generation} was never issued by slot {slot}")]
    UnknownTicket { slot: String, generation: u64 },

    #[error("serialization failed: {0}")]
    Serialization(String),
}
