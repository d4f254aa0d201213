use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Unexpected topic prefix: expected {expected}, got {found}")]
    UnexpectedPrefix { expected: String, found: String },

    #[error("No device name in topic {0} and no mac in payload")]
    MissingDevice(String),

    #[error("Invalid UTF-8 payload on {topic}: {source}")]
    InvalidUtf8 {
        topic: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Invalid reading on {topic}: {source}")]
    InvalidPayload {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Accessory cache error: {0}")]
    CacheFormat(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
