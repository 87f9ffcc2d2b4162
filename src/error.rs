use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("date parsing failed: {0}")]
    Date(#[from] chrono::ParseError),

    #[error("numeric parsing failed: {0}")]
    Number(#[from] std::num::ParseFloatError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
