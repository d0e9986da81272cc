use serde::{Serialize, Serializer};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database Pool Error: {0}")]
    DbPool(#[from] r2d2::Error),

    #[error("Database Error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Http Error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Path Error: {0}")]
    Path(String),

    #[error("Initialization Failed: {0}")]
    Init(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Classification Failed: {0}")]
    Classification(String),

    #[error("Recommendation Failed: {0}")]
    Recommendation(String),

    #[error("Cannot save: {0}")]
    Unconfirmed(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

// UI bridges only need the message.
impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
