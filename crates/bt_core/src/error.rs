use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Posting error: {0}")]
    Posting(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
