use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to extract tags: {0}")]
    ExtractionFailed(String),

    #[error("Sidecar parse error: {0}")]
    Sidecar(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
