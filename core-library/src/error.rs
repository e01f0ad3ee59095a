use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Path not found: {path}")]
    NotFound { path: String },

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
