use thiserror::Error;

/// Errors surfaced by the detection engine.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The requested language id is not in the registry.
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// The source defeated the language's token grammar.
    #[error("tokenizer: {0}")]
    Tokenizer(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors produced by a frame store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store is closed")]
    Closed,

    #[error("store backend: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, DetectError>;
