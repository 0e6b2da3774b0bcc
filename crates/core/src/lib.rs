mod archive;
mod detector;
mod driver;
mod error;
mod events;
mod frames;
mod matcher;
mod store;
mod tokenize;
mod types;
mod validate;

#[cfg(test)]
mod tests;

pub use driver::{DetectionResult, Driver, Reporter};
pub use error::{DetectError, Result, StoreError};
pub use events::Subscriber;
pub use store::{FrameRecord, FrameStore, MemoryStore, SourceKey};
pub use tokenize::{
    LanguageSpec, Token, TokenKind, default_format_exts, lookup, supported_formats, tokenize,
};
pub use types::{
    CloneLocation, CodeClone, DetectOptions, FormatStatistic, MaskMode, SourceFile, Statistic,
    TokenPoint,
};
