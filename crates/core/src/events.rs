use crate::error::StoreError;
use crate::types::{CodeClone, Statistic};

/// Receiver for detector lifecycle events. One method per named event,
/// each a no-op by default; the detector walks subscribers in registration
/// order and invokes the handler matching the event, so implementors only
/// override what they consume.
///
/// Payloads are borrowed and immutable; subscribers must not assume they
/// outlive the call.
pub trait Subscriber {
    /// A source is about to be tokenized.
    fn on_match_source(&mut self, _source_id: &str, _format: &str) {}

    /// Frames were built; `tokens` is the significant-token count.
    fn on_start_detection(&mut self, _source_id: &str, _format: &str, _tokens: usize) {}

    /// An accepted clone, emitted before the file's `on_end`.
    fn on_clone_found(&mut self, _clone: &CodeClone) {}

    /// File fully processed; `statistic` is the running aggregate.
    fn on_end(&mut self, _source_id: &str, _statistic: &Statistic) {}

    /// The file was dropped (unknown format or tokenizer failure); the run
    /// continues with the next file.
    fn on_skipped_source(&mut self, _source_id: &str, _reason: &str) {}

    /// The store failed while processing this file.
    fn on_store_error(&mut self, _source_id: &str, _error: &StoreError) {}
}
