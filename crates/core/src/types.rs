use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DetectError;
use crate::tokenize::default_format_exts;

/// Which token categories participate in frame hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskMode {
    /// Every token contributes a key; whitespace runs collapse by type.
    Strict,
    /// Comments and whitespace are ignored.
    Mild,
    /// Comments and whitespace are ignored; identifiers and literals
    /// collapse to their kind.
    Weak,
}

impl MaskMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "mild" => Some(Self::Mild),
            "weak" => Some(Self::Weak),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectOptions {
    pub min_lines: usize,
    pub max_lines: usize,
    pub min_tokens: usize,
    pub max_size: Option<usize>,
    pub mode: MaskMode,
    pub ignore_case: bool,
    /// Format id -> file extensions. Consumed by the discovery collaborator;
    /// the engine itself only surfaces it for reporting.
    pub format_exts: BTreeMap<String, Vec<String>>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            min_lines: 5,
            max_lines: 1000,
            min_tokens: 50,
            max_size: None,
            mode: MaskMode::Mild,
            ignore_case: false,
            format_exts: default_format_exts(),
        }
    }
}

impl DetectOptions {
    /// Rejects nonsensical thresholds before any file is processed.
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.min_tokens < 1 {
            return Err(DetectError::Config("min_tokens must be >= 1".to_string()));
        }
        if self.min_lines < 1 {
            return Err(DetectError::Config("min_lines must be >= 1".to_string()));
        }
        if self.max_lines < self.min_lines {
            return Err(DetectError::Config(format!(
                "max_lines ({}) must be >= min_lines ({})",
                self.max_lines, self.min_lines
            )));
        }
        Ok(())
    }
}

/// One input record from the discovery collaborator. `source` is trusted to
/// be the exact file content; clone byte offsets index into it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: Arc<str>,
    pub format: String,
    pub source: String,
    pub lines: u32,
}

impl SourceFile {
    pub fn new(id: impl Into<Arc<str>>, format: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let lines = source.lines().count() as u32;
        Self {
            id: id.into(),
            format: format.into(),
            source,
            lines,
        }
    }
}

/// A point in a source file: 1-based line and column plus the index of the
/// covered significant token (first token for `start`, last for `end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenPoint {
    pub line: u32,
    pub column: u32,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneLocation {
    pub source_id: Arc<str>,
    pub start: TokenPoint,
    pub end: TokenPoint,
    /// Covered byte range `[start, end)` into the source.
    pub range: (usize, usize),
    pub fragment: String,
}

impl CloneLocation {
    pub fn line_span(&self) -> u32 {
        self.end.line - self.start.line + 1
    }

    pub fn token_count(&self) -> usize {
        self.end.position - self.start.position + 1
    }

    pub fn byte_len(&self) -> usize {
        self.range.1 - self.range.0
    }
}

/// A discovered duplicate: two source regions whose mask-key sequences are
/// equal under the active mode. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeClone {
    pub format: String,
    pub found_date: DateTime<Utc>,
    pub duplication_a: CloneLocation,
    pub duplication_b: CloneLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatStatistic {
    pub sources: u64,
    pub lines: u64,
    pub tokens: u64,
    pub clones: u64,
    pub duplicated_lines: u64,
    pub duplicated_tokens: u64,
    pub percentage: f64,
    pub percentage_tokens: f64,
}

impl FormatStatistic {
    fn record_source(&mut self, lines: u64, tokens: u64) {
        self.sources = self.sources.saturating_add(1);
        self.lines = self.lines.saturating_add(lines);
        self.tokens = self.tokens.saturating_add(tokens);
    }

    fn record_clone(&mut self, duplicated_lines: u64, duplicated_tokens: u64) {
        self.clones = self.clones.saturating_add(1);
        self.duplicated_lines = self.duplicated_lines.saturating_add(duplicated_lines);
        self.duplicated_tokens = self.duplicated_tokens.saturating_add(duplicated_tokens);
    }

    fn finalize(&mut self) {
        self.percentage = percentage(self.duplicated_lines, self.lines);
        self.percentage_tokens = percentage(self.duplicated_tokens, self.tokens);
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Aggregate counters, per format and overall. Mutated only by the detector
/// and the driver; percentages are filled in by `finalize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistic {
    pub total: FormatStatistic,
    pub formats: BTreeMap<String, FormatStatistic>,
}

impl Statistic {
    pub(crate) fn record_source(&mut self, format: &str, lines: u64, tokens: u64) {
        self.total.record_source(lines, tokens);
        self.formats
            .entry(format.to_string())
            .or_default()
            .record_source(lines, tokens);
    }

    pub(crate) fn record_clone(&mut self, format: &str, duplicated_lines: u64, duplicated_tokens: u64) {
        self.total.record_clone(duplicated_lines, duplicated_tokens);
        self.formats
            .entry(format.to_string())
            .or_default()
            .record_clone(duplicated_lines, duplicated_tokens);
    }

    pub fn finalize(&mut self) {
        self.total.finalize();
        for stat in self.formats.values_mut() {
            stat.finalize();
        }
    }
}
