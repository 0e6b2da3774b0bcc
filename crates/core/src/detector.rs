use std::sync::atomic::AtomicBool;

use chrono::Utc;

use crate::archive::{ArchivedSource, SourceArchive};
use crate::error::StoreError;
use crate::events::Subscriber;
use crate::frames::build_token_map;
use crate::matcher::{MatchOutcome, RawClone, detect_file};
use crate::store::FrameStore;
use crate::tokenize::tokenize;
use crate::types::{CloneLocation, CodeClone, DetectOptions, SourceFile, Statistic, TokenPoint};
use crate::validate::{ValidateContext, validate_clone};

pub(crate) enum FileOutcome {
    Done,
    Skipped,
    Cancelled,
}

/// Drives one file through tokenize -> frames -> match -> validate and owns
/// the event fan-out. Tokenizer-class failures drop the file and the run
/// continues; store failures abort the file and bubble up to the driver.
pub(crate) struct Detector<'a> {
    pub(crate) options: &'a DetectOptions,
    pub(crate) store: &'a mut dyn FrameStore,
    pub(crate) subscribers: &'a mut [Box<dyn Subscriber>],
    pub(crate) archive: &'a mut SourceArchive,
    pub(crate) statistic: &'a mut Statistic,
    pub(crate) clones: &'a mut Vec<CodeClone>,
    pub(crate) cancel: Option<&'a AtomicBool>,
}

impl Detector<'_> {
    pub(crate) fn process_file(&mut self, file: &SourceFile) -> Result<FileOutcome, StoreError> {
        for subscriber in self.subscribers.iter_mut() {
            subscriber.on_match_source(&file.id, &file.format);
        }

        let map = match tokenize(&file.source, &file.format) {
            Ok(tokens) => build_token_map(
                &tokens,
                self.options.mode,
                self.options.ignore_case,
                self.options.min_tokens,
            ),
            Err(err) => {
                tracing::warn!(source = %file.id, %err, "source skipped");
                let reason = err.to_string();
                for subscriber in self.subscribers.iter_mut() {
                    subscriber.on_skipped_source(&file.id, &reason);
                }
                return Ok(FileOutcome::Skipped);
            }
        };

        let token_count = map.sig.len();
        let key = self
            .archive
            .insert(file.id.clone(), file.format.clone(), file.source.clone(), map);
        self.statistic
            .record_source(&file.format, u64::from(file.lines), token_count as u64);

        for subscriber in self.subscribers.iter_mut() {
            subscriber.on_start_detection(&file.id, &file.format, token_count);
        }

        let raw = match detect_file(key, self.archive, self.store, self.options, self.cancel) {
            Ok(MatchOutcome::Done(raw)) => raw,
            Ok(MatchOutcome::Cancelled) => return Ok(FileOutcome::Cancelled),
            Err(err) => {
                for subscriber in self.subscribers.iter_mut() {
                    subscriber.on_store_error(&file.id, &err);
                }
                return Err(err);
            }
        };

        for candidate in raw {
            let mut clone = self.build_clone(&candidate);
            let accepted = validate_clone(
                &mut clone,
                &ValidateContext {
                    options: self.options,
                    archive: self.archive,
                    accepted: self.clones.as_slice(),
                },
            );
            if !accepted {
                continue;
            }

            self.statistic.record_clone(
                &clone.format,
                u64::from(clone.duplication_b.line_span()),
                clone.duplication_b.token_count() as u64,
            );
            for subscriber in self.subscribers.iter_mut() {
                subscriber.on_clone_found(&clone);
            }
            self.clones.push(clone);
        }

        for subscriber in self.subscribers.iter_mut() {
            subscriber.on_end(&file.id, self.statistic);
        }
        Ok(FileOutcome::Done)
    }

    fn build_clone(&self, raw: &RawClone) -> CodeClone {
        let a = self.archive.get(raw.a_source);
        let b = self.archive.get(raw.b_source);
        CodeClone {
            format: b.format.clone(),
            found_date: Utc::now(),
            duplication_a: location(a, raw.a_first, raw.a_last),
            duplication_b: location(b, raw.b_first, raw.b_last),
        }
    }
}

fn location(source: &ArchivedSource, first: usize, last: usize) -> CloneLocation {
    let head = source.map.sig[first];
    let tail = source.map.sig[last];
    CloneLocation {
        source_id: source.id.clone(),
        start: TokenPoint {
            line: head.line,
            column: head.column,
            position: first,
        },
        end: TokenPoint {
            line: tail.end_line,
            column: tail.end_column,
            position: last,
        },
        range: (head.start, tail.end),
        fragment: String::new(),
    }
}
