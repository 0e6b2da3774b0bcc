//! Rabin-Karp matching pass.
//!
//! One forward sweep over a file's frames against the shared store: a frame
//! whose id is unknown (or last seen at the same position of the same file)
//! is recorded; a frame whose id was seen elsewhere opens a candidate that
//! is verified against the actual mask keys, extended window-by-window on
//! both sides while ids and tail keys keep matching, and emitted as one
//! maximal raw clone. The scan then jumps past the matched region so
//! sub-clones of the extended match are never re-emitted, and the store is
//! updated with the current frame so later files match against this one.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::archive::{ArchivedSource, SourceArchive};
use crate::error::StoreError;
use crate::store::{FrameRecord, FrameStore, SourceKey};
use crate::types::DetectOptions;

/// A maximal token-region match, before validation. Indices address
/// significant tokens; both regions cover the same token count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawClone {
    pub(crate) a_source: SourceKey,
    pub(crate) a_first: usize,
    pub(crate) a_last: usize,
    pub(crate) b_source: SourceKey,
    pub(crate) b_first: usize,
    pub(crate) b_last: usize,
}

pub(crate) enum MatchOutcome {
    Done(Vec<RawClone>),
    Cancelled,
}

/// Sweep `file`'s frames against the store. The file must already be in the
/// archive; `cancel` is checked once per frame.
pub(crate) fn detect_file(
    file: SourceKey,
    archive: &SourceArchive,
    store: &mut dyn FrameStore,
    options: &DetectOptions,
    cancel: Option<&AtomicBool>,
) -> Result<MatchOutcome, StoreError> {
    let current = archive.get(file);
    let frames = &current.map.frames;
    let width = options.min_tokens;
    let mut clones = Vec::new();

    let mut i = 0;
    while i < frames.len() {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Ok(MatchOutcome::Cancelled);
        }

        let id = frames[i].id;
        let record = FrameRecord { source: file, index: i };

        let Some(prior) = store.get(id)? else {
            store.set(id, record)?;
            i += 1;
            continue;
        };

        // the same frame re-seen (file fed through twice) is not a clone
        if prior.source == file && prior.index == i {
            store.set(id, record)?;
            i += 1;
            continue;
        }

        // same-file regions must stay token-disjoint: A's last token
        // (prior.index + width - 1) must come before B's first token (i)
        if prior.source == file && prior.index + width > i {
            store.set(id, record)?;
            i += 1;
            continue;
        }

        let partner = archive.get(prior.source);

        // the id is advisory; admit only after comparing the full window
        if !window_keys_equal(partner, prior.index, current, i, width, options) {
            store.set(id, record)?;
            i += 1;
            continue;
        }

        // grow both sides in lockstep while the next windows agree
        let mut k = 0;
        loop {
            let a_next = prior.index + k + 1;
            let b_next = i + k + 1;
            if a_next >= partner.map.frames.len() || b_next >= frames.len() {
                break;
            }
            if partner.map.frames[a_next].id != frames[b_next].id {
                break;
            }
            if prior.source == file && a_next + width > i {
                break;
            }
            if !keys_equal(partner, a_next + width - 1, current, b_next + width - 1, options) {
                break;
            }
            k += 1;
        }

        clones.push(RawClone {
            a_source: prior.source,
            a_first: prior.index,
            a_last: prior.index + k + width - 1,
            b_source: file,
            b_first: i,
            b_last: i + k + width - 1,
        });

        store.set(id, record)?;
        i += k + 1;
    }

    Ok(MatchOutcome::Done(clones))
}

fn window_keys_equal(
    a: &ArchivedSource,
    a_start: usize,
    b: &ArchivedSource,
    b_start: usize,
    width: usize,
    options: &DetectOptions,
) -> bool {
    (0..width).all(|offset| keys_equal(a, a_start + offset, b, b_start + offset, options))
}

fn keys_equal(
    a: &ArchivedSource,
    a_index: usize,
    b: &ArchivedSource,
    b_index: usize,
    options: &DetectOptions,
) -> bool {
    match (
        a.key_at(a_index, options.mode, options.ignore_case),
        b.key_at(b_index, options.mode, options.ignore_case),
    ) {
        (Some(a_key), Some(b_key)) => a_key == b_key,
        _ => false,
    }
}
