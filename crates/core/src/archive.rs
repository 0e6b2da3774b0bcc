use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::frames::{MaskKey, TokenMap, mask_key};
use crate::store::SourceKey;
use crate::types::MaskMode;

/// A processed file retained for the rest of the run. Store records carry
/// only (source, frame index); match verification and fragment extraction
/// resolve through here, re-deriving mask keys from the retained text so
/// the advisory frame hash never decides a match on its own.
pub(crate) struct ArchivedSource {
    pub(crate) id: Arc<str>,
    pub(crate) format: String,
    pub(crate) source: String,
    pub(crate) map: TokenMap,
}

impl ArchivedSource {
    /// Mask key of the `index`-th significant token. `None` only when
    /// `index` is out of bounds.
    pub(crate) fn key_at(&self, index: usize, mode: MaskMode, ignore_case: bool) -> Option<MaskKey<'_>> {
        let token = self.map.sig.get(index)?;
        mask_key(token.kind, &self.source[token.start..token.end], mode, ignore_case)
    }
}

#[derive(Default)]
pub(crate) struct SourceArchive {
    keys: FxHashMap<Arc<str>, SourceKey>,
    files: Vec<ArchivedSource>,
}

impl SourceArchive {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a processed file, replacing any previous entry with the
    /// same id (the same source can legitimately be fed through a run
    /// twice against a shared store).
    pub(crate) fn insert(
        &mut self,
        id: Arc<str>,
        format: String,
        source: String,
        map: TokenMap,
    ) -> SourceKey {
        if let Some(&key) = self.keys.get(&id) {
            self.files[key as usize] = ArchivedSource { id, format, source, map };
            return key;
        }
        let key = self.files.len() as SourceKey;
        self.keys.insert(id.clone(), key);
        self.files.push(ArchivedSource { id, format, source, map });
        key
    }

    pub(crate) fn get(&self, key: SourceKey) -> &ArchivedSource {
        &self.files[key as usize]
    }

    pub(crate) fn find(&self, id: &str) -> Option<&ArchivedSource> {
        self.keys.get(id).map(|&key| self.get(key))
    }
}
