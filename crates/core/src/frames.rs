//! Mask-key derivation and token-window frame building.
//!
//! Frame ids are Rabin-Karp fingerprints: each mask key is reduced to a
//! 64-bit FNV-1a hash (offset basis 0xcbf29ce484222325, prime
//! 0x100000001b3), and a window's id is the polynomial hash of its key
//! hashes with base 911382323, modulo 2^64 via wrapping arithmetic.
//! Sliding the window one token costs a constant number of u64 operations
//! plus the FNV of the incoming key. Ids are advisory: candidate matches
//! are always re-verified against the mask keys themselves.

use std::borrow::Cow;

use crate::tokenize::{Token, TokenKind};
use crate::types::MaskMode;

const HASH_BASE: u64 = 911_382_323;

/// Canonical form of a token for hashing: the kind label plus, unless the
/// mode collapses this kind, the (possibly case-folded) text. Two tokens
/// with equal mask keys are interchangeable for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MaskKey<'a> {
    label: &'static str,
    payload: Option<Cow<'a, str>>,
}

impl MaskKey<'_> {
    pub(crate) fn hash(&self) -> u64 {
        const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
        const FNV_PRIME: u64 = 0x100000001b3;

        let mut hash = FNV_OFFSET_BASIS;
        for &b in self.label.as_bytes() {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash ^= u64::from(b':');
        hash = hash.wrapping_mul(FNV_PRIME);
        if let Some(payload) = &self.payload {
            for &b in payload.as_bytes() {
                hash ^= u64::from(b);
                hash = hash.wrapping_mul(FNV_PRIME);
            }
        }
        hash
    }
}

/// Mask key of one token under `mode`, `None` when the token does not
/// participate in matching.
pub(crate) fn mask_key<'a>(
    kind: TokenKind,
    text: &'a str,
    mode: MaskMode,
    ignore_case: bool,
) -> Option<MaskKey<'a>> {
    let keep_text = match mode {
        // whitespace runs collapse by type so reformatting within a line
        // does not defeat strict matching
        MaskMode::Strict => kind != TokenKind::Whitespace,
        MaskMode::Mild => match kind {
            TokenKind::Comment | TokenKind::Whitespace => return None,
            _ => true,
        },
        MaskMode::Weak => match kind {
            TokenKind::Comment | TokenKind::Whitespace => return None,
            TokenKind::Identifier | TokenKind::Number | TokenKind::Str => false,
            _ => true,
        },
    };

    let payload = if keep_text {
        Some(if ignore_case {
            Cow::Owned(text.to_ascii_lowercase())
        } else {
            Cow::Borrowed(text)
        })
    } else {
        None
    };

    Some(MaskKey {
        label: kind.label(),
        payload,
    })
}

/// One significant token, with enough provenance to report clone positions
/// and to re-derive its mask key from the retained source text.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SigToken {
    pub(crate) kind: TokenKind,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) end_line: u32,
    pub(crate) end_column: u32,
}

/// A window of exactly `min_tokens` consecutive significant tokens.
/// `start..end` is the covered source byte range; `index` is the window's
/// position in the file's frame sequence (equal to the index of its first
/// significant token).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MapFrame {
    pub(crate) id: u64,
    pub(crate) index: usize,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Debug, Default)]
pub(crate) struct TokenMap {
    pub(crate) sig: Vec<SigToken>,
    pub(crate) frames: Vec<MapFrame>,
}

/// Filter to significant tokens and slide the `min_tokens` window across
/// them. For N significant tokens this yields `max(0, N - min_tokens + 1)`
/// frames, adjacent frames sharing `min_tokens - 1` tokens.
pub(crate) fn build_token_map(
    tokens: &[Token<'_>],
    mode: MaskMode,
    ignore_case: bool,
    min_tokens: usize,
) -> TokenMap {
    let mut sig = Vec::new();
    let mut hashes = Vec::new();
    for token in tokens {
        let Some(key) = mask_key(token.kind, token.text, mode, ignore_case) else {
            continue;
        };
        hashes.push(key.hash());
        sig.push(SigToken {
            kind: token.kind,
            start: token.start,
            end: token.end,
            line: token.line,
            column: token.column,
            end_line: token.end_line,
            end_column: token.end_column,
        });
    }

    let mut frames = Vec::new();
    if min_tokens > 0 && sig.len() >= min_tokens {
        let mut pow = 1u64;
        for _ in 1..min_tokens {
            pow = pow.wrapping_mul(HASH_BASE);
        }

        let mut hash = 0u64;
        for &h in &hashes[..min_tokens] {
            hash = hash.wrapping_mul(HASH_BASE).wrapping_add(h);
        }

        let last = sig.len() - min_tokens;
        for index in 0..=last {
            if index != 0 {
                hash = hash
                    .wrapping_sub(hashes[index - 1].wrapping_mul(pow))
                    .wrapping_mul(HASH_BASE)
                    .wrapping_add(hashes[index + min_tokens - 1]);
            }
            frames.push(MapFrame {
                id: hash,
                index,
                start: sig[index].start,
                end: sig[index + min_tokens - 1].end,
            });
        }
    }

    TokenMap { sig, frames }
}
