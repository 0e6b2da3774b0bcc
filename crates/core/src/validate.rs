use crate::archive::SourceArchive;
use crate::types::{CloneLocation, CodeClone, DetectOptions};

pub(crate) struct ValidateContext<'a> {
    pub(crate) options: &'a DetectOptions,
    pub(crate) archive: &'a SourceArchive,
    /// Clones accepted earlier in the run, for overlap suppression.
    pub(crate) accepted: &'a [CodeClone],
}

type Validator = fn(&mut CodeClone, &ValidateContext<'_>) -> bool;

/// Acceptance pipeline. Order matters: cheap threshold checks run first,
/// fragments are extracted only for clones that can still be accepted,
/// and overlap suppression runs last against the accepted set.
const PIPELINE: &[Validator] = &[
    check_min_lines,
    check_min_tokens,
    check_max_lines,
    check_max_size,
    extract_fragments,
    suppress_contained,
];

pub(crate) fn validate_clone(clone: &mut CodeClone, ctx: &ValidateContext<'_>) -> bool {
    PIPELINE.iter().all(|validator| validator(clone, ctx))
}

fn check_min_lines(clone: &mut CodeClone, ctx: &ValidateContext<'_>) -> bool {
    let min = ctx.options.min_lines as u32;
    clone.duplication_a.line_span() >= min && clone.duplication_b.line_span() >= min
}

// true by construction for matcher output, re-checked for adjusted minima
fn check_min_tokens(clone: &mut CodeClone, ctx: &ValidateContext<'_>) -> bool {
    clone.duplication_a.token_count() >= ctx.options.min_tokens
        && clone.duplication_b.token_count() >= ctx.options.min_tokens
}

fn check_max_lines(clone: &mut CodeClone, ctx: &ValidateContext<'_>) -> bool {
    let max = ctx.options.max_lines as u32;
    clone.duplication_a.line_span() <= max && clone.duplication_b.line_span() <= max
}

fn check_max_size(clone: &mut CodeClone, ctx: &ValidateContext<'_>) -> bool {
    let Some(max) = ctx.options.max_size else {
        return true;
    };
    clone.duplication_a.byte_len() <= max && clone.duplication_b.byte_len() <= max
}

fn extract_fragments(clone: &mut CodeClone, ctx: &ValidateContext<'_>) -> bool {
    let Some(a) = fragment(ctx.archive, &clone.duplication_a) else {
        return false;
    };
    let Some(b) = fragment(ctx.archive, &clone.duplication_b) else {
        return false;
    };
    clone.duplication_a.fragment = a;
    clone.duplication_b.fragment = b;
    true
}

fn fragment(archive: &SourceArchive, location: &CloneLocation) -> Option<String> {
    let file = archive.find(&location.source_id)?;
    let (start, end) = location.range;
    file.source.get(start..end).map(str::to_string)
}

/// Within one ordered file pair, a clone fully contained in an
/// already-accepted clone is a sub-match of the same duplication.
fn suppress_contained(clone: &mut CodeClone, ctx: &ValidateContext<'_>) -> bool {
    !ctx.accepted
        .iter()
        .any(|prev| same_pair(prev, clone) && contains(prev, clone))
}

fn same_pair(a: &CodeClone, b: &CodeClone) -> bool {
    a.duplication_a.source_id == b.duplication_a.source_id
        && a.duplication_b.source_id == b.duplication_b.source_id
}

fn contains(outer: &CodeClone, inner: &CodeClone) -> bool {
    range_contains(outer.duplication_a.range, inner.duplication_a.range)
        && range_contains(outer.duplication_b.range, inner.duplication_b.range)
}

fn range_contains(outer: (usize, usize), inner: (usize, usize)) -> bool {
    outer.0 <= inner.0 && inner.1 <= outer.1
}
