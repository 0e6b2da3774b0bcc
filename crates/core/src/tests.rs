use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{DetectError, StoreError};
use crate::frames::mask_key;
use crate::store::{FrameRecord, FrameStore, MemoryStore};
use crate::tokenize::tokenize;
use crate::{
    CodeClone, DetectOptions, DetectionResult, Driver, MaskMode, Reporter, SourceFile, Statistic,
    Subscriber,
};

fn run_with(files: &[SourceFile], options: DetectOptions) -> DetectionResult {
    let driver = Driver::new(options, Box::new(MemoryStore::new())).expect("options are valid");
    driver.run(files).expect("run succeeds")
}

fn options(min_tokens: usize, min_lines: usize, mode: MaskMode) -> DetectOptions {
    DetectOptions {
        min_tokens,
        min_lines,
        mode,
        ..DetectOptions::default()
    }
}

/// Both sides of every accepted clone must agree token-by-token on mask
/// keys, meet the thresholds, and stay disjoint within one file.
fn assert_invariants(result: &DetectionResult, options: &DetectOptions) {
    for clone in &result.clones {
        let a = &clone.duplication_a;
        let b = &clone.duplication_b;

        assert_eq!(a.token_count(), b.token_count(), "uneven clone {clone:?}");
        assert!(a.token_count() >= options.min_tokens);
        assert!(a.line_span() >= options.min_lines as u32);
        assert!(b.line_span() >= options.min_lines as u32);
        assert_eq!(a.fragment.len(), a.byte_len());
        assert_eq!(b.fragment.len(), b.byte_len());

        if a.source_id == b.source_id {
            assert!(
                a.range.1 <= b.range.0 || b.range.1 <= a.range.0,
                "same-file clone overlaps: {clone:?}"
            );
        }

        assert_same_mask_keys(clone, options);
    }

    for (i, outer) in result.clones.iter().enumerate() {
        for (j, inner) in result.clones.iter().enumerate() {
            if i == j {
                continue;
            }
            let same_pair = outer.duplication_a.source_id == inner.duplication_a.source_id
                && outer.duplication_b.source_id == inner.duplication_b.source_id;
            let contained = outer.duplication_a.range.0 <= inner.duplication_a.range.0
                && inner.duplication_a.range.1 <= outer.duplication_a.range.1
                && outer.duplication_b.range.0 <= inner.duplication_b.range.0
                && inner.duplication_b.range.1 <= outer.duplication_b.range.1;
            assert!(
                !(same_pair && contained),
                "clone {j} is contained in clone {i}"
            );
        }
    }
}

fn mask_keys_of(fragment: &str, format: &str, options: &DetectOptions) -> Vec<u64> {
    tokenize(fragment, format)
        .expect("fragment tokenizes")
        .iter()
        .filter_map(|t| mask_key(t.kind, t.text, options.mode, options.ignore_case))
        .map(|k| k.hash())
        .collect()
}

fn assert_same_mask_keys(clone: &CodeClone, options: &DetectOptions) {
    let a = mask_keys_of(&clone.duplication_a.fragment, &clone.format, options);
    let b = mask_keys_of(&clone.duplication_b.fragment, &clone.format, options);
    assert_eq!(a, b, "mask-key sequences differ for {clone:?}");
}

fn clone_shape(clone: &CodeClone) -> (Arc<str>, (usize, usize), Arc<str>, (usize, usize)) {
    (
        clone.duplication_a.source_id.clone(),
        clone.duplication_a.range,
        clone.duplication_b.source_id.clone(),
        clone.duplication_b.range,
    )
}

const TWIN_JS: &str = "\
function add(a, b) {
    let total = a + b;
    return total;
}
function sub(a, b) {
    let result = a - b;
    return result;
}
";

#[test]
fn identical_twins_produce_one_full_clone() {
    let files = [
        SourceFile::new("a.js", "javascript", TWIN_JS),
        SourceFile::new("b.js", "javascript", TWIN_JS),
    ];
    let options = options(20, 3, MaskMode::Mild);
    let result = run_with(&files, options.clone());
    assert_invariants(&result, &options);

    assert_eq!(result.clones.len(), 1);
    let clone = &result.clones[0];
    assert_eq!(&*clone.duplication_a.source_id, "a.js");
    assert_eq!(&*clone.duplication_b.source_id, "b.js");
    assert_eq!(clone.duplication_a.start.line, 1);
    assert_eq!(clone.duplication_a.end.line, 8);
    assert_eq!(clone.duplication_b.start.line, 1);
    assert_eq!(clone.duplication_b.end.line, 8);
    assert_eq!(clone.duplication_a.fragment, clone.duplication_b.fragment);
}

#[test]
fn identical_twins_match_under_strict_as_well() {
    let files = [
        SourceFile::new("a.js", "javascript", TWIN_JS),
        SourceFile::new("b.js", "javascript", TWIN_JS),
    ];
    let options = options(20, 3, MaskMode::Strict);
    let result = run_with(&files, options.clone());
    assert_invariants(&result, &options);
    assert_eq!(result.clones.len(), 1);
}

#[test]
fn twins_statistic_counts_sources_and_duplication() {
    let files = [
        SourceFile::new("a.js", "javascript", TWIN_JS),
        SourceFile::new("b.js", "javascript", TWIN_JS),
    ];
    let result = run_with(&files, options(20, 3, MaskMode::Mild));

    let js = &result.statistic.formats["javascript"];
    assert_eq!(js.sources, 2);
    assert_eq!(js.lines, 16);
    assert_eq!(js.clones, 1);
    assert_eq!(js.duplicated_lines, 8);
    assert_eq!(js.percentage, 50.0);
    assert_eq!(result.statistic.total.sources, 2);
    assert!(result.statistic.total.percentage_tokens > 0.0);
}

#[test]
fn prefix_overlap_stops_extension_at_divergence() {
    let files = [
        SourceFile::new("a.js", "javascript", "x y z w v"),
        SourceFile::new("b.js", "javascript", "x y z q r"),
    ];
    let options = options(3, 1, MaskMode::Mild);
    let result = run_with(&files, options.clone());
    assert_invariants(&result, &options);

    assert_eq!(result.clones.len(), 1);
    let clone = &result.clones[0];
    assert_eq!(clone.duplication_a.token_count(), 3);
    assert_eq!(clone.duplication_a.fragment, "x y z");
    assert_eq!(clone.duplication_b.fragment, "x y z");
}

#[test]
fn shifted_self_clone_is_found_once_with_disjoint_ranges() {
    let source = "\
alpha = beta + gamma
delta = alpha * beta
one
two
three
four
five
six
seven
eight
nine
ten
alpha = beta + gamma
delta = alpha * beta
";
    let files = [SourceFile::new("c.py", "python", source)];
    let options = options(5, 2, MaskMode::Mild);
    let result = run_with(&files, options.clone());
    assert_invariants(&result, &options);

    assert_eq!(result.clones.len(), 1);
    let clone = &result.clones[0];
    assert_eq!(clone.duplication_a.source_id, clone.duplication_b.source_id);
    assert_eq!(clone.duplication_a.start.line, 1);
    assert_eq!(clone.duplication_a.end.line, 2);
    assert_eq!(clone.duplication_b.start.line, 13);
    assert_eq!(clone.duplication_b.end.line, 14);
    assert!(clone.duplication_a.range.1 <= clone.duplication_b.range.0);
}

const RENAMED_A_TS: &str = "\
function first(a: number) {
    return a + one;
}
";
const RENAMED_B_TS: &str = "\
function second(b: number) {
    return b + two;
}
";

#[test]
fn renamed_identifiers_match_only_under_weak() {
    let files = [
        SourceFile::new("d.ts", "typescript", RENAMED_A_TS),
        SourceFile::new("e.ts", "typescript", RENAMED_B_TS),
    ];

    let weak = options(10, 2, MaskMode::Weak);
    let result = run_with(&files, weak.clone());
    assert_invariants(&result, &weak);
    assert_eq!(result.clones.len(), 1);

    let result = run_with(&files, options(10, 2, MaskMode::Mild));
    assert!(result.clones.is_empty());

    let result = run_with(&files, options(10, 2, MaskMode::Strict));
    assert!(result.clones.is_empty());
}

const GO_BODY: &str = "\
func compute(a int, b int) int {
\tsum := a + b
\tdiff := a - b
\tprod := a * b
\tquot := a / b
\treturn sum + diff + prod + quot
}
";
const GO_BODY_COMMENTED: &str = "\
func compute(a int, b int) int {
\tsum := a + b
\tdiff := a - b
\t// extra note
\tprod := a * b
\tquot := a / b
\treturn sum + diff + prod + quot
}
";

#[test]
fn comment_noise_is_forgiven_by_mild_and_weak() {
    let files = [
        SourceFile::new("f.go", "go", GO_BODY),
        SourceFile::new("g.go", "go", GO_BODY_COMMENTED),
    ];

    for mode in [MaskMode::Mild, MaskMode::Weak] {
        let options = options(15, 2, mode);
        let result = run_with(&files, options.clone());
        assert_invariants(&result, &options);
        assert_eq!(result.clones.len(), 1, "mode {mode:?}");

        let clone = &result.clones[0];
        assert_eq!(clone.duplication_a.start.line, 1);
        assert_eq!(clone.duplication_a.end.line, 7);
        assert_eq!(clone.duplication_b.end.line, 8);
        assert!(clone.duplication_b.fragment.contains("// extra note"));
    }
}

#[test]
fn comment_noise_splits_the_clone_under_strict() {
    let files = [
        SourceFile::new("f.go", "go", GO_BODY),
        SourceFile::new("g.go", "go", GO_BODY_COMMENTED),
    ];
    let options = options(15, 2, MaskMode::Strict);
    let result = run_with(&files, options.clone());
    assert_invariants(&result, &options);
    assert_eq!(result.clones.len(), 2);
}

#[test]
fn forty_nine_shared_tokens_stay_below_a_fifty_token_window() {
    let shared: String = (1..=49).map(|i| format!("tok{i} ")).collect();
    let files = [
        SourceFile::new("h.rb", "ruby", format!("{shared}only_in_h")),
        SourceFile::new("i.rb", "ruby", format!("{shared}only_in_i")),
    ];
    let result = run_with(&files, options(50, 1, MaskMode::Mild));
    assert!(result.clones.is_empty());
}

#[test]
fn file_below_the_window_produces_no_clones() {
    let files = [
        SourceFile::new("a.js", "javascript", "a b c"),
        SourceFile::new("b.js", "javascript", "a b c"),
    ];
    let result = run_with(&files, options(50, 1, MaskMode::Mild));
    assert!(result.clones.is_empty());
}

#[test]
fn exact_window_duplicate_respects_min_lines() {
    let files = [
        SourceFile::new("a.js", "javascript", "p q r s t\nuniq_one"),
        SourceFile::new("b.js", "javascript", "p q r s t\nuniq_two"),
    ];

    let accepted = run_with(&files, options(5, 1, MaskMode::Mild));
    assert_eq!(accepted.clones.len(), 1);
    assert_eq!(accepted.clones[0].duplication_a.token_count(), 5);

    // token-granular match survives to validation, where the line filter
    // rejects it
    let rejected = run_with(&files, options(5, 2, MaskMode::Mild));
    assert!(rejected.clones.is_empty());
}

#[test]
fn clone_over_max_lines_is_rejected_entirely() {
    let body = "\
aa bb cc
dd ee ff
gg hh ii
jj kk ll
mm nn oo
pp qq rr
";
    let files = [
        SourceFile::new("a.js", "javascript", body),
        SourceFile::new("b.js", "javascript", body),
    ];
    let options = DetectOptions {
        min_tokens: 10,
        min_lines: 1,
        max_lines: 5,
        mode: MaskMode::Mild,
        ..DetectOptions::default()
    };
    let result = run_with(&files, options);
    assert!(result.clones.is_empty(), "oversized clone must not be truncated");
}

#[test]
fn reruns_with_a_fresh_store_are_idempotent() {
    let files = [
        SourceFile::new("a.js", "javascript", TWIN_JS),
        SourceFile::new("b.js", "javascript", TWIN_JS),
    ];
    let first = run_with(&files, options(20, 3, MaskMode::Mild));
    let second = run_with(&files, options(20, 3, MaskMode::Mild));

    let first_shapes: Vec<_> = first.clones.iter().map(clone_shape).collect();
    let second_shapes: Vec<_> = second.clones.iter().map(clone_shape).collect();
    assert_eq!(first_shapes, second_shapes);
    assert_eq!(first.statistic, second.statistic);
}

#[test]
fn whitespace_permutation_is_invisible_to_weak() {
    let compact = "function f(a) { return a + one - two * three; }\n";
    let expanded = "function f(a) {\n    return a\n        + one\n        - two\n        * three;\n}\n";

    let options = options(8, 1, MaskMode::Weak);

    let baseline = run_with(
        &[
            SourceFile::new("a.js", "javascript", compact),
            SourceFile::new("b.js", "javascript", compact),
        ],
        options.clone(),
    );
    let permuted = run_with(
        &[
            SourceFile::new("a.js", "javascript", compact),
            SourceFile::new("b.js", "javascript", expanded),
        ],
        options.clone(),
    );

    assert_eq!(baseline.clones.len(), permuted.clones.len());
    for (base, perm) in baseline.clones.iter().zip(&permuted.clones) {
        assert_eq!(
            base.duplication_b.start.position,
            perm.duplication_b.start.position
        );
        assert_eq!(
            base.duplication_b.end.position,
            perm.duplication_b.end.position
        );
    }
}

#[derive(Clone, Default)]
struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

struct Recorder {
    tag: &'static str,
    log: EventLog,
}

impl Recorder {
    fn push(&self, entry: String) {
        self.log.0.borrow_mut().push(format!("{}:{entry}", self.tag));
    }
}

impl Subscriber for Recorder {
    fn on_match_source(&mut self, source_id: &str, _format: &str) {
        self.push(format!("match {source_id}"));
    }
    fn on_start_detection(&mut self, source_id: &str, _format: &str, tokens: usize) {
        self.push(format!("start {source_id} {tokens}"));
    }
    fn on_clone_found(&mut self, clone: &CodeClone) {
        self.push(format!("clone {}", clone.duplication_b.source_id));
    }
    fn on_end(&mut self, source_id: &str, _statistic: &Statistic) {
        self.push(format!("end {source_id}"));
    }
    fn on_skipped_source(&mut self, source_id: &str, reason: &str) {
        self.push(format!("skipped {source_id} {reason}"));
    }
    fn on_store_error(&mut self, source_id: &str, _error: &StoreError) {
        self.push(format!("store-error {source_id}"));
    }
}

#[test]
fn events_fire_in_lifecycle_order() {
    let log = EventLog::default();
    let mut driver = Driver::new(options(3, 1, MaskMode::Mild), Box::new(MemoryStore::new())).unwrap();
    driver.subscribe(Box::new(Recorder { tag: "s", log: log.clone() }));

    let files = [
        SourceFile::new("a.js", "javascript", "x y z w"),
        SourceFile::new("b.js", "javascript", "x y z w"),
    ];
    driver.run(&files).unwrap();

    let entries = log.entries();
    assert_eq!(
        entries,
        vec![
            "s:match a.js",
            "s:start a.js 4",
            "s:end a.js",
            "s:match b.js",
            "s:start b.js 4",
            "s:clone b.js",
            "s:end b.js",
        ]
    );
}

#[test]
fn subscribers_observe_events_in_registration_order() {
    let log = EventLog::default();
    let mut driver = Driver::new(options(3, 1, MaskMode::Mild), Box::new(MemoryStore::new())).unwrap();
    driver.subscribe(Box::new(Recorder { tag: "one", log: log.clone() }));
    driver.subscribe(Box::new(Recorder { tag: "two", log: log.clone() }));

    driver
        .run(&[SourceFile::new("a.js", "javascript", "x y z")])
        .unwrap();

    let entries = log.entries();
    for pair in entries.chunks(2) {
        assert!(pair[0].starts_with("one:"));
        assert!(pair[1].starts_with("two:"));
        assert_eq!(&pair[0]["one:".len()..], &pair[1]["two:".len()..]);
    }
}

#[test]
fn unknown_format_and_broken_source_are_skipped_not_fatal() {
    let log = EventLog::default();
    let mut driver = Driver::new(options(3, 1, MaskMode::Mild), Box::new(MemoryStore::new())).unwrap();
    driver.subscribe(Box::new(Recorder { tag: "s", log: log.clone() }));

    let files = [
        SourceFile::new("a.cob", "cobol", "MOVE A TO B"),
        SourceFile::new("b.js", "javascript", "a /* never closed"),
        SourceFile::new("c.js", "javascript", "x y z"),
    ];
    let result = driver.run(&files).unwrap();

    assert!(!result.cancelled);
    let entries = log.entries();
    assert!(entries.iter().any(|e| e.contains("skipped a.cob") && e.contains("unknown format")));
    assert!(entries.iter().any(|e| e.contains("skipped b.js") && e.contains("unterminated")));
    assert!(entries.iter().any(|e| e == "s:end c.js"));
    // skipped files are not counted
    assert_eq!(result.statistic.total.sources, 1);
}

struct FlakyStore;

impl FrameStore for FlakyStore {
    fn get(&mut self, _id: u64) -> Result<Option<FrameRecord>, StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }
    fn set(&mut self, _id: u64, _record: FrameRecord) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }
    fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[test]
fn store_errors_abort_the_run_by_default() {
    let driver = Driver::new(options(2, 1, MaskMode::Mild), Box::new(FlakyStore)).unwrap();
    let err = driver
        .run(&[SourceFile::new("a.js", "javascript", "x y z w")])
        .unwrap_err();
    assert!(matches!(err, DetectError::Store(_)));
}

#[test]
fn store_errors_can_be_downgraded_to_warnings() {
    let log = EventLog::default();
    let mut driver = Driver::new(options(2, 1, MaskMode::Mild), Box::new(FlakyStore)).unwrap();
    driver.continue_on_store_error(true);
    driver.subscribe(Box::new(Recorder { tag: "s", log: log.clone() }));

    let files = [
        SourceFile::new("a.js", "javascript", "x y z w"),
        SourceFile::new("b.js", "javascript", "x y z w"),
    ];
    let result = driver.run(&files).unwrap();

    assert!(result.clones.is_empty());
    let store_errors = log
        .entries()
        .iter()
        .filter(|e| e.contains("store-error"))
        .count();
    assert_eq!(store_errors, 2);
}

struct RecordingReporter {
    log: EventLog,
}

impl Reporter for RecordingReporter {
    fn report(&mut self, clones: &[CodeClone], _statistic: &Statistic) {
        self.log.0.borrow_mut().push(format!("report {}", clones.len()));
    }
    fn wait_for_completion(&mut self) {
        self.log.0.borrow_mut().push("wait".to_string());
    }
    fn cancelled(&mut self, reason: &str) {
        self.log.0.borrow_mut().push(format!("cancelled {reason}"));
    }
}

#[test]
fn reporters_run_after_the_last_file_then_wait() {
    let log = EventLog::default();
    let mut driver = Driver::new(options(3, 1, MaskMode::Mild), Box::new(MemoryStore::new())).unwrap();
    driver.add_reporter(Box::new(RecordingReporter { log: log.clone() }));

    let files = [
        SourceFile::new("a.js", "javascript", "x y z w"),
        SourceFile::new("b.js", "javascript", "x y z w"),
    ];
    driver.run(&files).unwrap();

    assert_eq!(log.entries(), vec!["report 1", "wait"]);
}

struct CancelAfterFirstEnd {
    flag: Arc<AtomicBool>,
}

impl Subscriber for CancelAfterFirstEnd {
    fn on_end(&mut self, _source_id: &str, _statistic: &Statistic) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

#[test]
fn cancellation_between_files_notifies_reporters() {
    let log = EventLog::default();
    let flag = Arc::new(AtomicBool::new(false));

    let mut driver = Driver::new(options(3, 1, MaskMode::Mild), Box::new(MemoryStore::new())).unwrap();
    driver.set_cancel_flag(flag.clone());
    driver.subscribe(Box::new(CancelAfterFirstEnd { flag: flag.clone() }));
    driver.add_reporter(Box::new(RecordingReporter { log: log.clone() }));

    let files = [
        SourceFile::new("a.js", "javascript", "x y z w"),
        SourceFile::new("b.js", "javascript", "x y z w"),
    ];
    let result = driver.run(&files).unwrap();

    assert!(result.cancelled);
    assert!(result.clones.is_empty());
    assert_eq!(log.entries(), vec!["cancelled CANCELLED"]);
}

#[test]
fn invalid_thresholds_fail_before_any_file() {
    let options = DetectOptions {
        min_lines: 10,
        max_lines: 5,
        ..DetectOptions::default()
    };
    let err = Driver::new(options, Box::new(MemoryStore::new())).unwrap_err();
    assert!(matches!(err, DetectError::Config(_)));
}

#[test]
fn ignore_case_folds_identifiers_under_mild() {
    let files = [
        SourceFile::new("a.pas", "pascal", "WriteLn(Alpha);\nWriteLn(Beta);\n"),
        SourceFile::new("b.pas", "pascal", "writeln(alpha);\nwriteln(beta);\n"),
    ];

    let insensitive = DetectOptions {
        min_tokens: 6,
        min_lines: 2,
        mode: MaskMode::Mild,
        ignore_case: true,
        ..DetectOptions::default()
    };
    let result = run_with(&files, insensitive.clone());
    assert_invariants(&result, &insensitive);
    assert_eq!(result.clones.len(), 1);

    let sensitive = DetectOptions {
        ignore_case: false,
        ..insensitive
    };
    assert!(run_with(&files, sensitive).clones.is_empty());
}
