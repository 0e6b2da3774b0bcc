use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::archive::SourceArchive;
use crate::detector::{Detector, FileOutcome};
use crate::error::{DetectError, Result};
use crate::events::Subscriber;
use crate::store::FrameStore;
use crate::types::{CodeClone, DetectOptions, SourceFile, Statistic};

/// Consumes a finished run. `wait_for_completion` lets reporters with
/// asynchronous tails (uploads, spawned processes) hold the driver until
/// they are done; `cancelled` replaces `report` when the run was cut short.
pub trait Reporter {
    fn report(&mut self, clones: &[CodeClone], statistic: &Statistic);

    fn wait_for_completion(&mut self) {}

    fn cancelled(&mut self, _reason: &str) {}
}

#[derive(Debug)]
pub struct DetectionResult {
    pub clones: Vec<CodeClone>,
    pub statistic: Statistic,
    pub cancelled: bool,
}

/// Multi-file driver: runs the detector over a supplied file set in order,
/// on a single worker, against one shared store. Subscribers observe
/// lifecycle events; reporters receive the final clone list and statistic.
/// The store is closed on every exit path.
pub struct Driver {
    options: DetectOptions,
    store: Box<dyn FrameStore>,
    subscribers: Vec<Box<dyn Subscriber>>,
    reporters: Vec<Box<dyn Reporter>>,
    cancel: Option<Arc<AtomicBool>>,
    continue_on_store_error: bool,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("options", &self.options)
            .field("subscribers", &self.subscribers.len())
            .field("reporters", &self.reporters.len())
            .field("cancel", &self.cancel)
            .field("continue_on_store_error", &self.continue_on_store_error)
            .finish()
    }
}

impl Driver {
    /// Fails fast on nonsensical thresholds, before any file is touched.
    pub fn new(options: DetectOptions, store: Box<dyn FrameStore>) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            store,
            subscribers: Vec::new(),
            reporters: Vec::new(),
            cancel: None,
            continue_on_store_error: false,
        })
    }

    /// Subscribers observe events in registration order.
    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    /// Cooperative cancellation; checked between files and between frames.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
    }

    /// Downgrade store failures from run-fatal to warn-and-skip-file.
    pub fn continue_on_store_error(&mut self, yes: bool) {
        self.continue_on_store_error = yes;
    }

    pub fn run(mut self, files: &[SourceFile]) -> Result<DetectionResult> {
        let mut statistic = Statistic::default();
        let mut clones = Vec::new();
        let mut archive = SourceArchive::new();
        let mut cancelled = false;

        for file in files {
            if self
                .cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                cancelled = true;
                break;
            }

            let mut detector = Detector {
                options: &self.options,
                store: self.store.as_mut(),
                subscribers: self.subscribers.as_mut_slice(),
                archive: &mut archive,
                statistic: &mut statistic,
                clones: &mut clones,
                cancel: self.cancel.as_deref(),
            };

            match detector.process_file(file) {
                Ok(FileOutcome::Done | FileOutcome::Skipped) => {}
                Ok(FileOutcome::Cancelled) => {
                    cancelled = true;
                    break;
                }
                Err(err) if self.continue_on_store_error => {
                    tracing::warn!(source = %file.id, %err, "store error; continuing with next file");
                }
                Err(err) => {
                    let _ = self.store.close();
                    return Err(DetectError::Store(err));
                }
            }
        }

        statistic.finalize();

        if cancelled {
            for reporter in &mut self.reporters {
                reporter.cancelled("CANCELLED");
            }
        } else {
            for reporter in &mut self.reporters {
                reporter.report(&clones, &statistic);
            }
            for reporter in &mut self.reporters {
                reporter.wait_for_completion();
            }
        }

        self.store.close()?;

        Ok(DetectionResult {
            clones,
            statistic,
            cancelled,
        })
    }
}
