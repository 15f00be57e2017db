//! Task construction and the worker-thread lifecycle.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use satlink_netbind::NetworkBinder;
use tracing::error;

use crate::config::TransferConfig;
use crate::control::{ResumePoint, TransferControl};
use crate::download::DownloadAttempt;
use crate::events::TransferEvents;
use crate::progress::ProgressMeter;
use crate::session::{TransferOutcome, run_session};
use crate::upload::UploadAttempt;

/// A running transfer: the caller's handle for control and completion.
pub struct TransferHandle {
    control: TransferControl,
    worker: JoinHandle<TransferOutcome>,
}

impl TransferHandle {
    /// Clones the control handle, e.g. to wire into a stop button.
    pub fn control(&self) -> TransferControl {
        self.control.clone()
    }

    /// Requests a pause; the terminal [`TransferEvents::paused`] callback
    /// carries the resume state once the worker observes the flag.
    pub fn pause(&self) {
        self.control.pause();
    }

    /// Requests a hard cancel.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Blocks until the worker finishes and returns the terminal outcome.
    pub fn join(self) -> TransferOutcome {
        match self.worker.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("transfer worker panicked");
                TransferOutcome::Failed {
                    message: "transfer worker panicked".into(),
                    bytes: 0,
                    elapsed: Duration::ZERO,
                }
            }
        }
    }
}

/// Builder for a resumable download.
///
/// One instance drives exactly one worker thread to exactly one terminal
/// callback; resuming a paused transfer means building a new task seeded
/// with the reported [`ResumePoint`].
pub struct DownloadTask {
    url: String,
    destination: Option<PathBuf>,
    resume: ResumePoint,
    config: TransferConfig,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination: None,
            resume: ResumePoint::default(),
            config: TransferConfig::default(),
        }
    }

    /// Writes the body to `path` (continuing at the resume offset) instead
    /// of counting and discarding it.
    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }

    /// Seeds the byte counter and accumulated time from a previous segment.
    pub fn resume_from(mut self, resume: ResumePoint) -> Self {
        self.resume = resume;
        self
    }

    pub fn config(mut self, config: TransferConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawns the dedicated worker thread and starts transferring.
    pub fn start(
        self,
        binder: Arc<dyn NetworkBinder>,
        events: Arc<dyn TransferEvents>,
    ) -> TransferHandle {
        let control = TransferControl::new();
        let worker_control = control.clone();
        let worker = std::thread::spawn(move || {
            let meter = Arc::new(ProgressMeter::new(
                self.resume.bytes,
                self.resume.elapsed,
                self.config.progress_interval,
                Arc::clone(&events),
            ));
            let mut attempt = DownloadAttempt::new(
                self.url,
                self.destination,
                worker_control.clone(),
                Arc::clone(&meter),
                self.config.clone(),
            );
            run_session(
                &mut attempt,
                binder.as_ref(),
                &worker_control,
                &meter,
                events.as_ref(),
                &self.config,
            )
        });
        TransferHandle { control, worker }
    }
}

/// Builder for a resumable upload.
pub struct UploadTask {
    source: PathBuf,
    url: String,
    resume: ResumePoint,
    config: TransferConfig,
}

impl UploadTask {
    pub fn new(source: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            url: url.into(),
            resume: ResumePoint::default(),
            config: TransferConfig::default(),
        }
    }

    /// Seeds the byte counter and accumulated time from a previous segment.
    pub fn resume_from(mut self, resume: ResumePoint) -> Self {
        self.resume = resume;
        self
    }

    pub fn config(mut self, config: TransferConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawns the dedicated worker thread and starts transferring.
    pub fn start(
        self,
        binder: Arc<dyn NetworkBinder>,
        events: Arc<dyn TransferEvents>,
    ) -> TransferHandle {
        let control = TransferControl::new();
        let worker_control = control.clone();
        let worker = std::thread::spawn(move || {
            let meter = Arc::new(ProgressMeter::new(
                self.resume.bytes,
                self.resume.elapsed,
                self.config.progress_interval,
                Arc::clone(&events),
            ));
            let mut attempt = UploadAttempt::new(
                self.source,
                self.url,
                worker_control.clone(),
                Arc::clone(&meter),
                self.config.clone(),
            );
            run_session(
                &mut attempt,
                binder.as_ref(),
                &worker_control,
                &meter,
                events.as_ref(),
                &self.config,
            )
        });
        TransferHandle { control, worker }
    }
}
