//! Shared byte/time bookkeeping for one transfer.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::events::TransferEvents;
use crate::format::{format_speed, format_time};

/// Progress meter shared between the session loop and whichever side of the
/// attempt moves bytes: the download copy loop or the upload body reader.
///
/// The byte counter is seeded from the resume offset and only ever grows;
/// the total size stays −1 until a response header or local file reveals it.
pub(crate) struct ProgressMeter {
    transferred: AtomicU64,
    total_size: AtomicI64,
    initial_offset: u64,
    prior_elapsed: Duration,
    segment_start: Instant,
    interval: Duration,
    last_emit: Mutex<Option<Instant>>,
    events: Arc<dyn TransferEvents>,
}

impl ProgressMeter {
    pub(crate) fn new(
        initial_offset: u64,
        prior_elapsed: Duration,
        interval: Duration,
        events: Arc<dyn TransferEvents>,
    ) -> Self {
        Self {
            transferred: AtomicU64::new(initial_offset),
            total_size: AtomicI64::new(-1),
            initial_offset,
            prior_elapsed,
            segment_start: Instant::now(),
            interval,
            last_emit: Mutex::new(None),
            events,
        }
    }

    pub(crate) fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Acquire)
    }

    pub(crate) fn set_total_size(&self, total: i64) {
        self.total_size.store(total, Ordering::Release);
    }

    pub(crate) fn total_size(&self) -> i64 {
        self.total_size.load(Ordering::Acquire)
    }

    /// Forgets the throttle state so the next chunk reports immediately.
    /// Called at the start of every attempt.
    pub(crate) fn begin_attempt(&self) {
        if let Ok(mut last) = self.last_emit.lock() {
            *last = None;
        }
    }

    /// Records `n` freshly moved bytes and emits a progress event when due.
    pub(crate) fn add_bytes(&self, n: u64) {
        self.transferred.fetch_add(n, Ordering::AcqRel);
        self.maybe_emit();
    }

    fn maybe_emit(&self) {
        let now = Instant::now();
        let due = {
            let Ok(mut last) = self.last_emit.lock() else {
                return;
            };
            match *last {
                Some(prev) if now.duration_since(prev) < self.interval => false,
                _ => {
                    *last = Some(now);
                    true
                }
            }
        };
        if due {
            self.emit();
        }
    }

    fn emit(&self) {
        let bytes = self.transferred();
        let total = self.total_size();
        let percent = if total > 0 {
            ((u128::from(bytes.min(total as u64)) * 100) / total as u128) as i32
        } else {
            -1
        };
        let elapsed = self.total_elapsed();
        self.events.progress(
            percent,
            &format_speed(self.segment_speed()),
            &format_time(elapsed.as_millis() as i64),
            bytes,
        );
    }

    /// Average speed over this run segment, in bytes per second. Zero when
    /// the segment has consumed no measurable time.
    pub(crate) fn segment_speed(&self) -> f64 {
        let secs = self.segment_start.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.segment_bytes() as f64 / secs
    }

    /// Bytes moved by this run segment (excludes the resume offset).
    pub(crate) fn segment_bytes(&self) -> u64 {
        self.transferred().saturating_sub(self.initial_offset)
    }

    pub(crate) fn segment_elapsed(&self) -> Duration {
        self.segment_start.elapsed()
    }

    /// Elapsed time across all run segments, prior ones included.
    pub(crate) fn total_elapsed(&self) -> Duration {
        self.prior_elapsed + self.segment_start.elapsed()
    }
}
