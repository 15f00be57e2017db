//! The notification contract between the engine and its caller.

use std::time::Duration;

/// Receives lifecycle and progress notifications for one transfer.
///
/// Implemented by the caller, invoked by the engine from the transfer's
/// worker thread, strictly in lifecycle order and never concurrently.
/// Exactly one of [`paused`](Self::paused), [`cancelled`](Self::cancelled),
/// or [`finished`](Self::finished) fires per task instance, and
/// [`started`](Self::started) always fires first if the task runs at all.
/// Implementations driving a UI are responsible for hopping onto their own
/// event thread.
pub trait TransferEvents: Send + Sync {
    /// The worker is about to perform its first I/O.
    fn started(&self) {}

    /// Periodic progress. `percent` is −1 while the total size is unknown.
    /// `speed` is the average over the current run segment and `elapsed`
    /// accumulates across segments. Fires on the first chunk of every
    /// attempt and then at the configured minimum interval.
    fn progress(&self, percent: i32, speed: &str, elapsed: &str, bytes: u64) {
        let _ = (percent, speed, elapsed, bytes);
    }

    /// A transient failure was recorded and attempt `attempt` (counting
    /// from 1) starts after `delay`. Fires before the wait.
    fn retry_scheduled(&self, attempt: u32, delay: Duration) {
        let _ = (attempt, delay);
    }

    /// Terminal: the task stopped on a pause request. `bytes` and
    /// `segment_elapsed` are what the caller carries into the next
    /// instance's resume state.
    fn paused(&self, message: &str, bytes: u64, segment_elapsed: Duration) {
        let _ = (message, bytes, segment_elapsed);
    }

    /// Terminal: the task stopped on a cancel request.
    fn cancelled(&self, message: &str, avg_speed: &str, segment_elapsed: &str) {
        let _ = (message, avg_speed, segment_elapsed);
    }

    /// Terminal: success or fatal error. `total_elapsed` covers every run
    /// segment of the transfer, not just this instance's.
    fn finished(&self, message: &str, avg_speed: &str, total_elapsed: &str, bytes: u64) {
        let _ = (message, avg_speed, total_elapsed, bytes);
    }
}

/// Event sink that ignores everything.
pub struct NullEvents;

impl TransferEvents for NullEvents {}
