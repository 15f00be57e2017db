//! The resumable session loop shared by both engines.

use std::thread;
use std::time::Duration;

use satlink_netbind::NetworkBinder;
use tracing::{debug, info, warn};

use crate::attempt::{Attempt, AttemptOutcome};
use crate::config::TransferConfig;
use crate::control::{ResumePoint, TransferControl};
use crate::error::TransferError;
use crate::events::TransferEvents;
use crate::format::{format_speed, format_time};
use crate::progress::ProgressMeter;

/// Terminal state of one task instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The transfer completed; `elapsed` covers all run segments.
    Completed {
        message: String,
        bytes: u64,
        elapsed: Duration,
    },
    /// A fatal condition ended the session.
    Failed {
        message: String,
        bytes: u64,
        elapsed: Duration,
    },
    /// A pause request ended the session; `resume` seeds the next instance.
    Paused { resume: ResumePoint },
    /// A cancel request ended the session; resume state is discarded.
    Cancelled,
}

enum LoopEnd {
    Success(String),
    Fatal(String),
    Interrupted,
}

/// Drives one attempt mechanism to its terminal state: unlimited attempts
/// with a fixed delay, a fresh network handle per attempt, and exactly one
/// terminal callback.
pub(crate) fn run_session(
    attempt: &mut dyn Attempt,
    binder: &dyn NetworkBinder,
    control: &TransferControl,
    meter: &ProgressMeter,
    events: &dyn TransferEvents,
    config: &TransferConfig,
) -> TransferOutcome {
    events.started();

    if control.cancel_requested() && !control.pause_requested() {
        // Cancelled before any work: zero stats, nothing to resume.
        events.cancelled("cancelled before start", &format_speed(0.0), &format_time(0));
        return TransferOutcome::Cancelled;
    }

    let mut attempts: u32 = 0;
    let end = loop {
        // The flags may have flipped during the retry sleep.
        if control.cancel_requested() {
            break LoopEnd::Interrupted;
        }

        // Resume wherever the previous attempts left the counter.
        let offset = meter.transferred();
        let outcome = match binder.current_network() {
            None => {
                debug!(offset, "no usable network for this attempt");
                AttemptOutcome::from_error(TransferError::NetworkUnavailable)
            }
            Some(net) => {
                debug!(network = net.label(), offset, "starting attempt");
                attempt.run(&net, offset)
            }
        };

        match outcome {
            AttemptOutcome::Completed(message) => break LoopEnd::Success(message),
            AttemptOutcome::Fatal(message) => break LoopEnd::Fatal(message),
            AttemptOutcome::Interrupted => break LoopEnd::Interrupted,
            AttemptOutcome::Transient(reason) => {
                attempts += 1;
                warn!(
                    attempt = attempts,
                    delay_ms = config.retry_delay.as_millis() as u64,
                    reason = %reason,
                    "attempt failed, retrying"
                );
                events.retry_scheduled(attempts, config.retry_delay);
                thread::sleep(config.retry_delay);
            }
        }
    };

    let segment_elapsed = meter.segment_elapsed();
    let bytes = meter.transferred();
    let avg_speed = format_speed(meter.segment_speed());

    match end {
        LoopEnd::Interrupted if control.pause_requested() => {
            let message = format!("paused at {bytes} bytes");
            info!(bytes, "transfer paused");
            events.paused(&message, bytes, segment_elapsed);
            TransferOutcome::Paused {
                resume: ResumePoint {
                    bytes,
                    elapsed: meter.total_elapsed(),
                },
            }
        }
        LoopEnd::Interrupted => {
            info!(bytes, "transfer cancelled");
            events.cancelled(
                "cancelled by caller",
                &avg_speed,
                &format_time(segment_elapsed.as_millis() as i64),
            );
            TransferOutcome::Cancelled
        }
        LoopEnd::Success(message) => {
            let elapsed = meter.total_elapsed();
            info!(bytes, elapsed_ms = elapsed.as_millis() as u64, "transfer complete");
            events.finished(
                &message,
                &avg_speed,
                &format_time(elapsed.as_millis() as i64),
                bytes,
            );
            TransferOutcome::Completed {
                message,
                bytes,
                elapsed,
            }
        }
        LoopEnd::Fatal(message) => {
            let elapsed = meter.total_elapsed();
            warn!(error = %message, bytes, "transfer failed");
            events.finished(
                &message,
                &avg_speed,
                &format_time(elapsed.as_millis() as i64),
                bytes,
            );
            TransferOutcome::Failed {
                message,
                bytes,
                elapsed,
            }
        }
    }
}
