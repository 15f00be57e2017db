//! The single-attempt abstraction shared by both engines.

use satlink_netbind::BoundNetwork;

use crate::classify::{ErrorClass, classify};
use crate::error::TransferError;

/// Terminal state of one connect/transfer/cleanup cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    /// The transfer finished; the session ends successfully.
    Completed(String),
    /// The attempt failed in a way worth retrying.
    Transient(String),
    /// The attempt failed in a way that terminates the session.
    Fatal(String),
    /// A stop flag interrupted the attempt; the flags decide whether the
    /// session reports paused or cancelled.
    Interrupted,
}

impl AttemptOutcome {
    pub(crate) fn from_error(err: TransferError) -> Self {
        match classify(&err) {
            ErrorClass::Transient => Self::Transient(err.to_string()),
            ErrorClass::Fatal => Self::Fatal(err.to_string()),
        }
    }
}

/// One resumable transfer mechanism (download or upload).
///
/// The session loop owns retries, delays, and bookkeeping; an `Attempt`
/// only knows how to move bytes once, starting from `offset`, over the
/// network handle it is given.
pub(crate) trait Attempt {
    fn run(&mut self, net: &BoundNetwork, offset: u64) -> AttemptOutcome;
}
