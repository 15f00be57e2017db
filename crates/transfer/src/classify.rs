//! Transient-versus-fatal classification of attempt errors.
//!
//! A narrowband link drops constantly, so anything that looks like the link
//! (timeouts, DNS misses, socket resets, "network" anywhere in the error
//! chain) is retried forever. Everything else terminates the session the
//! first time it is seen.

use std::error::Error as StdError;
use std::io;

use crate::error::TransferError;

/// Socket-level failure messages that mark an error as transient, matched
/// case-insensitively anywhere in the error chain.
const TRANSIENT_MESSAGES: [&str; 7] = [
    "software caused connection abort",
    "connection reset",
    "network is down",
    "network is unreachable",
    "enetunreach",
    "enetdown",
    "broken pipe",
];

/// Messages that indicate the peer hung up cleanly. Used by the uploader's
/// optimistic post-send heuristic.
const DISCONNECT_MESSAGES: [&str; 4] = [
    "socket closed",
    "connection reset",
    "broken pipe",
    "connection closed",
];

/// How the session loop reacts to a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorClass {
    /// Worth retrying after the fixed delay.
    Transient,
    /// Terminates the session; never retried.
    Fatal,
}

pub(crate) fn classify(err: &TransferError) -> ErrorClass {
    match err {
        TransferError::NetworkUnavailable => ErrorClass::Transient,
        TransferError::SourceMissing(_) | TransferError::SeekFailed { .. } => ErrorClass::Fatal,
        TransferError::Http(e) if e.is_timeout() => ErrorClass::Transient,
        TransferError::Http(e) => classify_chain(e),
        TransferError::Io(e) => classify_io(e),
    }
}

/// Walks an error and its sources, looking for transient I/O kinds and
/// transient message patterns.
fn classify_chain(err: &(dyn StdError + 'static)) -> ErrorClass {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>()
            && classify_io(io_err) == ErrorClass::Transient
        {
            return ErrorClass::Transient;
        }
        if message_is_transient(&e.to_string()) {
            return ErrorClass::Transient;
        }
        current = e.source();
    }
    ErrorClass::Fatal
}

pub(crate) fn classify_io(err: &io::Error) -> ErrorClass {
    match err.kind() {
        io::ErrorKind::TimedOut
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::NetworkDown
        | io::ErrorKind::NetworkUnreachable => ErrorClass::Transient,
        _ if message_is_transient(&err.to_string()) => ErrorClass::Transient,
        _ => ErrorClass::Fatal,
    }
}

fn message_is_transient(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    TRANSIENT_MESSAGES.iter().any(|p| message.contains(p))
        || message.contains("dns error")
        || message.contains("failed to lookup address")
        || message.contains("timed out")
        || message.contains("timeout")
        || message.contains("network")
}

/// Whether an upload transport error looks like the peer closing the
/// connection after it already had everything it needed.
pub(crate) fn is_clean_disconnect(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        let message = e.to_string().to_ascii_lowercase();
        if DISCONNECT_MESSAGES.iter().any(|p| message.contains(p)) {
            return true;
        }
        if let Some(io_err) = e.downcast_ref::<io::Error>()
            && matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            )
        {
            return true;
        }
        current = e.source();
    }
    false
}
