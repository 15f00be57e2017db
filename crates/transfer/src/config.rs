//! Engine tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for one transfer.
///
/// The defaults match the narrowband profile the engine was built for.
/// Per-I/O timeouts live on the network handle
/// ([`satlink_netbind::BindConfig`]); the session itself has no deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes moved per chunk. The stop flags are observed between chunks,
    /// so this also bounds cancellation latency outside of blocking I/O.
    pub chunk_size: usize,
    /// Minimum spacing between progress events after the first chunk of an
    /// attempt.
    pub progress_interval: Duration,
    /// Fixed wait between attempts. No backoff curve: on a link that drops
    /// for minutes at a time, a constant short retry catches the next
    /// usable window soonest.
    pub retry_delay: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            progress_interval: Duration::from_millis(500),
            retry_delay: Duration::from_secs(1),
        }
    }
}
