//! Resumable file transfers over intermittent narrowband links.
//!
//! Two isomorphic engines, a downloader (HTTP GET with `Range`) and an
//! uploader (HTTP PUT with `Content-Range`), share one retry skeleton:
//! unlimited attempts at a fixed delay, a fresh network handle acquired per
//! attempt through [`satlink_netbind::NetworkBinder`], and cooperative
//! pause/cancel observed at every chunk boundary. Progress and lifecycle
//! notifications land on a caller-supplied [`TransferEvents`]
//! implementation; resume state travels between task instances as a plain
//! [`ResumePoint`] held by the caller; nothing is persisted here.
//!
//! Each task runs to exactly one terminal callback on a dedicated worker
//! thread and is then discarded; resuming a paused transfer means building
//! a new task seeded with the reported resume point.

mod attempt;
mod classify;
mod config;
mod control;
mod download;
mod error;
mod events;
pub mod format;
mod progress;
mod session;
mod task;
mod upload;

pub use config::TransferConfig;
pub use control::{ResumePoint, TransferControl};
pub use error::TransferError;
pub use events::{NullEvents, TransferEvents};
pub use session::TransferOutcome;
pub use task::{DownloadTask, TransferHandle, UploadTask};
