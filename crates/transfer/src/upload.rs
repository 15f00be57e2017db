//! Upload attempts: HTTP PUT with `Content-Range` resume.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::blocking::Body;
use reqwest::header;
use satlink_netbind::BoundNetwork;
use tracing::{debug, info};

use crate::attempt::{Attempt, AttemptOutcome};
use crate::classify::is_clean_disconnect;
use crate::config::TransferConfig;
use crate::control::TransferControl;
use crate::error::TransferError;
use crate::format::format_bytes;
use crate::progress::ProgressMeter;

pub(crate) struct UploadAttempt {
    source: PathBuf,
    url: String,
    control: TransferControl,
    meter: Arc<ProgressMeter>,
    config: TransferConfig,
}

impl UploadAttempt {
    pub(crate) fn new(
        source: PathBuf,
        url: String,
        control: TransferControl,
        meter: Arc<ProgressMeter>,
        config: TransferConfig,
    ) -> Self {
        Self {
            source,
            url,
            control,
            meter,
            config,
        }
    }
}

impl Attempt for UploadAttempt {
    fn run(&mut self, net: &BoundNetwork, offset: u64) -> AttemptOutcome {
        let file_size = match std::fs::metadata(&self.source) {
            Ok(meta) => meta.len(),
            Err(_) => {
                return AttemptOutcome::Fatal(
                    TransferError::SourceMissing(self.source.clone()).to_string(),
                );
            }
        };
        self.meter.set_total_size(file_size as i64);

        // Everything already confirmed by an earlier segment or attempt.
        if file_size > 0 && offset >= file_size {
            return AttemptOutcome::Completed(success_message(&self.meter));
        }

        let mut file = match File::open(&self.source) {
            Ok(file) => file,
            Err(_) => {
                return AttemptOutcome::Fatal(
                    TransferError::SourceMissing(self.source.clone()).to_string(),
                );
            }
        };
        if let Err(e) = file.seek(SeekFrom::Start(offset)) {
            return AttemptOutcome::Fatal(
                TransferError::SeekFailed { offset, source: e }.to_string(),
            );
        }

        let remaining = file_size - offset;
        let body_done = Arc::new(AtomicBool::new(false));
        let reader = BodyReader {
            file,
            len: remaining,
            sent: 0,
            chunk_size: self.config.chunk_size,
            control: self.control.clone(),
            meter: Arc::clone(&self.meter),
            done: Arc::clone(&body_done),
        };

        self.meter.begin_attempt();
        let mut request = net
            .http()
            .put(&self.url)
            .body(Body::sized(reader, remaining));
        if file_size > 0 {
            request = request.header(
                header::CONTENT_RANGE,
                format!("bytes {offset}-{}/{file_size}", file_size - 1),
            );
        }

        match request.send() {
            Ok(response) => {
                let status = response.status();
                // Drain so the connection is released cleanly.
                let _ = response.bytes();
                debug!(url = %self.url, status = status.as_u16(), "upload response");

                let sent = self.meter.transferred();
                if status.is_success() && sent >= file_size {
                    AttemptOutcome::Completed(success_message(&self.meter))
                } else if status.as_u16() == 400 {
                    AttemptOutcome::Fatal("Upload failed: Bad Request (400)".into())
                } else if status.as_u16() == 416 {
                    AttemptOutcome::Fatal("Upload failed: Range Not Satisfiable (416)".into())
                } else if status.is_success() {
                    AttemptOutcome::Transient(format!(
                        "server acknowledged {sent} of {file_size} bytes"
                    ))
                } else {
                    AttemptOutcome::Transient(format!("HTTP {}", status.as_u16()))
                }
            }
            Err(e) => {
                if self.control.cancel_requested() {
                    return AttemptOutcome::Interrupted;
                }
                // The peer had the whole body before it hung up; count the
                // upload as delivered rather than re-sending everything.
                if body_done.load(Ordering::Acquire) && is_clean_disconnect(&e) {
                    info!(url = %self.url, error = %e, "treating post-send disconnect as success");
                    return AttemptOutcome::Completed(success_message(&self.meter));
                }
                AttemptOutcome::from_error(TransferError::Http(e))
            }
        }
    }
}

fn success_message(meter: &ProgressMeter) -> String {
    format!(
        "Upload successful. Total uploaded: {}",
        format_bytes(meter.transferred())
    )
}

/// Streams the source file into the request body in bounded chunks,
/// checking the stop flag before every read so a cancel lands between
/// chunks instead of after the file is exhausted.
struct BodyReader {
    file: File,
    len: u64,
    sent: u64,
    chunk_size: usize,
    control: TransferControl,
    meter: Arc<ProgressMeter>,
    done: Arc<AtomicBool>,
}

impl Read for BodyReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.control.cancel_requested() {
            return Err(std::io::Error::other("transfer stopped by caller"));
        }
        let left = usize::try_from(self.len - self.sent).unwrap_or(usize::MAX);
        if left == 0 {
            self.done.store(true, Ordering::Release);
            return Ok(0);
        }
        let limit = buf.len().min(self.chunk_size).min(left);
        let n = self.file.read(&mut buf[..limit])?;
        self.sent += n as u64;
        if n > 0 {
            self.meter.add_bytes(n as u64);
        }
        if self.sent >= self.len {
            self.done.store(true, Ordering::Release);
        }
        Ok(n)
    }
}
