//! Download attempts: HTTP GET with `Range` resume.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::blocking::Response;
use reqwest::header;
use satlink_netbind::BoundNetwork;
use tracing::{debug, warn};

use crate::attempt::{Attempt, AttemptOutcome};
use crate::config::TransferConfig;
use crate::control::TransferControl;
use crate::error::TransferError;
use crate::format::format_bytes;
use crate::progress::ProgressMeter;

pub(crate) struct DownloadAttempt {
    url: String,
    destination: Option<PathBuf>,
    control: TransferControl,
    meter: Arc<ProgressMeter>,
    config: TransferConfig,
}

impl DownloadAttempt {
    pub(crate) fn new(
        url: String,
        destination: Option<PathBuf>,
        control: TransferControl,
        meter: Arc<ProgressMeter>,
        config: TransferConfig,
    ) -> Self {
        Self {
            url,
            destination,
            control,
            meter,
            config,
        }
    }

    fn open_response(&self, net: &BoundNetwork, offset: u64) -> Result<Response, TransferError> {
        let mut request = net
            .http()
            .get(&self.url)
            .header(header::ACCEPT_ENCODING, "identity");
        if offset > 0 {
            request = request.header(header::RANGE, format!("bytes={offset}-"));
        }
        Ok(request.send()?)
    }

    /// Opens the destination at the write offset, or `None` when the body
    /// is only counted (link-exercise mode).
    fn open_sink(&self, offset: u64) -> std::io::Result<Option<File>> {
        let Some(path) = &self.destination else {
            return Ok(None);
        };
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        file.seek(SeekFrom::Start(offset))?;
        Ok(Some(file))
    }
}

impl Attempt for DownloadAttempt {
    fn run(&mut self, net: &BoundNetwork, offset: u64) -> AttemptOutcome {
        let response = match self.open_response(net, offset) {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::from_error(e),
        };

        let status = response.status();
        let write_offset = match status.as_u16() {
            200 => {
                if offset > 0 {
                    warn!(url = %self.url, offset, "server ignored range request, body restarts at zero");
                }
                self.meter.set_total_size(content_length(&response));
                0
            }
            206 => {
                self.meter.set_total_size(partial_total(&response, offset));
                offset
            }
            code => {
                debug!(url = %self.url, code, "download attempt rejected");
                return AttemptOutcome::Transient(format!("HTTP {code}"));
            }
        };

        let mut sink = match self.open_sink(write_offset) {
            Ok(sink) => sink,
            Err(e) => return AttemptOutcome::Fatal(format!("cannot open destination: {e}")),
        };

        self.meter.begin_attempt();
        let mut body = response;
        let mut buf = vec![0u8; self.config.chunk_size];
        loop {
            // The stop flags win over any in-flight chunk.
            if self.control.cancel_requested() {
                return AttemptOutcome::Interrupted;
            }
            match body.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if let Some(file) = sink.as_mut()
                        && let Err(e) = file.write_all(&buf[..n])
                    {
                        return AttemptOutcome::Fatal(format!("destination write failed: {e}"));
                    }
                    self.meter.add_bytes(n as u64);
                }
                Err(e) => return AttemptOutcome::from_error(TransferError::Io(e)),
            }
        }

        AttemptOutcome::Completed(format!(
            "Download successful. Total downloaded: {}",
            format_bytes(self.meter.transferred())
        ))
    }
}

fn content_length(response: &Response) -> i64 {
    response.content_length().map_or(-1, |len| len as i64)
}

/// Total size behind a 206: the `/total` suffix of `Content-Range`, falling
/// back to `offset + Content-Length`, else unknown.
fn partial_total(response: &Response, offset: u64) -> i64 {
    if let Some(value) = response.headers().get(header::CONTENT_RANGE)
        && let Ok(text) = value.to_str()
        && let Some((_, total)) = text.rsplit_once('/')
        && let Ok(total) = total.trim().parse::<i64>()
    {
        return total;
    }
    response.content_length().map_or(-1, |len| (offset + len) as i64)
}
