//! External clipboard helper invocation.
//!
//! The platform helper bridges to the OS browser extension and prints one
//! JSON object on stdout. Invocation is bounded by a hard timeout; every
//! failure mode degrades to "no capture".

use std::process::{Command, Stdio};
use std::time::Duration;

use crossbeam::channel::{RecvTimeoutError, bounded};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::core::{ClipboardHint, ClipboardKind, WallClock};
use crate::error::Transience;

/// Hard ceiling on one helper invocation.
pub const HELPER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum HelperError {
    #[error("helper command is not configured")]
    NotConfigured,
    #[error("helper failed to start: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
    #[error("helper timed out after {0:?}")]
    Timeout(Duration),
    #[error("helper exited with {status}")]
    Exit { status: std::process::ExitStatus },
    #[error("helper response was not valid JSON: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },
}

impl HelperError {
    pub fn transience(&self) -> Transience {
        match self {
            HelperError::NotConfigured => Transience::Permanent,
            _ => Transience::Retryable,
        }
    }
}

/// Wire shape of the helper's stdout.
#[derive(Debug, Deserialize)]
struct HelperResponse {
    #[serde(rename = "type")]
    kind: ClipboardKind,
    text: String,
    timestamp: u64,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Run the configured helper command and parse its capture.
///
/// `command` is the argv to run; empty means no helper is configured.
/// Returns `Ok(None)` when the helper reports no capture (empty output).
pub fn query_helper(command: &[String]) -> Result<Option<ClipboardHint>, HelperError> {
    let (program, args) = command.split_first().ok_or(HelperError::NotConfigured)?;

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| HelperError::Spawn { source })?;

    // The helper may hang on a dead browser pipe; wait on a side thread so
    // the caller can give up. An abandoned helper exits on its own when the
    // pipe closes.
    let (tx, rx) = bounded(1);
    std::thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });

    let output = match rx.recv_timeout(HELPER_TIMEOUT) {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => return Err(HelperError::Spawn { source }),
        Err(RecvTimeoutError::Timeout) => return Err(HelperError::Timeout(HELPER_TIMEOUT)),
        Err(RecvTimeoutError::Disconnected) => return Err(HelperError::Timeout(HELPER_TIMEOUT)),
    };

    if !output.status.success() {
        return Err(HelperError::Exit {
            status: output.status,
        });
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let response: HelperResponse = serde_json::from_str(raw)?;
    debug!(kind = ?response.kind, "clipboard capture received");
    Ok(Some(ClipboardHint {
        text: response.text,
        ts: WallClock(response.timestamp),
        kind: response.kind,
        url: response.url.unwrap_or_default(),
        title: response.title.unwrap_or_default(),
        workspace_path: String::new(),
        relative_path: String::new(),
    }))
}
