//! JSON Lines Bridge
//!
//! Connects a display engine to a host over a pair of byte streams. Each
//! input line is one [`EngineInput`]:
//!
//! ```text
//! {"id": 1, "command": "loadContent", "args": {"isDisplay": true}}
//! {"event": {"type": "transitionFinished", "target": "surface"}}
//! ```
//!
//! Each output line is one [`OutputLine`], tagged by `kind`: surface ops for
//! the renderer, notifications and command replies for the host. Screen
//! commands reply twice, once when dispatched (`pending`) and once when the
//! transition settles (`completed`).

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use display_core::{
    Dispatched, EngineInput, HostNotification, InputSender, Outcome, RenderSurface, Reply,
    SurfaceOp, DEFAULT_MEDIA_TYPES,
};

/// Sending half of the output stream
pub type OutputSender = mpsc::UnboundedSender<OutputLine>;

/// Bridge I/O failures
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Reading or writing a stream failed
    #[error("stream I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An output line could not be encoded
    #[error("failed to encode output line: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One line written to the host
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutputLine {
    /// Presentation change for the renderer
    Surface {
        /// The change
        #[serde(flatten)]
        op: SurfaceOp,
    },
    /// Engine → host message
    Notification {
        /// The message
        #[serde(flatten)]
        notification: HostNotification,
    },
    /// Answer to one command
    Reply {
        /// Correlation id from the input line
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        /// Command name as received
        command: String,
        /// Whether the command was accepted
        ok: bool,
        /// Whether a `completed` line will follow
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        pending: bool,
        /// Getter answer
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
        /// Failure message
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// A pending screen command settled
    Completed {
        /// Correlation id from the input line
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        /// Command name as received
        command: String,
        /// Visibility reached; absent when a later command superseded it
        #[serde(skip_serializing_if = "Option::is_none")]
        visibility: Option<String>,
        /// Whether a later command canceled this one
        superseded: bool,
    },
    /// An input line could not be understood
    InputError {
        /// 1-based line number
        line: usize,
        /// Parse failure
        message: String,
    },
}

// =============================================================================
// Surface
// =============================================================================

/// Render surface that serializes every op onto the output stream
#[derive(Clone, Debug)]
pub struct JsonLineSurface {
    tx: OutputSender,
    media_types: Vec<String>,
}

impl JsonLineSurface {
    /// Write ops to `tx`; an empty `media_types` keeps the engine defaults
    pub fn new(tx: OutputSender, media_types: Vec<String>) -> Self {
        Self { tx, media_types }
    }
}

impl RenderSurface for JsonLineSurface {
    fn apply(&mut self, op: SurfaceOp) {
        if self.tx.send(OutputLine::Surface { op }).is_err() {
            tracing::debug!("Output closed; dropping surface op");
        }
    }

    fn supports_media_type(&self, mime: &str) -> bool {
        if self.media_types.is_empty() {
            DEFAULT_MEDIA_TYPES.contains(&mime)
        } else {
            self.media_types.iter().any(|m| m == mime)
        }
    }
}

// =============================================================================
// Replies
// =============================================================================

/// Write the reply for one dispatched command
///
/// A pending screen command also gets a task that writes its `completed` line
/// once the transition settles.
pub fn publish_reply(dispatched: Dispatched, out: &OutputSender) {
    let Dispatched {
        id,
        command,
        result,
    } = dispatched;

    let (line, completion) = match result {
        Ok(Reply::Pending(completion)) => (reply(id, &command, true, None), Some(completion)),
        Ok(Reply::LineCount(lines)) => (reply(id, &command, false, Some(lines.into())), None),
        Ok(Reply::VideoFormats(formats)) => (
            reply(id, &command, false, Some(serde_json::Value::from(formats))),
            None,
        ),
        Ok(Reply::Done | Reply::Ignored) => (reply(id, &command, false, None), None),
        Err(e) => (
            OutputLine::Reply {
                id,
                command: command.clone(),
                ok: false,
                pending: false,
                value: None,
                error: Some(e.to_string()),
            },
            None,
        ),
    };
    let _ = out.send(line);

    if let Some(completion) = completion {
        let out = out.clone();
        tokio::spawn(async move {
            let line = match completion.await {
                Outcome::Completed(visibility) => OutputLine::Completed {
                    id,
                    command,
                    visibility: Some(visibility.to_string()),
                    superseded: false,
                },
                Outcome::Superseded => OutputLine::Completed {
                    id,
                    command,
                    visibility: None,
                    superseded: true,
                },
            };
            let _ = out.send(line);
        });
    }
}

fn reply(
    id: Option<u64>,
    command: &str,
    pending: bool,
    value: Option<serde_json::Value>,
) -> OutputLine {
    OutputLine::Reply {
        id,
        command: command.to_string(),
        ok: true,
        pending,
        value,
        error: None,
    }
}

/// Copy engine notifications onto the output stream until the engine is gone
pub async fn forward_notifications(
    mut notifications: mpsc::Receiver<HostNotification>,
    out: OutputSender,
) {
    while let Some(notification) = notifications.recv().await {
        if out.send(OutputLine::Notification { notification }).is_err() {
            break;
        }
    }
}

// =============================================================================
// Streams
// =============================================================================

/// Parse one input line
///
/// # Errors
///
/// Returns the JSON error when the line is not an [`EngineInput`].
pub fn parse_input(line: &str) -> Result<EngineInput, serde_json::Error> {
    serde_json::from_str(line)
}

/// Forward input lines to the engine until EOF or until the engine stops
///
/// Blank lines are skipped. Malformed lines are reported on `out` and do not
/// stop the stream. Returns the number of inputs forwarded.
///
/// # Errors
///
/// Returns [`BridgeError::Io`] when reading fails.
pub async fn read_inputs<R>(reader: R, tx: InputSender, out: &OutputSender) -> Result<usize, BridgeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0;
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_input(line) {
            Ok(input) => {
                if tx.send(input).await.is_err() {
                    tracing::debug!("Engine stopped; no longer reading input");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Malformed input line");
                let _ = out.send(OutputLine::InputError {
                    line: line_no,
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(forwarded)
}

/// Write output lines until every sender is dropped
///
/// # Errors
///
/// Returns the first encode or write failure.
pub async fn write_outputs<W>(
    mut writer: W,
    mut lines: mpsc::UnboundedReceiver<OutputLine>,
) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.recv().await {
        let mut bytes = serde_json::to_vec(&line)?;
        bytes.push(b'\n');
        writer.write_all(&bytes).await?;
        writer.flush().await?;
    }
    Ok(())
}
