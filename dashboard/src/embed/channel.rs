//! # Parent Channel
//!
//! Transport between the dashboard and the context embedding it.
//!
//! Outbound, every message goes through [`ParentChannel`]. Inbound, raw
//! parent messages are decoded by the shared adapter list and forwarded to
//! the mode controller as [`ControllerEvent`]s.
//!
//! The headless binary speaks JSON lines: one message per line on stdout
//! (outbound) and stdin (inbound). Log output never goes to stdout.

use std::io::Write;

use parking_lot::Mutex;
use serde_json::Value;
use shared::protocol::{decode_parent_message, matching_adapter, Message, ParentUpdate};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::controller::{ControllerEvent, GroupOrigin};
use crate::core::error::ChannelError;

/// Outbound side of the parent link.
pub trait ParentChannel: Send + Sync {
    /// Post an already encoded message. Used directly for legacy shapes.
    fn post_value(&self, value: Value) -> Result<(), ChannelError>;

    fn post(&self, message: &Message) -> Result<(), ChannelError> {
        self.post_value(message.to_value())
    }

    /// `false` when there is no parent to talk to.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Used when the dashboard runs top-level.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedChannel;

impl ParentChannel for DetachedChannel {
    fn post_value(&self, _value: Value) -> Result<(), ChannelError> {
        Err(ChannelError::Detached)
    }

    fn is_attached(&self) -> bool {
        false
    }
}

/// Writes each message as one JSON line.
pub struct LineChannel<W: Write + Send> {
    writer: Mutex<W>,
}

impl LineChannel<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> LineChannel<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> ParentChannel for LineChannel<W> {
    fn post_value(&self, value: Value) -> Result<(), ChannelError> {
        let line = serde_json::to_string(&value).map_err(|e| ChannelError::Encode(e.to_string()))?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}").map_err(|e| ChannelError::Io(e.to_string()))?;
        writer.flush().map_err(|e| ChannelError::Io(e.to_string()))?;

        let kind = value.get("type").and_then(Value::as_str).unwrap_or("legacy");
        tracing::trace!(kind, "Posted message to parent");
        Ok(())
    }
}

/// Decode a raw parent message into controller events. Unrecognised or
/// malformed messages yield nothing.
pub fn events_from_message(raw: &Value) -> Vec<ControllerEvent> {
    decode_parent_message(raw)
        .into_iter()
        .map(|update| match update {
            ParentUpdate::Token(token) => ControllerEvent::TokenReceived(token),
            ParentUpdate::Group(code) => ControllerEvent::GroupSelected {
                code,
                origin: GroupOrigin::Message,
            },
        })
        .collect()
}

/// Read JSON lines from `reader` and forward decoded events until the input
/// ends or the controller goes away. Returns the number of events forwarded.
pub async fn forward_lines<R>(reader: R, events: async_channel::Sender<ControllerEvent>) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Parent input closed with error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let raw: Value = match serde_json::from_str(&line) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring non-JSON parent line");
                continue;
            }
        };

        let decoded = events_from_message(&raw);
        if decoded.is_empty() {
            tracing::debug!("Ignoring parent message with no recognised shape");
            continue;
        }
        tracing::debug!(
            adapter = matching_adapter(&raw).unwrap_or("unknown"),
            updates = decoded.len(),
            "Parent message decoded"
        );

        for event in decoded {
            if events.send(event).await.is_err() {
                tracing::debug!("Controller gone, stopping parent input");
                return forwarded;
            }
            forwarded += 1;
        }
    }

    forwarded
}
