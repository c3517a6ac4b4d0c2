//! Rendering of session events

use chatlink_protocol::{DecodedFrame, DecodedMessage, RawPayload};
use chatlink_websocket::SessionEvent;
use owo_colors::{OwoColorize, Style};
use serde_json::json;

use crate::cli::OutputFormat;
use crate::error::CliResult;

/// Formats session events for the terminal
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    format: OutputFormat,
    colored: bool,
}

impl Formatter {
    /// Formatter for `format`; `colored` enables ANSI styling
    #[must_use]
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    /// Print one event; heartbeat acks are skipped in human mode
    pub fn display(&self, event: &SessionEvent) -> CliResult<()> {
        if let Some(line) = self.render(event)? {
            println!("{line}");
        }
        Ok(())
    }

    /// Render one event to a single line, `None` when it is not shown
    pub fn render(&self, event: &SessionEvent) -> CliResult<Option<String>> {
        match self.format {
            OutputFormat::Json => Ok(Some(serde_json::to_string(&event_json(event))?)),
            OutputFormat::Human => Ok(self.render_human(event)),
        }
    }

    fn render_human(&self, event: &SessionEvent) -> Option<String> {
        match event {
            SessionEvent::StateChanged(state) => Some(format!(
                "{} {}",
                self.paint("session", Style::new().bright_black()),
                self.paint(&state.to_string(), Style::new().bright_cyan().bold())
            )),
            SessionEvent::Disconnected { reason } => Some(format!(
                "{} {}",
                self.paint("disconnected:", Style::new().bright_yellow().bold()),
                reason
            )),
            SessionEvent::ForcedReconnect { reason } => Some(format!(
                "{} {}",
                self.paint("reconnecting:", Style::new().bright_yellow().bold()),
                reason
            )),
            SessionEvent::Message(frame) if frame.is_heartbeat_ack() => None,
            SessionEvent::Message(frame) => Some(self.render_frame(frame)),
        }
    }

    fn render_frame(&self, frame: &DecodedFrame) -> String {
        let user = Style::new().bright_green().bold();
        match &frame.message {
            DecodedMessage::PushMessage(msg) => format!(
                "{} -> {}: {}",
                self.paint(&msg.from_user, user),
                msg.to_user,
                msg.content
            ),
            DecodedMessage::DraftInput(draft) => format!(
                "{} is typing in {}",
                self.paint(&draft.from_user, user),
                draft.conversation_id
            ),
            DecodedMessage::FileSendMessage(file) => format!(
                "{} sent {} ({} bytes) {}",
                self.paint(&file.from_user, user),
                self.paint(&file.file_name, Style::new().bright_yellow()),
                file.file_size,
                file.file_url
            ),
            DecodedMessage::EditMessage(edit) => format!(
                "{} {} is now: {}",
                self.paint("edited", Style::new().bright_blue()),
                edit.msg_id,
                edit.content
            ),
            DecodedMessage::HeartbeatAck(ack) => format!("heartbeat ack at {}", ack.server_time),
            DecodedMessage::Envelope(_) => format!(
                "{} {}",
                self.paint("frame", Style::new().bright_blue()),
                frame.command.as_deref().unwrap_or("?")
            ),
            DecodedMessage::RawFallback(raw) => {
                let command = frame.command.as_deref().unwrap_or("?");
                let body = match raw {
                    RawPayload::Json(value) => value.to_string(),
                    RawPayload::Text(text) => text.clone(),
                    RawPayload::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
                };
                format!(
                    "{} {} {}",
                    self.paint("raw", Style::new().bright_black()),
                    command,
                    body
                )
            }
        }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.colored {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }
}

fn event_json(event: &SessionEvent) -> serde_json::Value {
    match event {
        SessionEvent::StateChanged(state) => {
            json!({ "event": "state", "state": state.to_string() })
        }
        SessionEvent::Message(frame) => json!({ "event": "message", "frame": frame }),
        SessionEvent::Disconnected { reason } => {
            json!({ "event": "disconnected", "reason": reason })
        }
        SessionEvent::ForcedReconnect { reason } => {
            json!({ "event": "forced_reconnect", "reason": reason })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatlink_protocol::{BaseHeader, HeartbeatAck, PushMessage};
    use chatlink_websocket::SessionState;
    use pretty_assertions::assert_eq;

    fn plain() -> Formatter {
        Formatter::new(OutputFormat::Human, false)
    }

    fn push() -> SessionEvent {
        SessionEvent::Message(DecodedFrame {
            command: Some("push_message".to_string()),
            message: DecodedMessage::PushMessage(PushMessage {
                base: Some(BaseHeader::for_command("push_message")),
                from_user: "alice".to_string(),
                to_user: "bob".to_string(),
                content: "hi".to_string(),
                ..Default::default()
            }),
        })
    }

    #[test]
    fn test_human_push_message() {
        let line = plain().render(&push()).unwrap();
        assert_eq!(line.as_deref(), Some("alice -> bob: hi"));
    }

    #[test]
    fn test_human_skips_heartbeat_ack() {
        let ack = SessionEvent::Message(DecodedFrame {
            command: Some("HEARTBEAT_ACK".to_string()),
            message: DecodedMessage::HeartbeatAck(HeartbeatAck::default()),
        });
        assert_eq!(plain().render(&ack).unwrap(), None);
    }

    #[test]
    fn test_human_raw_text() {
        let raw = SessionEvent::Message(DecodedFrame {
            command: None,
            message: DecodedMessage::RawFallback(RawPayload::Text("/status ok".to_string())),
        });
        assert_eq!(
            plain().render(&raw).unwrap().as_deref(),
            Some("raw ? /status ok")
        );
    }

    #[test]
    fn test_human_state_and_disconnect() {
        let f = plain();
        assert_eq!(
            f.render(&SessionEvent::StateChanged(SessionState::Open))
                .unwrap()
                .as_deref(),
            Some("session open")
        );
        assert_eq!(
            f.render(&SessionEvent::Disconnected {
                reason: "closed by server: 1000 bye".to_string()
            })
            .unwrap()
            .as_deref(),
            Some("disconnected: closed by server: 1000 bye")
        );
    }

    #[test]
    fn test_json_line() {
        let f = Formatter::new(OutputFormat::Json, false);
        let line = f.render(&push()).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "message");
        assert_eq!(value["frame"]["command"], "push_message");
        assert_eq!(value["frame"]["message"]["kind"], "push_message");
        assert_eq!(value["frame"]["message"]["payload"]["content"], "hi");
    }

    #[test]
    fn test_colored_output_differs() {
        let colored = Formatter::new(OutputFormat::Human, true)
            .render(&push())
            .unwrap()
            .unwrap();
        assert!(colored.contains("alice"));
        assert_ne!(colored, "alice -> bob: hi");
    }
}
