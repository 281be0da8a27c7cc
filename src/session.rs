// src/session.rs
//
// A connection session: the open serial link, the three sensor logs and the
// event stream between them. Constructed on connect, torn down on
// disconnect — there is no ambient connection state outside this object.

use tokio::sync::mpsc;

use crate::command::Command;
use crate::io::{LinkConfig, LinkEvent, SerialLink};
use crate::logs::LogStore;

/// Connection state of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Connected,
    /// The stream ended; the reason is "disconnected", "stopped" or "error".
    Ended(String),
}

pub struct Session {
    link: SerialLink,
    events: mpsc::Receiver<LinkEvent>,
    status: SessionStatus,
    pub logs: LogStore,
}

impl Session {
    /// Open the link and start a fresh session. Failure to open reports the
    /// error and establishes nothing.
    pub fn connect(config: LinkConfig, log_limit: usize) -> Result<Session, String> {
        let (link, events) = SerialLink::open(config)?;
        Ok(Session {
            link,
            events,
            status: SessionStatus::Connected,
            logs: LogStore::new(log_limit),
        })
    }

    pub fn port_name(&self) -> &str {
        self.link.port_name()
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }

    /// Encode and transmit a command. Sending on an ended session is an
    /// explicit error rather than a silent no-op.
    pub fn send(&self, command: &Command) -> Result<(), String> {
        if !self.is_connected() {
            return Err(format!("Not connected ({})", self.port_name()));
        }
        let bytes = command.encode()?;
        self.link.transmit(&bytes)
    }

    /// Wait for the next link event. Returns `None` once the read thread has
    /// gone away after the stream ended.
    pub async fn next_event(&mut self) -> Option<LinkEvent> {
        self.events.recv().await
    }

    /// Fold a link event into the session. Records land in their logs;
    /// stream-end events flip the status. Returns an error message to
    /// surface to the user, if any.
    pub fn apply(&mut self, event: LinkEvent) -> Option<String> {
        match event {
            LinkEvent::Records(records) => {
                for record in records {
                    self.logs.append(record);
                }
                None
            }
            LinkEvent::Ended(reason) => {
                let notice = match reason.as_str() {
                    "disconnected" => Some("Device disconnected".to_string()),
                    "error" => Some("Stream ended after a read error".to_string()),
                    _ => None,
                };
                self.status = SessionStatus::Ended(reason);
                notice
            }
            LinkEvent::Error(message) => Some(message),
        }
    }

    /// Stop the read loop and release the port.
    pub async fn shutdown(self) {
        self.link.shutdown().await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify_line, Channel};

    // Session over a stub link: a real port is not needed to exercise the
    // event folding and send gating.
    fn stub_session() -> (Session, mpsc::Sender<LinkEvent>) {
        let (link, events_tx, events) = SerialLink::stub();
        (
            Session {
                link,
                events,
                status: SessionStatus::Connected,
                logs: LogStore::new(100),
            },
            events_tx,
        )
    }

    #[tokio::test]
    async fn test_records_route_to_logs() {
        let (mut session, _tx) = stub_session();
        let notice = session.apply(LinkEvent::Records(classify_line("T:23 D:150")));
        assert!(notice.is_none());
        assert!(session.is_connected());
        assert_eq!(session.logs.get(Channel::Temperature).len(), 1);
        assert_eq!(session.logs.get(Channel::Distance).len(), 1);
        assert_eq!(session.logs.get(Channel::Light).len(), 0);
    }

    #[tokio::test]
    async fn test_ended_event_flips_status() {
        let (mut session, _tx) = stub_session();
        let notice = session.apply(LinkEvent::Ended("disconnected".to_string()));
        assert_eq!(notice.as_deref(), Some("Device disconnected"));
        assert_eq!(
            *session.status(),
            SessionStatus::Ended("disconnected".to_string())
        );
    }

    #[tokio::test]
    async fn test_send_on_ended_session_is_an_error() {
        let (mut session, _tx) = stub_session();
        session.apply(LinkEvent::Ended("stopped".to_string()));
        let err = session.send(&Command::LedOn).unwrap_err();
        assert!(err.contains("Not connected"));
    }

    #[tokio::test]
    async fn test_events_flow_through_channel() {
        let (mut session, tx) = stub_session();
        tx.send(LinkEvent::Records(classify_line("LDR:42")))
            .await
            .unwrap();
        let event = session.next_event().await.unwrap();
        session.apply(event);
        assert_eq!(session.logs.get(Channel::Light).len(), 1);
    }
}
