use matchday_api::MatchId;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Goal(Side),
    Started,
    Final,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Goal(_) => "goal",
            EventKind::Started => "started",
            EventKind::Final => "final",
        }
    }
}

/// A state change seen by the live poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchEvent {
    pub kind: EventKind,
    pub match_id: MatchId,
    pub message: String,
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.kind.label(), self.message, self.match_id)
    }
}

/// Where poller events go. Must not block: the poller calls this while it
/// holds its state lock.
pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, event: MatchEvent);
}

/// Forwards events into a channel for the front end to drain.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    events: mpsc::UnboundedSender<MatchEvent>,
}

impl ChannelSink {
    pub fn new(events: mpsc::UnboundedSender<MatchEvent>) -> Self {
        Self { events }
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, event: MatchEvent) {
        // Receiver gone means we're shutting down.
        let _ = self.events.send(event);
    }
}
