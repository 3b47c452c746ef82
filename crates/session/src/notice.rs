use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
struct Pending {
    text: String,
    dismiss_at: Instant,
}

/// Holds at most one transient notice. Showing a new notice replaces the
/// current one and its pending dismissal.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    pending: Option<Pending>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self { Self { ttl, pending: None } }

    pub fn show(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some(Pending { text: text.into(), dismiss_at: now + self.ttl });
    }

    pub fn current(&self) -> Option<&str> { self.pending.as_ref().map(|p| p.text.as_str()) }

    pub fn deadline(&self) -> Option<Instant> { self.pending.as_ref().map(|p| p.dismiss_at) }

    /// Clears the notice if its deadline has passed and returns its text.
    pub fn dismiss_due(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(p) if p.dismiss_at <= now => self.pending.take().map(|p| p.text),
            _ => None,
        }
    }
}
