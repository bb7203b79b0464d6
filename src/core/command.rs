use chrono::{DateTime, Utc};

/// Reserved command body that shuts the supplier down cleanly.
pub const QUIT: &str = "quit";

/// An operator command read from the control queue.
///
/// Commands are immutable once received and are removed from the queue as
/// part of the read, so a command is observed at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl Command {
    pub fn new(body: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            body: body.into(),
            sent_at,
        }
    }

    /// Whether this command asks the supplier to terminate.
    pub fn is_quit(&self) -> bool {
        self.body == QUIT
    }
}
