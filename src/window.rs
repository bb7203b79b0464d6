use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::Command;

/// Derive the remaining work window from a batch of received commands.
///
/// The window re-arms off the *freshest* command in the batch: a command
/// sent just before `now` grants nearly the full window, while one close to
/// `full_window` old grants almost none. Ages beyond the full window (and
/// send timestamps in the future, which would make the age negative) clamp
/// the result into `[0, full_window]`.
///
/// Callers skip this for empty batches; an empty slice yields zero.
pub fn compute_remaining(
    commands: &[Command],
    full_window: Duration,
    now: DateTime<Utc>,
) -> Duration {
    let min_age_ms = commands
        .iter()
        .map(|cmd| (now - cmd.sent_at).num_milliseconds().max(0))
        .min();

    match min_age_ms {
        Some(age_ms) => full_window.saturating_sub(Duration::from_millis(age_ms as u64)),
        None => Duration::ZERO,
    }
}
