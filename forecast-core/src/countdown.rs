use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// What the presentation layer shows about the next automatic refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshState {
    pub next_refresh_at: DateTime<Utc>,
    /// `m:ss`, e.g. `14:05`.
    pub remaining_label: String,
}

/// Countdown to the next refresh.
///
/// Only the target instant is stored. Remaining time is always derived from
/// the clock, so it stays correct if ticks are delayed or skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    interval: Duration,
    next_refresh_at: DateTime<Utc>,
}

impl Countdown {
    pub fn new(interval: Duration, now: DateTime<Utc>) -> Self {
        let mut countdown = Self {
            interval,
            next_refresh_at: now,
        };
        countdown.reset(now);
        countdown
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        let step = TimeDelta::from_std(self.interval).unwrap_or_else(|_| TimeDelta::days(1));
        self.next_refresh_at = now + step;
    }

    /// Time left until the refresh, zero once it is due.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.next_refresh_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_refresh_at
    }

    pub fn label(&self, now: DateTime<Utc>) -> String {
        format_remaining(self.remaining(now))
    }

    pub fn state(&self, now: DateTime<Utc>) -> RefreshState {
        RefreshState {
            next_refresh_at: self.next_refresh_at,
            remaining_label: self.label(now),
        }
    }
}

/// Minutes and zero-padded seconds; partial seconds are dropped.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
