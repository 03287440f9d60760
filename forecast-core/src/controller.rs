//! Refresh state machine.
//!
//! [`RefreshController`] owns the selected city, the displayed snapshot and
//! the countdown. It never performs I/O: transitions hand out a
//! [`FetchTicket`] and the driver reports the outcome back through
//! [`RefreshController::complete`]. Every ticket carries the request
//! generation it was issued for, so a late answer for a superseded request is
//! recognised and dropped.

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    countdown::{Countdown, RefreshState},
    error::FetchError,
    model::ForecastSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// First load, city change or manual refresh; loading indicator shown.
    Loading,
    Ready,
    /// Automatic refresh in flight; previous snapshot stays on screen.
    BackgroundRefreshing,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::BackgroundRefreshing => "background-refreshing",
            Phase::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Failure is shown to the user.
    Foreground,
    /// Failure is logged and otherwise ignored.
    Background,
}

/// A fetch the driver must run for `city`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub city: String,
    pub kind: FetchKind,
}

/// What [`RefreshController::complete`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// New snapshot displayed.
    Applied,
    /// Foreground failure; error state entered.
    Failed,
    /// Background failure; previous snapshot kept.
    Suppressed,
    /// Result belongs to a superseded request and was dropped.
    Stale,
}

/// Observable state for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub city: String,
    pub phase: Phase,
    pub snapshot: Option<ForecastSnapshot>,
    pub refresh: RefreshState,
    pub is_loading: bool,
    pub is_error: bool,
}

#[derive(Debug, Clone)]
pub struct RefreshController {
    city: String,
    phase: Phase,
    snapshot: Option<ForecastSnapshot>,
    countdown: Countdown,
    generation: u64,
}

impl RefreshController {
    pub fn new(city: impl Into<String>, interval: Duration, now: DateTime<Utc>) -> Self {
        Self {
            city: city.into(),
            phase: Phase::Idle,
            snapshot: None,
            countdown: Countdown::new(interval, now),
            generation: 0,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn snapshot(&self) -> Option<&ForecastSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Load the current city for the first time.
    pub fn start(&mut self) -> FetchTicket {
        self.begin(FetchKind::Foreground)
    }

    /// Switch city and restart the cycle. Any outstanding fetch becomes stale.
    pub fn select_city(&mut self, city: impl Into<String>) -> FetchTicket {
        self.city = city.into();
        self.begin(FetchKind::Foreground)
    }

    /// User-requested refresh; refused while a foreground load is running.
    pub fn request_refresh(&mut self) -> Option<FetchTicket> {
        if self.phase == Phase::Loading {
            tracing::debug!(city = %self.city, "refresh ignored, load already in progress");
            return None;
        }
        Some(self.begin(FetchKind::Foreground))
    }

    /// Clock tick. Starts a background refresh once the countdown runs out.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<FetchTicket> {
        if self.phase != Phase::Ready || !self.countdown.is_due(now) {
            return None;
        }

        // Reset at dispatch so a failing provider is not polled every tick.
        self.countdown.reset(now);
        tracing::debug!(city = %self.city, "countdown expired, refreshing in background");
        Some(self.begin(FetchKind::Background))
    }

    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<ForecastSnapshot, FetchError>,
        now: DateTime<Utc>,
    ) -> Completion {
        if ticket.generation != self.generation || ticket.city != self.city {
            tracing::debug!(
                city = %ticket.city,
                generation = ticket.generation,
                current = self.generation,
                "dropping result of superseded request"
            );
            return Completion::Stale;
        }

        match (result, ticket.kind) {
            (Ok(snapshot), _) => {
                tracing::info!(city = %self.city, location = %snapshot.location.name, "forecast updated");
                self.snapshot = Some(snapshot);
                self.phase = Phase::Ready;
                self.countdown.reset(now);
                Completion::Applied
            }
            (Err(err), FetchKind::Foreground) => {
                tracing::error!(city = %self.city, error = %err, "forecast load failed");
                self.snapshot = Some(ForecastSnapshot::unavailable(&self.city, now));
                self.phase = Phase::Error;
                Completion::Failed
            }
            (Err(err), FetchKind::Background) => {
                tracing::warn!(city = %self.city, error = %err, "background refresh failed, keeping last forecast");
                self.phase = Phase::Ready;
                Completion::Suppressed
            }
        }
    }

    pub fn refresh_state(&self, now: DateTime<Utc>) -> RefreshState {
        self.countdown.state(now)
    }

    pub fn view(&self, now: DateTime<Utc>) -> DashboardView {
        DashboardView {
            city: self.city.clone(),
            phase: self.phase,
            snapshot: self.snapshot.clone(),
            refresh: self.refresh_state(now),
            is_loading: self.phase == Phase::Loading,
            is_error: self.phase == Phase::Error,
        }
    }

    fn begin(&mut self, kind: FetchKind) -> FetchTicket {
        self.generation += 1;
        self.phase = match kind {
            FetchKind::Foreground => Phase::Loading,
            FetchKind::Background => Phase::BackgroundRefreshing,
        };

        FetchTicket {
            generation: self.generation,
            city: self.city.clone(),
            kind,
        }
    }
}
