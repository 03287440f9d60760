//! Core library for the regional forecast dashboard.
//!
//! This crate defines:
//! - The supported cities and their provider names
//! - The forecast snapshot model and its normalisation from OpenWeather
//! - A two-tier fetcher (extended forecast, then current conditions only)
//! - The refresh controller and the async scheduler that keeps a snapshot fresh
//! - Configuration & credentials handling
//!
//! It is used by `forecast-cli`, but can also be reused by other front ends.

pub mod city;
pub mod condition;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod fetcher;
pub mod keepalive;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod scheduler;

pub use city::City;
pub use condition::Icon;
pub use config::Config;
pub use controller::{Completion, DashboardView, FetchKind, FetchTicket, Phase, RefreshController};
pub use countdown::{Countdown, RefreshState};
pub use error::FetchError;
pub use fetcher::{ForecastFetcher, forecast_or_unavailable};
pub use model::{CurrentConditions, DayPoint, ForecastSnapshot, HourlyPoint, Location};
pub use provider::ForecastSource;
pub use scheduler::{RefreshScheduler, SchedulerHandle};
