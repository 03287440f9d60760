use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::FetchError, model::ForecastSnapshot};

pub mod openweather;

/// Anything that can produce a forecast snapshot for a city.
///
/// The refresh scheduler only talks to this trait, so it can be driven by the
/// real fetcher or by a scripted source in tests.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    /// Fetch a fresh snapshot for `city` (display name, e.g. "Волгоград").
    async fn fetch(&self, city: &str) -> Result<ForecastSnapshot, FetchError>;
}
