use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;

use crate::{
    city::provider_query,
    config::Config,
    error::FetchError,
    keepalive::KeepAlive,
    model::ForecastSnapshot,
    provider::{
        ForecastSource,
        openweather::{OpenWeatherClient, extended_snapshot},
    },
};

/// Two-tier forecast fetcher.
///
/// Tries the extended forecast first and falls back to current conditions
/// only. Fails with [`FetchError::AllTiersExhausted`] when neither tier
/// produces data.
#[derive(Debug, Clone)]
pub struct ForecastFetcher {
    client: OpenWeatherClient,
    keepalive: Option<KeepAlive>,
    pending_pings: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ForecastFetcher {
    pub fn new(client: OpenWeatherClient, keepalive: Option<KeepAlive>) -> Self {
        Self {
            client,
            keepalive,
            pending_pings: Arc::default(),
        }
    }

    /// Construct a fetcher from config: provider settings, API key and keep-alive URL.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = OpenWeatherClient::new(&config.provider, config.api_key())?;
        let keepalive = config
            .keepalive_url()
            .map(|url| KeepAlive::new(client.http().clone(), url));

        Ok(Self::new(client, keepalive))
    }

    /// Give in-flight keep-alive pings up to `within` to go out.
    ///
    /// One-shot callers call this before their runtime shuts down, which would
    /// otherwise cancel the pings. Ping outcomes are still ignored.
    pub async fn settle(&self, within: Duration) {
        let pending = std::mem::take(
            &mut *self
                .pending_pings
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if pending.is_empty() {
            return;
        }

        let wait_all = async {
            for ping in pending {
                let _ = ping.await;
            }
        };
        if tokio::time::timeout(within, wait_all).await.is_err() {
            tracing::debug!(?within, "keep-alive ping still pending, giving up");
        }
    }

    fn track_ping(&self, ping: JoinHandle<()>) {
        let mut pending = self
            .pending_pings
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pending.retain(|p| !p.is_finished());
        pending.push(ping);
    }

    async fn fetch_tiers(&self, city: &str) -> Result<ForecastSnapshot, FetchError> {
        let query = provider_query(city);
        let now = Utc::now();

        let (rich_err, lookup) = match self.client.current(query).await {
            Ok(lookup) => match self.client.one_call(&lookup.coord).await {
                Ok(extended) => match extended_snapshot(&lookup, extended, now) {
                    Ok(snapshot) => {
                        tracing::debug!(city, "extended forecast fetched");
                        return Ok(snapshot);
                    }
                    Err(err) => (err, Some(lookup)),
                },
                Err(err) => (err, Some(lookup)),
            },
            Err(err) => (err, None),
        };

        tracing::warn!(city, error = %rich_err, "extended forecast unavailable, falling back to current conditions");

        // The lookup already carries current conditions; only ask again if it failed.
        let degraded = match lookup {
            Some(lookup) => lookup.into_snapshot(now),
            None => self
                .client
                .current(query)
                .await
                .and_then(|lookup| lookup.into_snapshot(now)),
        };

        degraded.map_err(|degraded| FetchError::AllTiersExhausted {
            city: city.to_string(),
            rich: Box::new(rich_err),
            degraded: Box::new(degraded),
        })
    }
}

#[async_trait]
impl ForecastSource for ForecastFetcher {
    async fn fetch(&self, city: &str) -> Result<ForecastSnapshot, FetchError> {
        let snapshot = self.fetch_tiers(city).await?;

        if let Some(ping) = self.keepalive.as_ref().and_then(KeepAlive::ping) {
            self.track_ping(ping);
        }

        Ok(snapshot)
    }
}

/// Fetch `city`, substituting the error snapshot when every tier fails.
pub async fn forecast_or_unavailable(source: &dyn ForecastSource, city: &str) -> ForecastSnapshot {
    match source.fetch(city).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::error!(city, error = %err, "failed to fetch forecast");
            ForecastSnapshot::unavailable(city, Utc::now())
        }
    }
}
