use std::time::Duration;

/// Why a forecast could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error while calling {endpoint}: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Malformed {endpoint} response: {reason}")]
    MalformedResponse { endpoint: &'static str, reason: String },
    #[error("No forecast for {city}: extended tier failed ({rich}); current tier failed ({degraded})")]
    AllTiersExhausted {
        city: String,
        rich: Box<FetchError>,
        degraded: Box<FetchError>,
    },
}

impl FetchError {
    /// Classify a reqwest failure; `timeout` is the limit the client was built with.
    pub(crate) fn transport(endpoint: &'static str, source: reqwest::Error, timeout: Duration) -> Self {
        if source.is_timeout() {
            return FetchError::Timeout(timeout);
        }
        FetchError::Transport { endpoint, source }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}
