use reqwest::Client;
use tokio::task::JoinHandle;

/// Best-effort liveness ping sent after each successful fetch.
#[derive(Debug, Clone)]
pub struct KeepAlive {
    http: Client,
    url: String,
}

impl KeepAlive {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    /// Fire the ping on the current runtime and return immediately.
    ///
    /// The outcome is only logged. The returned task is dropped by long-running
    /// callers; a caller about to shut the runtime down can await it briefly.
    pub fn ping(&self) -> Option<JoinHandle<()>> {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime available, keep-alive ping skipped");
            return None;
        };

        let request = self.http.get(&self.url);
        let url = self.url.clone();
        Some(handle.spawn(async move {
            match request.send().await {
                Ok(res) => tracing::debug!(%url, status = %res.status(), "keep-alive ping sent"),
                Err(e) => tracing::debug!(%url, error = %e, "keep-alive ping failed"),
            }
        }))
    }
}
