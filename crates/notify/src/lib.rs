//! Telling search engines that a sitemap index has been updated.
//!
//! A ping is a plain `GET {endpoint}?sitemap={index location}`. Every
//! endpoint is pinged concurrently and independently: one failing never
//! affects the others, nothing is retried, and failures are reported rather
//! than returned as errors.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// Endpoints pinged by [`Notifier::default`].
pub const DEFAULT_ENDPOINTS: [&str; 2] = ["http://www.google.com/webmasters/tools/ping", "http://www.bing.com/ping"];

/// The result of pinging one endpoint.
#[derive(Debug)]
pub struct PingOutcome {
    pub endpoint: String,
    /// HTTP status of the response, whatever it was.
    pub result: Result<u16>,
}
impl PingOutcome {
    /// A response arrived with a 2xx status.
    pub fn is_success(&self) -> bool {
        matches!(self.result, Ok(status) if (200..300).contains(&status))
    }
}

/// Pings a fixed set of search engine endpoints.
#[derive(Clone, Debug)]
pub struct Notifier {
    client: Client,
    endpoints: Vec<String>,
}
impl Default for Notifier {
    fn default() -> Self {
        Self::with_client(Client::default(), DEFAULT_ENDPOINTS)
    }
}
impl Notifier {
    /// Notifier for `endpoints`, with an optional per-request timeout (no
    /// timeout when `None`).
    ///
    /// # Errors
    ///
    /// [`Client`](ErrorKind::Client) if the HTTP client cannot be initialized.
    pub fn new<I, S>(endpoints: I, timeout: Option<Duration>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().or_raise(|| ErrorKind::Client)?;
        Ok(Self::with_client(client, endpoints))
    }

    pub fn with_client<I, S>(client: Client, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            endpoints: endpoints.into_iter().map(Into::into).collect(),
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Ping every endpoint concurrently, yielding outcomes as they complete.
    ///
    /// The channel closes once every ping has finished.
    ///
    /// # Panics
    ///
    /// If called outside of a Tokio runtime.
    pub fn ping_stream(&self, index_location: &str) -> mpsc::Receiver<PingOutcome> {
        let (sender, receiver) = mpsc::channel(self.endpoints.len().max(1));
        let mut pings = JoinSet::new();
        let mut endpoints = HashMap::new();
        for endpoint in &self.endpoints {
            let client = self.client.clone();
            let url = endpoint.clone();
            let location = index_location.to_string();
            let handle = pings.spawn(async move { ping_one(&client, &url, &location).await });
            endpoints.insert(handle.id(), endpoint.clone());
        }

        tokio::spawn(async move {
            while let Some(joined) = pings.join_next_with_id().await {
                let (id, result) = match joined {
                    Ok((id, result)) => (id, result),
                    Err(err) => (err.id(), Err(err).or_raise(|| ErrorKind::Task)),
                };
                let endpoint = endpoints.remove(&id).unwrap_or_default();
                if sender.send(PingOutcome { endpoint, result }).await.is_err() {
                    // Receiver dropped; the remaining pings still run to completion.
                    tracing::debug!("Ping outcome receiver dropped");
                }
            }
        });
        receiver
    }

    /// Ping every endpoint and wait for all of them, logging each outcome as
    /// it arrives.
    pub async fn ping(&self, index_location: &str) -> Vec<PingOutcome> {
        let mut receiver = self.ping_stream(index_location);
        let mut outcomes = Vec::with_capacity(self.endpoints.len());
        while let Some(outcome) = receiver.recv().await {
            match &outcome.result {
                Ok(status) => tracing::info!(endpoint = %outcome.endpoint, status, "Pinged search engine"),
                Err(err) => tracing::warn!(endpoint = %outcome.endpoint, error = %err, "Search engine ping failed"),
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// The endpoint with `sitemap=<index_location>` appended to its query.
fn ping_url(endpoint: &str, index_location: &str) -> Result<Url> {
    let url = Url::parse_with_params(endpoint, [("sitemap", index_location)])
        .or_raise(|| ErrorKind::InvalidEndpoint(endpoint.to_string()))?;
    if url.cannot_be_a_base() {
        exn::bail!(ErrorKind::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(url)
}

async fn ping_one(client: &Client, endpoint: &str, index_location: &str) -> Result<u16> {
    let url = ping_url(endpoint, index_location)?;
    let response = client.get(url).send().await.or_raise(|| ErrorKind::Network)?;
    Ok(response.status().as_u16())
}
