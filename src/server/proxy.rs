use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;

/// A relayed upstream response: status, headers and body exactly as the
/// gateway returned them.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("request to gateway failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Seam between the request handlers and the outbound HTTP client, so tests
/// can substitute a counting mock for the real gateway.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Issues a single GET to `url` with the given headers. At-most-once:
    /// errors are returned, never retried.
    async fn forward(&self, url: &str, headers: &[(String, String)])
        -> Result<UpstreamResponse, RelayError>;
}

/// Production [`Upstream`] backed by a pooled reqwest client with a bounded
/// per-request timeout. A timeout surfaces as a transport error.
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build gateway client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<UpstreamResponse, RelayError> {
        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(name, value);
        }

        let resp = req.send().await?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = resp.bytes().await?.to_vec();

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
