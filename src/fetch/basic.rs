use std::time::Duration;

use reqwest::blocking::{Client, Request};

use super::client::{HttpClient, HttpReply};
use crate::error::{NextBusError, Result};

const USER_AGENT: &str = concat!("nextbus-rs/", env!("CARGO_PKG_VERSION"));

/// [`HttpClient`] backed by a blocking reqwest client.
pub struct BasicClient(Client);

impl BasicClient {
    /// With `use_compression`, reqwest advertises `gzip, deflate` and
    /// decodes the body transparently.
    pub fn new(use_compression: bool, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .gzip(use_compression)
            .deflate(use_compression);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| NextBusError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self(client))
    }
}

impl HttpClient for BasicClient {
    fn execute(&self, req: Request) -> Result<HttpReply> {
        let resp = self.0.execute(req)?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(HttpReply { status, body })
    }
}
