mod basic;
mod client;

pub use basic::BasicClient;
pub use client::{HttpClient, HttpReply};

use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::Request;
use tracing::{debug, error};

use crate::error::{NextBusError, Result};

/// GETs `url` and returns the body of a 2xx reply.
///
/// # Errors
///
/// Transport failures pass through; any other status becomes
/// [`NextBusError::Http`] carrying the reply body.
#[tracing::instrument(skip_all, fields(url = %url))]
pub fn fetch_text<C: HttpClient + ?Sized>(client: &C, url: Url) -> Result<String> {
    let req = Request::new(Method::GET, url);

    let reply = client.execute(req).inspect_err(|e| {
        error!(error = %e, "NextBus request failed");
    })?;

    if !reply.is_success() {
        error!(status = reply.status, "NextBus returned an error status");
        return Err(NextBusError::Http {
            status: reply.status,
            body: reply.body,
        });
    }

    debug!(status = reply.status, bytes = reply.body.len(), "NextBus reply received");
    Ok(reply.body)
}
