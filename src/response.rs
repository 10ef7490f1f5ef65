//! Response normalization.
//!
//! JSON bodies are decoded and checked for the feed's `Error` marker, which
//! is raised as [`NextBusError::Feed`]. XML bodies are returned as received;
//! XML callers inspect `<Error>` elements themselves.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, warn};

use crate::config::OutputFormat;
use crate::error::{NextBusError, Result};

const ERROR_MARKER: &str = "Error";

/// A decoded feed response, owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedResponse {
    Json(Value),
    Xml(String),
}

impl FeedResponse {
    pub fn format(&self) -> OutputFormat {
        match self {
            FeedResponse::Json(_) => OutputFormat::Json,
            FeedResponse::Xml(_) => OutputFormat::Xml,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FeedResponse::Json(value) => Some(value),
            FeedResponse::Xml(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            FeedResponse::Json(value) => Some(value),
            FeedResponse::Xml(_) => None,
        }
    }

    pub fn as_xml(&self) -> Option<&str> {
        match self {
            FeedResponse::Xml(body) => Some(body),
            FeedResponse::Json(_) => None,
        }
    }

    /// The feed's copyright notice, present on every JSON response.
    pub fn copyright(&self) -> Option<&str> {
        self.as_json()?.get("copyright")?.as_str()
    }

    /// Decodes the entries under `key` into `T`.
    ///
    /// A missing key yields an empty list and a lone object a list of one,
    /// matching how the JSON feed renders repeated elements.
    ///
    /// # Errors
    ///
    /// [`NextBusError::Format`] in XML mode or when an entry does not fit `T`.
    pub fn records<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let value = self.as_json().ok_or_else(|| {
            NextBusError::Format("typed records are only available in JSON mode".to_string())
        })?;

        let decode = |item: &Value| {
            T::deserialize(item).map_err(|e| NextBusError::Format(format!("{key}: {e}")))
        };

        match value.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items.iter().map(decode).collect(),
            Some(item) => Ok(vec![decode(item)?]),
        }
    }
}

/// Decodes `body` according to `format`.
///
/// # Errors
///
/// In JSON mode: [`NextBusError::Format`] for a body that is not JSON and
/// [`NextBusError::Feed`] when the feed reports an error.
pub fn normalize(format: OutputFormat, body: String) -> Result<FeedResponse> {
    match format {
        OutputFormat::Xml => Ok(FeedResponse::Xml(body)),
        OutputFormat::Json => {
            let value: Value = serde_json::from_str(&body).map_err(|e| {
                error!(error = %e, "Failed to parse JSON from NextBus");
                NextBusError::Format(format!("invalid JSON: {e}"))
            })?;

            if let Some(err) = feed_error(&value) {
                warn!(error = %err, "NextBus reported an error");
                return Err(err);
            }
            Ok(FeedResponse::Json(value))
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedErrorPayload {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    should_retry: Option<Value>,
}

/// Maps the `Error` marker to a domain error. The feed sometimes sends a
/// list of errors; the first one wins and an empty list is no error.
fn feed_error(value: &Value) -> Option<NextBusError> {
    let marker = value.get(ERROR_MARKER)?;
    let marker = match marker {
        Value::Array(items) => items.first()?,
        other => other,
    };

    let (message, should_retry) = match marker {
        Value::String(text) => (text.clone(), false),
        other => match FeedErrorPayload::deserialize(other) {
            Ok(payload) => (
                payload.content.unwrap_or_default(),
                retry_flag(payload.should_retry.as_ref()),
            ),
            Err(_) => (other.to_string(), false),
        },
    };

    Some(NextBusError::Feed {
        message: message.trim().to_string(),
        should_retry,
    })
}

fn retry_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}
