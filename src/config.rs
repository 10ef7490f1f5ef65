//! Client configuration.
//!
//! [`ClientConfig`] is fixed for the lifetime of a [`crate::NextBusClient`].
//! It can be assembled in code or read from the environment:
//!
//! | variable                 | meaning                                  |
//! |--------------------------|------------------------------------------|
//! | `NEXTBUS_FORMAT`         | `json` (default) or `xml`                |
//! | `NEXTBUS_AGENCY`         | default agency tag                       |
//! | `NEXTBUS_COMPRESSION`    | `true`/`false`, request gzip/deflate     |
//! | `NEXTBUS_TIMEOUT_SECS`   | request timeout in seconds               |
//! | `NEXTBUS_JSON_FEED_URL`  | override for the JSON feed endpoint      |
//! | `NEXTBUS_XML_FEED_URL`   | override for the XML feed endpoint       |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{NextBusError, Result};

pub const JSON_FEED_URL: &str = "https://retro.umoiq.com/service/publicJSONFeed";
pub const XML_FEED_URL: &str = "https://retro.umoiq.com/service/publicXMLFeed";

/// Output format negotiated with the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Xml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = NextBusError;

    /// Case-insensitive: `"JSON"`, `"Json"` and `"json"` are all accepted.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            _ => Err(NextBusError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub output_format: OutputFormat,
    /// Agency tag used when a call does not name one.
    pub agency: Option<String>,
    pub use_compression: bool,
    pub timeout: Option<Duration>,
    pub json_feed_url: String,
    pub xml_feed_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Json,
            agency: None,
            use_compression: true,
            timeout: None,
            json_feed_url: JSON_FEED_URL.to_string(),
            xml_feed_url: XML_FEED_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(output_format: OutputFormat) -> Self {
        Self {
            output_format,
            ..Self::default()
        }
    }

    pub fn with_agency(mut self, agency: impl Into<String>) -> Self {
        self.agency = Some(agency.into());
        self
    }

    pub fn with_compression(mut self, use_compression: bool) -> Self {
        self.use_compression = use_compression;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Points both feed endpoints somewhere else (a proxy or a test server).
    pub fn with_feed_urls(mut self, json: impl Into<String>, xml: impl Into<String>) -> Self {
        self.json_feed_url = json.into();
        self.xml_feed_url = xml.into();
        self
    }

    /// Endpoint for the configured output format.
    pub fn feed_url(&self) -> &str {
        match self.output_format {
            OutputFormat::Json => &self.json_feed_url,
            OutputFormat::Xml => &self.xml_feed_url,
        }
    }

    /// Reads the `NEXTBUS_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(format) = lookup("NEXTBUS_FORMAT") {
            config.output_format = format.parse()?;
        }
        if let Some(agency) = lookup("NEXTBUS_AGENCY").filter(|a| !a.is_empty()) {
            config.agency = Some(agency);
        }
        if let Some(flag) = lookup("NEXTBUS_COMPRESSION") {
            config.use_compression = parse_bool(&flag).ok_or_else(|| {
                NextBusError::Config(format!("NEXTBUS_COMPRESSION must be true or false, got {flag:?}"))
            })?;
        }
        if let Some(secs) = lookup("NEXTBUS_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                NextBusError::Config(format!("NEXTBUS_TIMEOUT_SECS must be whole seconds, got {secs:?}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(url) = lookup("NEXTBUS_JSON_FEED_URL") {
            config.json_feed_url = url;
        }
        if let Some(url) = lookup("NEXTBUS_XML_FEED_URL") {
            config.xml_feed_url = url;
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
