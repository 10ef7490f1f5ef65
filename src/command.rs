//! Request builder for feed commands.
//!
//! A [`FeedRequest`] pairs a [`Command`] with its query parameters and turns
//! them into a URL against a feed endpoint. The only validation performed is
//! that the command's required parameters are present; anything else is
//! passed through for the feed to interpret.

use std::fmt;

use reqwest::Url;

use crate::error::{NextBusError, Result};

/// A NextBus feed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    AgencyList,
    RouteList,
    RouteConfig,
    Predictions,
    PredictionsForMultiStops,
    Schedule,
    Messages,
    VehicleLocations,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::AgencyList,
        Command::RouteList,
        Command::RouteConfig,
        Command::Predictions,
        Command::PredictionsForMultiStops,
        Command::Schedule,
        Command::Messages,
        Command::VehicleLocations,
    ];

    /// Value of the `command` query parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Command::AgencyList => "agencyList",
            Command::RouteList => "routeList",
            Command::RouteConfig => "routeConfig",
            Command::Predictions => "predictions",
            Command::PredictionsForMultiStops => "predictionsForMultiStops",
            Command::Schedule => "schedule",
            Command::Messages => "messages",
            Command::VehicleLocations => "vehicleLocations",
        }
    }

    /// Alternative sets of required keys. A request is valid when every key
    /// of at least one set is present.
    pub fn required(&self) -> &'static [&'static [&'static str]] {
        match self {
            Command::AgencyList => &[&[]],
            Command::RouteList | Command::RouteConfig | Command::Messages => &[&["a"]],
            Command::Predictions => &[&["a", "stopId"], &["a", "r", "s"]],
            Command::PredictionsForMultiStops => &[&["a", "stops"]],
            Command::Schedule => &[&["a", "r"]],
            Command::VehicleLocations => &[&["a", "t"]],
        }
    }

    /// Values sent for parameters the caller left out.
    pub fn defaults(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            // t=0 asks for the last 15 minutes of reports
            Command::VehicleLocations => &[("t", "0")],
            _ => &[],
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A command plus its parameters, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    command: Command,
    params: Vec<(String, String)>,
}

impl FeedRequest {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            params: Vec::new(),
        }
    }

    /// Appends a parameter. Repeating a key emits it twice on the wire.
    pub fn param(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends a parameter only when `value` is `Some`.
    pub fn param_opt<V: fmt::Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Appends one pair per value under the same key.
    pub fn param_each<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        for value in values {
            self = self.param(key, value);
        }
        self
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn has(&self, key: &str) -> bool {
        self.params.iter().any(|(k, v)| k == key && !v.is_empty())
    }

    /// Command defaults not overridden by the caller.
    fn pending_defaults(&self) -> impl Iterator<Item = &'static (&'static str, &'static str)> + '_ {
        self.command
            .defaults()
            .iter()
            .filter(|(key, _)| !self.params.iter().any(|(k, _)| k == key))
    }

    /// Checks the command's required keys, counting defaults as supplied.
    /// Empty values count as missing. `command` is reserved.
    pub fn validate(&self) -> Result<()> {
        if self.params.iter().any(|(k, _)| k == "command") {
            return Err(NextBusError::Validation(
                "\"command\" is set by the request and cannot be passed as a parameter"
                    .to_string(),
            ));
        }

        let alternatives = self.command.required();
        let supplied = |key: &str| {
            self.has(key) || self.pending_defaults().any(|(default, _)| *default == key)
        };
        if alternatives
            .iter()
            .any(|keys| keys.iter().all(|key| supplied(key)))
        {
            return Ok(());
        }

        let expected = alternatives
            .iter()
            .map(|keys| keys.join(", "))
            .collect::<Vec<_>>()
            .join("] or [");
        Err(NextBusError::Validation(format!(
            "{} requires parameters [{}]",
            self.command, expected
        )))
    }

    /// Validates and renders the request against `base`.
    pub fn to_url(&self, base: &Url) -> Result<Url> {
        self.validate()?;

        let mut url = base.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("command", self.command.name());
            for (key, value) in &self.params {
                query.append_pair(key, value);
            }
            for (key, value) in self.pending_defaults() {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }
}
