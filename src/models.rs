//! Typed views of JSON feed records.
//!
//! The JSON feed mirrors the XML documents: attributes become string fields
//! and a child element that occurs once is emitted as an object rather than a
//! one-element list. Every list field here therefore goes through
//! [`one_or_many`]. Unknown fields are ignored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::NextBusError;

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Accepts either a list or a single object and always yields a list.
pub fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

fn parse_f64(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}

fn parse_bool(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agency {
    pub tag: String,
    pub title: String,
    #[serde(default)]
    pub region_title: Option<String>,
    #[serde(default)]
    pub short_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub tag: String,
    pub title: String,
    #[serde(default)]
    pub short_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub tag: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub short_title: Option<String>,
    #[serde(default)]
    pub stop_id: Option<String>,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lon: Option<String>,
}

impl Stop {
    /// `(lat, lon)` when both are present and numeric.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((
            parse_f64(self.lat.as_deref()?)?,
            parse_f64(self.lon.as_deref()?)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StopRef {
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Direction {
    pub tag: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub use_for_ui: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub stop: Vec<StopRef>,
}

impl Direction {
    pub fn is_for_ui(&self) -> bool {
        parse_bool(self.use_for_ui.as_deref())
    }
}

/// A `route` record from `routeConfig`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    pub tag: String,
    pub title: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub opposite_color: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub stop: Vec<Stop>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub direction: Vec<Direction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(default)]
    pub priority: Option<String>,
}

/// One arrival or departure estimate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub epoch_time: String,
    pub seconds: String,
    pub minutes: String,
    #[serde(default)]
    pub is_departure: Option<String>,
    #[serde(default)]
    pub dir_tag: Option<String>,
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub trip_tag: Option<String>,
    #[serde(default)]
    pub affected_by_layover: Option<String>,
}

impl Prediction {
    /// Predicted time, from the feed's epoch milliseconds.
    pub fn arrival(&self) -> Option<DateTime<Utc>> {
        let millis: i64 = self.epoch_time.trim().parse().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    pub fn minutes(&self) -> Option<u32> {
        self.minutes.trim().parse().ok()
    }

    pub fn is_departure(&self) -> bool {
        parse_bool(self.is_departure.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionDirection {
    pub title: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub prediction: Vec<Prediction>,
}

/// A `predictions` record: the estimates for one route at one stop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Predictions {
    #[serde(default)]
    pub agency_title: Option<String>,
    pub route_tag: String,
    #[serde(default)]
    pub route_title: Option<String>,
    pub stop_tag: String,
    #[serde(default)]
    pub stop_title: Option<String>,
    /// Set instead of `direction` when nothing is predicted.
    #[serde(default)]
    pub dir_title_because_no_predictions: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub direction: Vec<PredictionDirection>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub message: Vec<Message>,
}

impl Predictions {
    /// All estimates across directions, in feed order.
    pub fn all(&self) -> impl Iterator<Item = &Prediction> {
        self.direction.iter().flat_map(|d| d.prediction.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    #[serde(default)]
    pub route_tag: Option<String>,
    #[serde(default)]
    pub dir_tag: Option<String>,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub secs_since_report: Option<String>,
    #[serde(default)]
    pub predictable: Option<String>,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub speed_km_hr: Option<String>,
}

impl Vehicle {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((parse_f64(&self.lat)?, parse_f64(&self.lon)?))
    }

    pub fn is_predictable(&self) -> bool {
        parse_bool(self.predictable.as_deref())
    }
}

/// A route/stop pair as used by `predictionsForMultiStops`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteStop {
    pub route_tag: String,
    pub stop_tag: String,
}

impl RouteStop {
    pub fn new(route_tag: impl Into<String>, stop_tag: impl fmt::Display) -> Self {
        Self {
            route_tag: route_tag.into(),
            stop_tag: stop_tag.to_string(),
        }
    }
}

impl fmt::Display for RouteStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.route_tag, self.stop_tag)
    }
}

impl FromStr for RouteStop {
    type Err = NextBusError;

    /// Parses `route|stop`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('|') {
            Some((route, stop)) if !route.is_empty() && !stop.is_empty() => {
                Ok(RouteStop::new(route, stop))
            }
            _ => Err(NextBusError::Validation(format!(
                "expected ROUTE|STOP, got {s:?}"
            ))),
        }
    }
}
