//! The NextBus client: one method per feed command.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use reqwest::Url;
use tracing::debug;

use crate::command::{Command, FeedRequest};
use crate::config::{ClientConfig, OutputFormat};
use crate::error::{NextBusError, Result};
use crate::fetch::{BasicClient, HttpClient, fetch_text};
use crate::models::RouteStop;
use crate::response::{FeedResponse, normalize};

/// Synchronous client for the NextBus public feed.
///
/// Each call validates its parameters, performs a single blocking GET and
/// decodes the body per the configured [`OutputFormat`]. Nothing is cached
/// or retried, and the client holds no state beyond its configuration.
pub struct NextBusClient<C = BasicClient> {
    config: ClientConfig,
    base_url: Url,
    http: C,
}

impl NextBusClient<BasicClient> {
    /// Creates a client backed by a blocking reqwest client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = BasicClient::new(config.use_compression, config.timeout)?;
        Self::with_http_client(config, http)
    }
}

impl<C: HttpClient> NextBusClient<C> {
    /// Creates a client that sends requests through `http`.
    pub fn with_http_client(config: ClientConfig, http: C) -> Result<Self> {
        let base_url = Url::parse(config.feed_url()).map_err(|e| {
            NextBusError::Config(format!("invalid feed URL {:?}: {e}", config.feed_url()))
        })?;
        Ok(Self {
            config,
            base_url,
            http,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn output_format(&self) -> OutputFormat {
        self.config.output_format
    }

    /// The explicit agency if given, otherwise the configured default. An
    /// explicit empty tag is kept so request validation reports it.
    fn agency<'a>(&'a self, agency: Option<&'a str>) -> Result<&'a str> {
        agency
            .or(self.config.agency.as_deref())
            .ok_or_else(|| {
                NextBusError::Validation(
                    "an agency tag is required when the client has no default agency".to_string(),
                )
            })
    }

    /// Renders `request` against the configured endpoint without sending it.
    pub fn build_url(&self, request: &FeedRequest) -> Result<Url> {
        request.to_url(&self.base_url)
    }

    /// Sends an arbitrary command. Validation runs before any network I/O.
    #[tracing::instrument(skip_all, fields(command = %request.command(), format = %self.config.output_format))]
    pub fn request(&self, request: FeedRequest) -> Result<FeedResponse> {
        let url = self.build_url(&request)?;
        debug!(url = %url, "GET");

        let body = fetch_text(&self.http, url)?;
        normalize(self.config.output_format, body)
    }

    /// `agencyList`: every agency served by the feed.
    pub fn agency_list(&self) -> Result<FeedResponse> {
        self.request(FeedRequest::new(Command::AgencyList))
    }

    /// `routeList`: the routes of an agency.
    pub fn route_list(&self, agency: Option<&str>) -> Result<FeedResponse> {
        let agency = self.agency(agency)?;
        self.request(FeedRequest::new(Command::RouteList).param("a", agency))
    }

    /// `routeConfig`: stops, directions and paths. Without `route_tag` the
    /// feed returns every route of the agency.
    pub fn route_config(
        &self,
        route_tag: Option<&str>,
        agency: Option<&str>,
    ) -> Result<FeedResponse> {
        let agency = self.agency(agency)?;
        self.request(
            FeedRequest::new(Command::RouteConfig)
                .param("a", agency)
                .param_opt("r", route_tag),
        )
    }

    /// `predictions` by stop id, optionally narrowed to one route.
    pub fn predictions(
        &self,
        stop_id: impl Display,
        route_tag: Option<&str>,
        agency: Option<&str>,
    ) -> Result<FeedResponse> {
        let agency = self.agency(agency)?;
        self.request(
            FeedRequest::new(Command::Predictions)
                .param("a", agency)
                .param("stopId", stop_id)
                .param_opt("routeTag", route_tag),
        )
    }

    /// `predictions` by route tag and stop tag.
    pub fn predictions_for_route_stop(
        &self,
        route_tag: &str,
        stop_tag: impl Display,
        agency: Option<&str>,
    ) -> Result<FeedResponse> {
        let agency = self.agency(agency)?;
        self.request(
            FeedRequest::new(Command::Predictions)
                .param("a", agency)
                .param("r", route_tag)
                .param("s", stop_tag),
        )
    }

    /// `predictionsForMultiStops`: one `stops=route|stop` pair per entry.
    pub fn predictions_for_multi_stops(
        &self,
        stops: &[RouteStop],
        agency: Option<&str>,
    ) -> Result<FeedResponse> {
        let agency = self.agency(agency)?;
        self.request(
            FeedRequest::new(Command::PredictionsForMultiStops)
                .param("a", agency)
                .param_each("stops", stops),
        )
    }

    /// `schedule`: the timetable of a route.
    pub fn schedule(&self, route_tag: &str, agency: Option<&str>) -> Result<FeedResponse> {
        let agency = self.agency(agency)?;
        self.request(
            FeedRequest::new(Command::Schedule)
                .param("a", agency)
                .param("r", route_tag),
        )
    }

    /// `messages` for the given routes, or agency-wide when empty.
    pub fn messages<S: AsRef<str>>(
        &self,
        route_tags: &[S],
        agency: Option<&str>,
    ) -> Result<FeedResponse> {
        let agency = self.agency(agency)?;
        self.request(
            FeedRequest::new(Command::Messages)
                .param("a", agency)
                .param_each("r", route_tags.iter().map(AsRef::<str>::as_ref)),
        )
    }

    /// `vehicleLocations` reported after `since`. Without `since` the feed
    /// returns the last 15 minutes (`t=0`).
    pub fn vehicle_locations(
        &self,
        route_tag: Option<&str>,
        since: Option<DateTime<Utc>>,
        agency: Option<&str>,
    ) -> Result<FeedResponse> {
        let agency = self.agency(agency)?;
        self.request(
            FeedRequest::new(Command::VehicleLocations)
                .param("a", agency)
                .param_opt("r", route_tag)
                .param_opt("t", since.map(|ts| ts.timestamp_millis())),
        )
    }
}
