use std::sync::{Arc, Mutex};

use chrono::DateTime;
use nextbus::config::{JSON_FEED_URL, XML_FEED_URL};
use nextbus::fetch::{HttpClient, HttpReply};
use nextbus::models::{Agency, Predictions, RouteConfig, Vehicle};
use nextbus::{
    ClientConfig, Command, FeedRequest, FeedResponse, NextBusClient, NextBusError, OutputFormat,
    RouteStop,
};
use reqwest::Url;
use reqwest::blocking::Request;

/// Answers every request with a canned reply and remembers the URLs.
struct RecordingClient {
    reply: HttpReply,
    urls: Mutex<Vec<Url>>,
}

impl RecordingClient {
    fn new(reply: HttpReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            urls: Mutex::new(Vec::new()),
        })
    }

    fn urls(&self) -> Vec<Url> {
        self.urls.lock().unwrap().clone()
    }

    fn last_pairs(&self) -> Vec<(String, String)> {
        let urls = self.urls();
        let url = urls.last().expect("no request was sent");
        url.query_pairs().into_owned().collect()
    }
}

impl HttpClient for RecordingClient {
    fn execute(&self, req: Request) -> nextbus::Result<HttpReply> {
        self.urls.lock().unwrap().push(req.url().clone());
        Ok(self.reply.clone())
    }
}

fn client_with(
    config: ClientConfig,
    body: &str,
) -> (NextBusClient<Arc<RecordingClient>>, Arc<RecordingClient>) {
    let http = RecordingClient::new(HttpReply::ok(body));
    let client = NextBusClient::with_http_client(config, Arc::clone(&http)).unwrap();
    (client, http)
}

fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_agency_list_returned_unaltered() {
    let body = include_str!("fixtures/agency_list.json");
    let (client, http) = client_with(ClientConfig::new(OutputFormat::Json), body);

    let response = client.agency_list().unwrap();

    let expected: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(response, FeedResponse::Json(expected));

    let agencies = response.as_json().unwrap()["agency"].as_array().unwrap();
    for agency in agencies {
        assert!(agency.get("tag").is_some());
        assert!(agency.get("title").is_some());
        assert!(agency.get("regionTitle").is_some());
    }

    let urls = http.urls();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].as_str().starts_with(JSON_FEED_URL));
    assert_eq!(urls[0].query(), Some("command=agencyList"));
}

#[test]
fn test_agency_list_typed() {
    let (client, _) = client_with(
        ClientConfig::default(),
        include_str!("fixtures/agency_list.json"),
    );

    let agencies: Vec<Agency> = client.agency_list().unwrap().records("agency").unwrap();

    assert_eq!(agencies.len(), 3);
    assert_eq!(agencies[1].tag, "sf-muni");
    assert_eq!(agencies[1].short_title.as_deref(), Some("SF Muni"));
    assert_eq!(agencies[2].region_title.as_deref(), Some("Ontario"));
}

#[test]
fn test_missing_agency_fails_before_any_request() {
    let (client, http) = client_with(ClientConfig::default(), "{}");

    let results = [
        client.route_list(None),
        client.route_config(Some("N"), None),
        client.predictions(15205, Some("N"), None),
        client.predictions_for_route_stop("N", 5205, None),
        client.predictions_for_multi_stops(&[RouteStop::new("N", 5205)], None),
        client.schedule("N", None),
        client.messages(&["N"], None),
        client.vehicle_locations(Some("N"), None, None),
    ];

    for result in results {
        assert!(matches!(result, Err(NextBusError::Validation(_))));
    }
    assert!(http.urls().is_empty());
}

#[test]
fn test_empty_multi_stop_list_fails_before_any_request() {
    let (client, http) = client_with(ClientConfig::default().with_agency("sf-muni"), "{}");

    let err = client.predictions_for_multi_stops(&[], None).unwrap_err();

    assert!(matches!(err, NextBusError::Validation(_)));
    assert!(http.urls().is_empty());
}

#[test]
fn test_default_agency_and_override() {
    let (client, http) = client_with(ClientConfig::default().with_agency("sf-muni"), "{}");

    client.route_list(None).unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "routeList"), ("a", "sf-muni")])
    );

    client.route_list(Some("ttc")).unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "routeList"), ("a", "ttc")])
    );
}

#[test]
fn test_route_config_route_is_optional() {
    let (client, http) = client_with(
        ClientConfig::default().with_agency("sf-muni"),
        include_str!("fixtures/route_config.json"),
    );

    client.route_config(None, None).unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "routeConfig"), ("a", "sf-muni")])
    );

    let routes: Vec<RouteConfig> = client
        .route_config(Some("N"), None)
        .unwrap()
        .records("route")
        .unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "routeConfig"), ("a", "sf-muni"), ("r", "N")])
    );

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].stop.len(), 2);
    assert_eq!(routes[0].direction.len(), 1);
    assert_eq!(routes[0].direction[0].stop.len(), 2);
}

#[test]
fn test_predictions_query_shapes() {
    let (client, http) = client_with(
        ClientConfig::default().with_agency("sf-muni"),
        include_str!("fixtures/predictions.json"),
    );

    client.predictions(15205, None, None).unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "predictions"), ("a", "sf-muni"), ("stopId", "15205")])
    );

    client.predictions(15205, Some("N"), None).unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[
            ("command", "predictions"),
            ("a", "sf-muni"),
            ("stopId", "15205"),
            ("routeTag", "N"),
        ])
    );

    client.predictions_for_route_stop("N", 5205, None).unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "predictions"), ("a", "sf-muni"), ("r", "N"), ("s", "5205")])
    );
}

#[test]
fn test_predictions_typed() {
    let (client, _) = client_with(
        ClientConfig::default().with_agency("sf-muni"),
        include_str!("fixtures/predictions.json"),
    );

    let predictions: Vec<Predictions> = client
        .predictions_for_route_stop("N", 5205, None)
        .unwrap()
        .records("predictions")
        .unwrap();

    assert_eq!(predictions.len(), 1);
    let minutes: Vec<Option<u32>> = predictions[0].all().map(|p| p.minutes()).collect();
    assert_eq!(minutes, vec![Some(4), Some(14)]);
    assert_eq!(predictions[0].message[0].text, "Elevator out of service at Church");
}

#[test]
fn test_multi_stops_are_repeated_and_encoded() {
    let (client, http) = client_with(ClientConfig::default().with_agency("sf-muni"), "{}");

    client
        .predictions_for_multi_stops(&[RouteStop::new("N", 5205), RouteStop::new("J", 4006)], None)
        .unwrap();

    let urls = http.urls();
    assert_eq!(
        urls[0].query(),
        Some("command=predictionsForMultiStops&a=sf-muni&stops=N%7C5205&stops=J%7C4006")
    );
}

#[test]
fn test_schedule_and_messages() {
    let (client, http) = client_with(ClientConfig::default().with_agency("sf-muni"), "{}");

    client.schedule("N OWL", None).unwrap();
    assert_eq!(
        http.urls()[0].query(),
        Some("command=schedule&a=sf-muni&r=N+OWL")
    );

    client.messages(&["N", "J"], None).unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "messages"), ("a", "sf-muni"), ("r", "N"), ("r", "J")])
    );

    client.messages::<&str>(&[], None).unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "messages"), ("a", "sf-muni")])
    );
}

#[test]
fn test_vehicle_locations_timestamp() {
    let (client, http) = client_with(
        ClientConfig::default().with_agency("sf-muni"),
        include_str!("fixtures/vehicle_locations.json"),
    );

    client.vehicle_locations(Some("N"), None, None).unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "vehicleLocations"), ("a", "sf-muni"), ("r", "N"), ("t", "0")])
    );

    let since = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
    let vehicles: Vec<Vehicle> = client
        .vehicle_locations(None, Some(since), None)
        .unwrap()
        .records("vehicle")
        .unwrap();
    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "vehicleLocations"), ("a", "sf-muni"), ("t", "1700000000123")])
    );

    assert_eq!(vehicles.len(), 2);
    assert!(vehicles[0].is_predictable());
    assert!(!vehicles[1].is_predictable());
}

#[test]
fn test_json_feed_error_is_raised() {
    let (client, _) = client_with(
        ClientConfig::default().with_agency("sf-muni"),
        include_str!("fixtures/error.json"),
    );

    let err = client.route_list(None).unwrap_err();

    assert!(matches!(err, NextBusError::Feed { .. }));
    assert_eq!(err.to_string(), "agency tag required");
}

#[test]
fn test_xml_mode_passes_error_documents_through() {
    let body = include_str!("fixtures/error.xml");
    let (client, http) = client_with(
        ClientConfig::new(OutputFormat::Xml).with_agency("nope"),
        body,
    );

    let response = client.route_list(None).unwrap();

    assert_eq!(response, FeedResponse::Xml(body.to_string()));
    assert!(http.urls()[0].as_str().starts_with(XML_FEED_URL));
}

#[test]
fn test_xml_mode_returns_body_unmodified() {
    let body = include_str!("fixtures/agency_list.xml");
    let (client, _) = client_with(ClientConfig::new(OutputFormat::Xml), body);

    let response = client.agency_list().unwrap();

    assert_eq!(response.as_xml(), Some(body));
    assert!(response.as_json().is_none());
}

#[test]
fn test_format_switch_changes_only_endpoint() {
    let (json_client, json_http) = client_with(ClientConfig::new(OutputFormat::Json), "{}");
    let (xml_client, xml_http) = client_with(ClientConfig::new(OutputFormat::Xml), "<body/>");

    json_client.schedule("N", Some("sf-muni")).unwrap();
    xml_client.schedule("N", Some("sf-muni")).unwrap();

    let json_url = &json_http.urls()[0];
    let xml_url = &xml_http.urls()[0];
    assert_eq!(json_url.query(), xml_url.query());
    assert_ne!(json_url.path(), xml_url.path());

    assert!(matches!(
        xml_client.schedule("N", None),
        Err(NextBusError::Validation(_))
    ));
    assert!(matches!(
        json_client.schedule("N", None),
        Err(NextBusError::Validation(_))
    ));
}

#[test]
fn test_http_error_status() {
    let http = RecordingClient::new(HttpReply {
        status: 503,
        body: "Service Unavailable".to_string(),
    });
    let client = NextBusClient::with_http_client(ClientConfig::default(), Arc::clone(&http)).unwrap();

    let err = client.agency_list().unwrap_err();

    match err {
        NextBusError::Http { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "Service Unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_invalid_json_body() {
    let (client, _) = client_with(ClientConfig::default(), "<html>maintenance</html>");

    let err = client.agency_list().unwrap_err();

    assert!(matches!(err, NextBusError::Format(_)));
}

#[test]
fn test_invalid_feed_url_is_config_error() {
    let config = ClientConfig::default().with_feed_urls("not a url", "also not");
    let result = NextBusClient::with_http_client(config, RecordingClient::new(HttpReply::ok("{}")));

    assert!(matches!(result, Err(NextBusError::Config(_))));
}

#[test]
fn test_custom_feed_url() {
    let config = ClientConfig::default().with_feed_urls(
        "http://localhost:8080/service/publicJSONFeed",
        "http://localhost:8080/service/publicXMLFeed",
    );
    let (client, http) = client_with(config, include_str!("fixtures/agency_list.json"));

    client.agency_list().unwrap();

    assert_eq!(
        http.urls()[0].as_str(),
        "http://localhost:8080/service/publicJSONFeed?command=agencyList"
    );
}

#[test]
fn test_vehicle_locations_default_through_request() {
    let (client, http) = client_with(ClientConfig::default(), "{}");

    client
        .request(FeedRequest::new(Command::VehicleLocations).param("a", "sf-muni"))
        .unwrap();

    assert_eq!(
        http.last_pairs(),
        pairs(&[("command", "vehicleLocations"), ("a", "sf-muni"), ("t", "0")])
    );
}

#[test]
fn test_explicit_empty_agency_is_not_replaced_by_default() {
    let (client, http) = client_with(ClientConfig::default().with_agency("sf-muni"), "{}");

    let err = client.route_list(Some("")).unwrap_err();

    assert!(matches!(err, NextBusError::Validation(_)));
    assert!(http.urls().is_empty());
}
