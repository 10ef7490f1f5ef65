//! CLI entry point for querying the NextBus feed.
//!
//! Every feed command is a subcommand. JSON responses are pretty-printed to
//! stdout, XML responses are printed as received.

use std::ffi::OsStr;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use nextbus::{ClientConfig, FeedResponse, NextBusClient, OutputFormat, RouteStop};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nextbus")]
#[command(about = "Query the NextBus public transit feed", long_about = None)]
struct Cli {
    /// Output format: json or xml (overrides NEXTBUS_FORMAT)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Agency tag (overrides NEXTBUS_AGENCY)
    #[arg(short, long, global = true)]
    agency: Option<String>,

    /// Disable gzip/deflate negotiation
    #[arg(long, global = true, default_value_t = false)]
    no_compression: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all agencies
    Agencies,
    /// List the routes of an agency
    Routes,
    /// Show stops and directions for one route, or all routes
    RouteConfig {
        #[arg(short, long)]
        route: Option<String>,
    },
    /// Predictions for a stop id, or for a route and stop tag
    Predictions {
        /// Stop id, or stop tag when --route is given with --by-tag
        #[arg(short, long)]
        stop: String,

        #[arg(short, long)]
        route: Option<String>,

        /// Treat --stop as a stop tag on --route instead of a stop id
        #[arg(long, default_value_t = false, requires = "route")]
        by_tag: bool,
    },
    /// Predictions for several ROUTE|STOP pairs
    MultiStops {
        #[arg(value_name = "ROUTE|STOP", required = true)]
        stops: Vec<RouteStop>,
    },
    /// Timetable for a route
    Schedule {
        #[arg(short, long)]
        route: String,
    },
    /// Service messages, optionally for specific routes
    Messages {
        #[arg(short, long)]
        route: Vec<String>,
    },
    /// Vehicle positions
    Vehicles {
        #[arg(short, long)]
        route: Option<String>,

        /// Only vehicles reported after this epoch time in milliseconds
        #[arg(long)]
        since_ms: Option<i64>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let _log_guard = init_logging();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(format) = cli.format {
        config.output_format = format;
    }
    if let Some(agency) = cli.agency {
        config.agency = Some(agency);
    }
    if cli.no_compression {
        config.use_compression = false;
    }
    debug!(format = %config.output_format, agency = ?config.agency, "Client configured");

    let client = NextBusClient::new(config)?;

    let response = match cli.command {
        Commands::Agencies => client.agency_list()?,
        Commands::Routes => client.route_list(None)?,
        Commands::RouteConfig { route } => client.route_config(route.as_deref(), None)?,
        Commands::Predictions {
            stop,
            route,
            by_tag,
        } => match route {
            Some(route) if by_tag => client.predictions_for_route_stop(&route, &stop, None)?,
            route => client.predictions(&stop, route.as_deref(), None)?,
        },
        Commands::MultiStops { stops } => client.predictions_for_multi_stops(&stops, None)?,
        Commands::Schedule { route } => client.schedule(&route, None)?,
        Commands::Messages { route } => client.messages(route.as_slice(), None)?,
        Commands::Vehicles { route, since_ms } => {
            let since = since_ms
                .map(|ms| {
                    DateTime::from_timestamp_millis(ms)
                        .with_context(|| format!("--since-ms {ms} is out of range"))
                })
                .transpose()?;
            client.vehicle_locations(route.as_deref(), since, None)?
        }
    };

    print_response(&response)?;
    Ok(())
}

fn print_response(response: &FeedResponse) -> Result<()> {
    match response {
        FeedResponse::Json(value) => {
            if let Some(copyright) = response.copyright() {
                info!(copyright, "NextBus data");
            }
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        FeedResponse::Xml(body) => println!("{body}"),
    }
    Ok(())
}

/// Colored stderr logging, plus a JSON rolling log file when `LOG_FILE_PATH`
/// is set. The returned guard must live until exit to flush the file.
fn init_logging() -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        );

    let Some(log_file_path) = std::env::var("LOG_FILE_PATH").ok() else {
        tracing_subscriber::registry().with(stderr_layer).init();
        return None;
    };

    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("nextbus.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG_JSON").unwrap_or_else(|_| EnvFilter::new("debug")),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Some(guard)
}
