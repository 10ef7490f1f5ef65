//! Client for the NextBus public transit feed.
//!
//! ```no_run
//! use nextbus::{ClientConfig, NextBusClient, OutputFormat, models::Agency};
//!
//! let client = NextBusClient::new(ClientConfig::new(OutputFormat::Json).with_agency("sf-muni"))?;
//! let agencies: Vec<Agency> = client.agency_list()?.records("agency")?;
//! let predictions = client.predictions(15184, Some("N"), None)?;
//! # Ok::<(), nextbus::NextBusError>(())
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod response;

pub use client::NextBusClient;
pub use command::{Command, FeedRequest};
pub use config::{ClientConfig, OutputFormat};
pub use error::{NextBusError, Result};
pub use models::RouteStop;
pub use response::FeedResponse;
