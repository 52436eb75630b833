// acsgate-core: Device-model resolution and read-side aggregation over a
// TR-069 ACS, plus a controller facade for CLI consumers.

pub mod command;
pub mod config;
pub mod controller;
pub mod document;
pub mod enrich;
pub mod error;
pub mod metrics;
pub mod resolve;
pub mod schema;

#[cfg(test)]
mod fixtures;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::*;
pub use command::{Command, CommandResult, TaskOutcome};
pub use config::{BandDefaults, ControllerConfig, DEFAULT_NBI_URL, TlsVerification, WlanPolicy};
pub use controller::{Controller, DevicePage, MIN_STREAM_INTERVAL, ParameterReading};
pub use document::{DeviceIdentity, Document, Node, Scalar};
pub use enrich::{Cutoff, DeviceSummary, EnrichOptions, NetworkSummary, enrich};
pub use error::CoreError;
pub use metrics::{Distribution, Health, LastInform, MetricsWindows, OverviewSnapshot};
pub use resolve::{Identity, Management, PppoeParams, SsidPair, WifiParams};
pub use schema::{Band, BandBinding, Scheme};

// Wire types callers need alongside the facade.
pub use acsgate_api::{DeviceCount, SortOrder, TaskAck, TaskStatus};
