// ── Controller facade ──
//
// Composes the NBI client with the resolvers. Every operation is either a
// bounded read (fetch/query/count, then pure resolution) or a single task
// submission. Nothing is cached between calls and nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use acsgate_api::{
    DeviceQuery, Filter, NbiClient, ParameterValue, Sort, SortOrder, Task, TlsMode,
    TransportConfig,
};
use async_stream::stream;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use secrecy::ExposeSecret;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{
    Command, CommandResult, Delivery, DeviceListQuery, ListSort, PppoeChange, TaskOutcome,
    WifiChange,
};
use crate::config::{ControllerConfig, TlsVerification};
use crate::document::{Document, Scalar};
use crate::enrich::{Cutoff, DeviceSummary, EnrichOptions, enrich};
use crate::error::CoreError;
use crate::metrics::{Distribution, Health, LastInform, MetricsWindows, OverviewSnapshot};
use crate::resolve::identity::{FIRMWARE_PATHS, MODEL_PATHS};
use crate::resolve::{WifiParams, resolve_pppoe_params, resolve_wifi_params};
use crate::schema::{Band, Scheme};

/// Shortest accepted period for [`Controller::overview_stream`].
pub const MIN_STREAM_INTERVAL: Duration = Duration::from_secs(1);

/// Subtrees needed to build a [`DeviceSummary`].
const SUMMARY_PROJECTION: &[&str] = &[
    "_id",
    "_lastInform",
    "_lastBoot",
    "_registered",
    "_tags",
    "_deviceId",
    "Device.DeviceInfo",
    "Device.ManagementServer",
    "Device.IP.Interface",
    "Device.LAN",
    "Device.PPP",
    "Device.WiFi",
    "InternetGatewayDevice.DeviceInfo",
    "InternetGatewayDevice.ManagementServer",
    "InternetGatewayDevice.WANDevice",
    "InternetGatewayDevice.LANDevice",
];

/// Subtrees the band resolver looks at.
const WIFI_PROJECTION: &[&str] = &[
    "_deviceId",
    "Device.DeviceInfo.Manufacturer",
    "Device.WiFi",
    "InternetGatewayDevice.DeviceInfo.Manufacturer",
    "InternetGatewayDevice.LANDevice.1.WLANConfiguration",
];

const PPPOE_PROJECTION: &[&str] = &[
    "Device.PPP.Interface",
    "InternetGatewayDevice.WANDevice.1.WANConnectionDevice",
];

const SOFTWARE_VERSION_PROJECTION: &[&str] = &[
    "Device.DeviceInfo.SoftwareVersion",
    "InternetGatewayDevice.DeviceInfo.SoftwareVersion",
];

const LAST_INFORM_FIELD: &str = "_lastInform";
const PRODUCT_CLASS_FIELD: &str = "_deviceId._ProductClass";
const LEGACY_SOFTWARE_VERSION_FIELD: &str = "InternetGatewayDevice.DeviceInfo.SoftwareVersion._value";

/// Fields the free-text device search runs over.
const SEARCH_FIELDS: [&str; 5] = [
    "_id",
    "InternetGatewayDevice.DeviceInfo.ProductClass._value",
    "InternetGatewayDevice.DeviceInfo.SoftwareVersion._value",
    "Device.DeviceInfo.ProductClass._value",
    "Device.DeviceInfo.SoftwareVersion._value",
];

// ── Read models ──────────────────────────────────────────────────────

/// One page of enriched devices.
#[derive(Debug, Clone, Serialize)]
pub struct DevicePage {
    pub generated_at: DateTime<Utc>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    /// `false` when `total` came from a capped count.
    pub total_exact: bool,
    pub total_pages: u64,
    /// Liveness cutoff the `online` flags were computed against.
    pub online_cut: String,
    pub items: Vec<DeviceSummary>,
}

/// A single parameter read back from a device document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterReading {
    pub device: String,
    pub parameter: String,
    pub value: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

// ── Controller ───────────────────────────────────────────────────────

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Holds no per-device state.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    nbi: NbiClient,
}

impl Controller {
    /// Build a controller and its HTTP client from configuration.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let nbi = NbiClient::new(config.url.clone(), &transport)?;
        Ok(Self::with_client(config, nbi))
    }

    /// Use an existing NBI client (tests, shared connection pools).
    pub fn with_client(config: ControllerConfig, nbi: NbiClient) -> Self {
        Self {
            inner: Arc::new(ControllerInner { config, nbi }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn nbi(&self) -> &NbiClient {
        &self.inner.nbi
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a write command.
    pub async fn execute(&self, cmd: Command, delivery: Delivery) -> Result<CommandResult, CoreError> {
        debug!(device_id = cmd.device_id(), "executing command");
        match cmd {
            Command::ChangeWifi { device_id, change } => self
                .change_wifi(&device_id, &change, delivery)
                .await
                .map(CommandResult::Task),
            Command::ChangeWifiAndReboot { device_id, change } => {
                self.change_wifi_and_reboot(&device_id, &change, delivery).await
            }
            Command::ChangePppoe { device_id, change } => self
                .change_pppoe(&device_id, &change, delivery)
                .await
                .map(CommandResult::Task),
            Command::Reboot { device_id } => {
                self.reboot(&device_id, delivery).await.map(CommandResult::Task)
            }
            Command::FactoryReset { device_id } => self
                .factory_reset(&device_id, delivery)
                .await
                .map(CommandResult::Task),
            Command::GetParameterValues { device_id, names } => self
                .get_parameter_values(&device_id, names, delivery)
                .await
                .map(CommandResult::Task),
            Command::RefreshObject { device_id, object } => self
                .refresh_object(&device_id, &object, delivery)
                .await
                .map(CommandResult::Task),
            Command::ConnectionRequest { device_id } => self
                .connection_request(&device_id, delivery)
                .await
                .map(CommandResult::Task),
        }
    }

    /// Set the SSID and passphrase of one band.
    ///
    /// Explicit parameter paths are used only when both are given;
    /// otherwise the device document is fetched and the paths resolved.
    pub async fn change_wifi(
        &self,
        device_id: &str,
        change: &WifiChange,
        delivery: Delivery,
    ) -> Result<TaskOutcome, CoreError> {
        validate_ssid(&change.ssid)?;
        validate_passphrase(change.password.expose_secret())?;

        let (ssid_path, password_path) = match (&change.ssid_param, &change.password_param) {
            (Some(ssid), Some(password)) => (ssid.clone(), password.clone()),
            _ => {
                let params = self.resolve_wifi(device_id, change.band).await?;
                (params.ssid_path, params.password_path)
            }
        };

        let task = Task::SetParameterValues {
            parameter_values: vec![
                ParameterValue::string(&ssid_path, &change.ssid),
                ParameterValue::string(&password_path, change.password.expose_secret()),
            ],
        };
        self.submit(device_id, task, delivery, vec![ssid_path, password_path])
            .await
    }

    /// Wi-Fi change followed by a queued reboot. The reboot is submitted
    /// only if the Wi-Fi task was accepted.
    pub async fn change_wifi_and_reboot(
        &self,
        device_id: &str,
        change: &WifiChange,
        delivery: Delivery,
    ) -> Result<CommandResult, CoreError> {
        let wifi = self.change_wifi(device_id, change, delivery).await?;
        let reboot = self
            .submit(device_id, Task::Reboot, Delivery::queued(), Vec::new())
            .await?;
        Ok(CommandResult::WifiAndReboot { wifi, reboot })
    }

    pub async fn change_pppoe(
        &self,
        device_id: &str,
        change: &PppoeChange,
        delivery: Delivery,
    ) -> Result<TaskOutcome, CoreError> {
        if change.username.trim().is_empty() {
            return Err(CoreError::Validation {
                message: "PPPoE username must not be empty".into(),
            });
        }

        let needs_resolution = change.username_param.is_none()
            || change.password_param.is_none()
            || (change.enable.is_some() && change.enable_param.is_none());
        let resolved = if needs_resolution {
            let doc = self.fetch_document(device_id, PPPOE_PROJECTION).await?;
            let params = resolve_pppoe_params(&doc);
            debug!(device_id, scheme = %params.scheme, "resolved PPPoE paths");
            Some(params)
        } else {
            None
        };
        let pick = |explicit: Option<&String>, resolved: Option<&String>| {
            explicit.or(resolved).cloned().unwrap_or_default()
        };

        let username_path = pick(
            change.username_param.as_ref(),
            resolved.as_ref().map(|p| &p.username_path),
        );
        let password_path = pick(
            change.password_param.as_ref(),
            resolved.as_ref().map(|p| &p.password_path),
        );

        let mut values = vec![
            ParameterValue::string(&username_path, &change.username),
            ParameterValue::string(&password_path, change.password.expose_secret()),
        ];
        let mut parameters = vec![username_path, password_path];
        if let Some(enable) = change.enable {
            let enable_path = pick(
                change.enable_param.as_ref(),
                resolved.as_ref().map(|p| &p.enable_path),
            );
            values.push(ParameterValue::boolean(&enable_path, enable));
            parameters.push(enable_path);
        }

        let task = Task::SetParameterValues {
            parameter_values: values,
        };
        self.submit(device_id, task, delivery, parameters).await
    }

    pub async fn reboot(&self, device_id: &str, delivery: Delivery) -> Result<TaskOutcome, CoreError> {
        self.submit(device_id, Task::Reboot, delivery, Vec::new()).await
    }

    pub async fn factory_reset(
        &self,
        device_id: &str,
        delivery: Delivery,
    ) -> Result<TaskOutcome, CoreError> {
        warn!(device_id, "submitting factory reset");
        self.submit(device_id, Task::FactoryReset, delivery, Vec::new())
            .await
    }

    /// Ask the device to report the given parameters. The values land in
    /// the device document, not in the acknowledgement.
    pub async fn get_parameter_values(
        &self,
        device_id: &str,
        names: Vec<String>,
        delivery: Delivery,
    ) -> Result<TaskOutcome, CoreError> {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Err(CoreError::Validation {
                message: "at least one parameter name is required".into(),
            });
        }
        let task = Task::GetParameterValues {
            parameter_names: names.clone(),
        };
        self.submit(device_id, task, delivery, names).await
    }

    pub async fn refresh_object(
        &self,
        device_id: &str,
        object: &str,
        delivery: Delivery,
    ) -> Result<TaskOutcome, CoreError> {
        let object = object.trim();
        if object.is_empty() {
            return Err(CoreError::Validation {
                message: "object path must not be empty".into(),
            });
        }
        let task = Task::RefreshObject {
            object_name: object.to_owned(),
        };
        self.submit(device_id, task, delivery, vec![object.to_owned()])
            .await
    }

    /// Wake the device by reading its firmware version. Always sent with
    /// a connection request.
    pub async fn connection_request(
        &self,
        device_id: &str,
        delivery: Delivery,
    ) -> Result<TaskOutcome, CoreError> {
        let doc = self
            .fetch_document(device_id, SOFTWARE_VERSION_PROJECTION)
            .await?;
        let path = Scheme::detect(&doc)
            .unwrap_or(Scheme::Legacy)
            .software_version_path();
        let delivery = Delivery {
            connection_request: true,
            timeout: delivery.timeout.or(Delivery::default().timeout),
        };
        let task = Task::GetParameterValues {
            parameter_names: vec![path.clone()],
        };
        self.submit(device_id, task, delivery, vec![path]).await
    }

    async fn submit(
        &self,
        device_id: &str,
        task: Task,
        delivery: Delivery,
        parameters: Vec<String>,
    ) -> Result<TaskOutcome, CoreError> {
        debug!(
            device_id,
            task = task.name(),
            connection_request = delivery.connection_request,
            "submitting task"
        );
        let ack = self
            .inner
            .nbi
            .submit_task(device_id, &task, delivery.to_task_options())
            .await?;
        info!(device_id, task = task.name(), status = %ack.status, "task accepted");
        Ok(TaskOutcome {
            task: ack,
            parameters,
        })
    }

    // ── Reads ────────────────────────────────────────────────────

    async fn fetch_document(&self, device_id: &str, projection: &[&str]) -> Result<Document, CoreError> {
        self.inner
            .nbi
            .find_device(device_id, projection)
            .await?
            .map(Document::from)
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: device_id.to_owned(),
            })
    }

    fn enrich_options<'a>(&'a self, cutoff: &'a Cutoff) -> EnrichOptions<'a> {
        EnrichOptions {
            wlan_policy: &self.inner.config.wlan_policy,
            subscriber_tag_prefixes: &self.inner.config.subscriber_tag_prefixes,
            online_cutoff: Some(cutoff),
        }
    }

    /// Fetch and enrich one device, with liveness against the configured
    /// online window.
    pub async fn device_summary(&self, device_id: &str) -> Result<DeviceSummary, CoreError> {
        let doc = self.fetch_document(device_id, SUMMARY_PROJECTION).await?;
        let cutoff = Cutoff::before(Utc::now(), self.inner.config.windows.online_secs);
        Ok(enrich(&doc, &self.enrich_options(&cutoff)))
    }

    pub async fn list_devices(&self, query: &DeviceListQuery) -> Result<DevicePage, CoreError> {
        let generated_at = Utc::now();
        let window = query
            .online_within_secs
            .unwrap_or(self.inner.config.windows.online_secs);
        let cutoff = Cutoff::before(generated_at, window);
        let filter = list_filter(query, &cutoff);
        let page_size = query.effective_page_size();

        let total = self
            .inner
            .nbi
            .count_devices(&filter, self.inner.config.count_cap)
            .await?;
        if !total.exact {
            warn!(total = total.value, "device count hit the cap; total is approximate");
        }

        let nbi_query = DeviceQuery::new(filter)
            .projection(SUMMARY_PROJECTION.iter().copied())
            .limit(page_size)
            .skip(query.skip())
            .sort(Sort::new(sort_field(query.sort_by), query.order));
        let docs = self.inner.nbi.query_devices(&nbi_query).await?;

        let opts = self.enrich_options(&cutoff);
        let items = docs
            .into_iter()
            .map(|v| enrich(&Document::from(v), &opts))
            .collect();

        Ok(DevicePage {
            generated_at,
            page: query.effective_page(),
            page_size,
            total: total.value,
            total_exact: total.exact,
            total_pages: total.value.div_ceil(u64::from(page_size)),
            online_cut: cutoff.as_str().to_owned(),
            items,
        })
    }

    /// Parameter paths for one band's SSID and passphrase.
    pub async fn resolve_wifi(&self, device_id: &str, band: Band) -> Result<WifiParams, CoreError> {
        let doc = self.fetch_document(device_id, WIFI_PROJECTION).await?;
        let params = resolve_wifi_params(&doc, band, &self.inner.config.wlan_policy);
        debug!(device_id, %band, ssid = %params.ssid_path, "resolved Wi-Fi paths");
        Ok(params)
    }

    /// Current SSID of one band, read from the path a Wi-Fi change would
    /// write to.
    pub async fn read_ssid(&self, device_id: &str, band: Band) -> Result<ParameterReading, CoreError> {
        let doc = self.fetch_document(device_id, WIFI_PROJECTION).await?;
        let params = resolve_wifi_params(&doc, band, &self.inner.config.wlan_policy);
        Ok(reading(device_id, &doc, params.ssid_path))
    }

    pub async fn read_value(&self, device_id: &str, path: &str) -> Result<ParameterReading, CoreError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(CoreError::Validation {
                message: "parameter path must not be empty".into(),
            });
        }
        let doc = self.fetch_document(device_id, &[path]).await?;
        Ok(reading(device_id, &doc, path.to_owned()))
    }

    // ── Metrics ──────────────────────────────────────────────────

    /// Total, online, and active counts, issued concurrently.
    pub async fn overview(&self, windows: MetricsWindows) -> Result<OverviewSnapshot, CoreError> {
        let now = Utc::now();
        let cap = self.inner.config.count_cap;
        let everything = Filter::all();
        let online = Filter::all().gte(
            LAST_INFORM_FIELD,
            Cutoff::before(now, windows.online_secs).as_str(),
        );
        let active = Filter::all().gte(
            LAST_INFORM_FIELD,
            Cutoff::before(now, windows.active_secs).as_str(),
        );

        let nbi = &self.inner.nbi;
        let (total, online, active) = tokio::join!(
            nbi.count_devices(&everything, cap),
            nbi.count_devices(&online, cap),
            nbi.count_devices(&active, cap),
        );
        let snapshot = OverviewSnapshot::from_counts(now, windows, total?, online?, active?);
        if snapshot.approximate {
            warn!(cap, "overview counts hit the cap; snapshot is approximate");
        }
        Ok(snapshot)
    }

    /// Emit an overview snapshot every `every` (at least one second) until
    /// `cancel` fires.
    ///
    /// The first snapshot is emitted immediately. Cancellation is checked
    /// on every tick and again before each emission. A failed tick yields
    /// the error and the stream carries on.
    pub fn overview_stream(
        &self,
        every: Duration,
        windows: MetricsWindows,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<OverviewSnapshot, CoreError>> + Send + 'static {
        let controller = self.clone();
        let every = every.max(MIN_STREAM_INTERVAL);
        stream! {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let snapshot = controller.overview(windows).await;
                if cancel.is_cancelled() {
                    break;
                }
                if let Err(ref e) = snapshot {
                    warn!(error = %e, "overview tick failed");
                }
                yield snapshot;
            }
            debug!("overview stream stopped");
        }
    }

    /// Model and firmware histograms over up to `sample_limit` documents
    /// (the configured limit when `None`).
    pub async fn distribution(&self, sample_limit: Option<u32>) -> Result<Distribution, CoreError> {
        let limit = sample_limit.unwrap_or(self.inner.config.distribution_sample_limit);
        let query = DeviceQuery::new(Filter::all())
            .projection(identity_projection())
            .limit(limit);
        let docs: Vec<Document> = self
            .inner
            .nbi
            .query_devices(&query)
            .await?
            .into_iter()
            .map(Document::from)
            .collect();
        Ok(Distribution::from_documents(Utc::now(), &docs))
    }

    /// The `limit` most recently seen devices, newest first.
    pub async fn last_informs(&self, limit: u32) -> Result<Vec<LastInform>, CoreError> {
        let query = DeviceQuery::new(Filter::all())
            .projection(
                [LAST_INFORM_FIELD]
                    .into_iter()
                    .chain(identity_projection()),
            )
            .limit(limit.max(1))
            .sort(Sort::new(LAST_INFORM_FIELD, SortOrder::Descending));
        let docs = self.inner.nbi.query_devices(&query).await?;
        Ok(docs
            .into_iter()
            .map(|v| LastInform::from(&Document::from(v)))
            .collect())
    }

    /// Probe the controller. Never fails; an unreachable controller is
    /// reported with `ok: false`.
    pub async fn health(&self) -> Health {
        let result = self.inner.nbi.ping().await;
        if let Err(ref e) = result {
            warn!(error = %e, "controller health probe failed");
        }
        Health {
            ok: result.is_ok(),
            nbi: self.inner.nbi.base_url().to_string(),
            version: env!("CARGO_PKG_VERSION"),
            now: Utc::now(),
            error: result.err().map(|e| CoreError::from(e).to_string()),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
        api_key: config.api_key.clone(),
    }
}

fn identity_projection() -> impl Iterator<Item = &'static str> {
    ["_id", "_deviceId"]
        .into_iter()
        .chain(MODEL_PATHS)
        .chain(FIRMWARE_PATHS)
}

fn reading(device_id: &str, doc: &Document, parameter: String) -> ParameterReading {
    ParameterReading {
        device: device_id.to_owned(),
        value: doc.get(&parameter).cloned(),
        value_type: doc.value_type(&parameter).map(ToOwned::to_owned),
        parameter,
    }
}

fn sort_field(sort: ListSort) -> &'static str {
    match sort {
        ListSort::LastInform => LAST_INFORM_FIELD,
        ListSort::ProductClass => PRODUCT_CLASS_FIELD,
        ListSort::SoftwareVersion => LEGACY_SOFTWARE_VERSION_FIELD,
    }
}

/// Controller predicate for a device listing.
fn list_filter(query: &DeviceListQuery, cutoff: &Cutoff) -> Filter {
    let mut filter = Filter::all();
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter = filter.any_of(
            SEARCH_FIELDS
                .iter()
                .map(|field| Filter::all().regex(field, search, true))
                .collect(),
        );
    }
    if let Some(tag) = query.tag.as_deref().filter(|t| !t.is_empty()) {
        filter = filter.equals("_tags", tag);
    }
    if let Some(pc) = query.product_class.as_deref().filter(|p| !p.is_empty()) {
        filter = filter.equals(PRODUCT_CLASS_FIELD, pc);
    }
    if query.only_online {
        filter = filter.gte(LAST_INFORM_FIELD, cutoff.as_str());
    }
    filter
}

fn validate_ssid(ssid: &str) -> Result<(), CoreError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(CoreError::Validation {
            message: format!("SSID must be 1-32 bytes, got {}", ssid.len()),
        });
    }
    Ok(())
}

/// WPA passphrase (8-63 printable characters) or a 64-digit hex key.
fn validate_passphrase(password: &str) -> Result<(), CoreError> {
    let len = password.chars().count();
    let hex_key = len == 64 && password.chars().all(|c| c.is_ascii_hexdigit());
    if hex_key || (8..=63).contains(&len) {
        Ok(())
    } else {
        Err(CoreError::Validation {
            message: format!("Wi-Fi password must be 8-63 characters, got {len}"),
        })
    }
}
