//! Device command handlers.

use tabled::Tabled;

use acsgate_core::{
    Command as CoreCommand, Controller, DeviceListQuery, DevicePage, DeviceSummary,
    ParameterReading, WifiParams,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, or_dash};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Last Inform")]
    last_inform: String,
    #[tabled(rename = "SSID 2.4")]
    ssid_24: String,
    #[tabled(rename = "SSID 5")]
    ssid_5: String,
    #[tabled(rename = "Subscriber")]
    subscriber: String,
}

impl DeviceRow {
    fn new(d: &DeviceSummary, color: bool) -> Self {
        Self {
            id: d.device_id.clone(),
            model: or_dash(d.model.as_deref()),
            firmware: or_dash(d.firmware.as_deref()),
            ip: or_dash(d.ip.as_deref()),
            state: output::online_cell(d.online, color),
            last_inform: or_dash(d.last_inform.as_deref()),
            ssid_24: or_dash(d.wifi.ssid_24.as_deref()),
            ssid_5: or_dash(d.wifi.ssid_5.as_deref()),
            subscriber: or_dash(d.subscriber.as_deref()),
        }
    }
}

fn page_table(page: &DevicePage, color: bool) -> String {
    let rows: Vec<DeviceRow> = page.items.iter().map(|d| DeviceRow::new(d, color)).collect();
    let total = if page.total_exact {
        page.total.to_string()
    } else {
        format!("at least {}", page.total)
    };
    format!(
        "{}\nPage {} of {}, {total} devices (online since {})",
        output::render_table(&rows),
        page.page,
        page.total_pages.max(1),
        page.online_cut,
    )
}

fn page_ids(page: &DevicePage) -> String {
    page.items
        .iter()
        .map(|d| d.device_id.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn detail(d: &DeviceSummary, color: bool) -> String {
    let mut lines = vec![
        format!("ID:         {}", d.device_id),
        format!("Serial:     {}", or_dash(d.serial_number.as_deref())),
        format!("Vendor:     {}", or_dash(d.vendor.as_deref())),
        format!("Model:      {}", or_dash(d.model.as_deref())),
        format!("Firmware:   {}", or_dash(d.firmware.as_deref())),
        format!(
            "Data model: {}",
            d.data_model.map_or_else(|| "-".into(), |s| s.to_string())
        ),
        format!("State:      {}", output::online_cell(d.online, color)),
        format!("Last seen:  {}", or_dash(d.last_inform.as_deref())),
        format!("Last boot:  {}", or_dash(d.last_boot.as_deref())),
        format!("WAN IPv4:   {}", or_dash(d.network.wan_ipv4.as_deref())),
        format!("LAN IPv4:   {}", or_dash(d.network.lan_ipv4.as_deref())),
        format!("SSID 2.4:   {}", or_dash(d.wifi.ssid_24.as_deref())),
        format!("SSID 5:     {}", or_dash(d.wifi.ssid_5.as_deref())),
        format!("ConnReq:    {}", or_dash(d.mgmt.conn_req_url.as_deref())),
        format!("STUN:       {}", d.mgmt.stun_enable),
    ];
    if let Some(interval) = d.mgmt.periodic_inform_interval {
        lines.push(format!("Inform:     every {interval}s"));
    }
    if let Some(ref sub) = d.subscriber {
        lines.push(format!("Subscriber: {sub}"));
    }
    if !d.tags.is_empty() {
        lines.push(format!("Tags:       {}", d.tags.join(", ")));
    }
    lines.join("\n")
}

fn reading_detail(r: &ParameterReading) -> String {
    [
        format!("Device:    {}", r.device),
        format!("Parameter: {}", r.parameter),
        format!(
            "Value:     {}",
            r.value.as_ref().map_or_else(|| "-".into(), ToString::to_string)
        ),
        format!("Type:      {}", or_dash(r.value_type.as_deref())),
    ]
    .join("\n")
}

fn reading_value(r: &ParameterReading) -> String {
    r.value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn wifi_params_detail(p: &WifiParams) -> String {
    [
        format!("Band:     {}", p.band),
        format!("Scheme:   {}", p.scheme),
        format!("SSID:     {}", p.ssid_path),
        format!("Password: {}", p.password_path),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color_mode());
    let delivery = controller.config().delivery;

    let command = match args.command {
        DevicesCommand::List(list) => {
            let query = DeviceListQuery {
                page: list.page,
                page_size: list.page_size,
                search: list.search,
                tag: list.tag,
                product_class: list.product_class,
                online_within_secs: list.online_within,
                only_online: list.online,
                sort_by: list.sort,
                order: list.order.into(),
            };
            let page = controller.list_devices(&query).await?;
            let out = output::render_single(
                global.format(),
                &page,
                |p| page_table(p, color),
                page_ids,
            )?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }

        DevicesCommand::Get { device } => {
            let summary = controller.device_summary(&device).await?;
            let out = output::render_single(
                global.format(),
                &summary,
                |d| detail(d, color),
                |d| d.device_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }

        DevicesCommand::Read { device, path } => {
            let reading = controller.read_value(&device, &path).await?;
            let out =
                output::render_single(global.format(), &reading, reading_detail, reading_value)?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }

        DevicesCommand::Ssid { device, band } => {
            let reading = controller.read_ssid(&device, band.band).await?;
            let out =
                output::render_single(global.format(), &reading, reading_detail, reading_value)?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }

        DevicesCommand::WifiParams { device, band } => {
            let params = controller.resolve_wifi(&device, band.band).await?;
            let out = output::render_single(global.format(), &params, wifi_params_detail, |p| {
                format!("{}\n{}", p.ssid_path, p.password_path)
            })?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }

        DevicesCommand::Reboot { device } => {
            if !util::confirm(&format!("Reboot device {device}?"), "reboot", global.yes)? {
                return Ok(());
            }
            CoreCommand::Reboot { device_id: device }
        }

        DevicesCommand::FactoryReset { device } => {
            let prompt = format!("Factory-reset device {device}? All settings will be lost.");
            if !util::confirm(&prompt, "factory-reset", global.yes)? {
                return Ok(());
            }
            CoreCommand::FactoryReset { device_id: device }
        }

        DevicesCommand::Params { device, names } => CoreCommand::GetParameterValues {
            device_id: device,
            names,
        },

        DevicesCommand::Refresh { device, object } => CoreCommand::RefreshObject {
            device_id: device,
            object,
        },

        DevicesCommand::Connreq { device } => CoreCommand::ConnectionRequest { device_id: device },
    };

    let woke = delivery.connection_request || matches!(command, CoreCommand::ConnectionRequest { .. });
    let result = controller.execute(command, delivery).await?;
    util::print_result(&result, woke, global)
}
