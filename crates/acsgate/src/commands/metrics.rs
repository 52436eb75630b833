//! Metrics command handlers.

use std::collections::BTreeMap;
use std::time::Duration;

use futures_util::StreamExt;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use acsgate_core::{Controller, Distribution, LastInform, MetricsWindows, OverviewSnapshot};

use crate::cli::{GlobalOpts, MetricsArgs, MetricsCommand, OutputFormat, WindowArgs};
use crate::error::CliError;
use crate::output::{self, or_dash};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Devices")]
    devices: u64,
}

#[derive(Tabled)]
struct LastInformRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Last Inform")]
    last_inform: String,
    #[tabled(rename = "Product Class")]
    product_class: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
}

fn last_inform_row(l: &LastInform) -> LastInformRow {
    LastInformRow {
        id: l.device_id.clone(),
        last_inform: or_dash(l.last_inform.as_deref()),
        product_class: or_dash(l.product_class.as_deref()),
        firmware: or_dash(l.software_version.as_deref()),
    }
}

// ── Rendering ───────────────────────────────────────────────────────

fn overview_detail(s: &OverviewSnapshot) -> String {
    let mut lines = vec![
        format!("Generated:   {}", s.generated_at.to_rfc3339()),
        format!("Total:       {}", s.total_devices),
        format!(
            "Online:      {} (seen within {}s)",
            s.online_now, s.windows.online_secs
        ),
        format!(
            "Active:      {} (seen within {}s)",
            s.active_24h, s.windows.active_secs
        ),
        format!("Offline:     {}", s.offline_24h),
    ];
    if s.approximate {
        lines.push("Note:        counts hit the configured cap and are approximate".into());
    }
    lines.join("\n")
}

fn overview_line(s: &OverviewSnapshot) -> String {
    format!(
        "{} total={} online={} active={} offline={}{}",
        s.generated_at.to_rfc3339(),
        s.total_devices,
        s.online_now,
        s.active_24h,
        s.offline_24h,
        if s.approximate { " (approximate)" } else { "" },
    )
}

/// Buckets by descending count, ties by value.
fn bucket_rows(buckets: &BTreeMap<String, u64>) -> Vec<BucketRow> {
    let mut rows: Vec<BucketRow> = buckets
        .iter()
        .map(|(value, devices)| BucketRow {
            value: value.clone(),
            devices: *devices,
        })
        .collect();
    rows.sort_by(|a, b| b.devices.cmp(&a.devices));
    rows
}

fn distribution_detail(d: &Distribution) -> String {
    format!(
        "Product class ({} sampled)\n{}\n\nFirmware\n{}",
        d.sampled,
        output::render_table(&bucket_rows(&d.product_class)),
        output::render_table(&bucket_rows(&d.software_version)),
    )
}

fn distribution_plain(d: &Distribution) -> String {
    let product = d
        .product_class
        .iter()
        .map(|(k, v)| format!("product_class\t{k}\t{v}"));
    let firmware = d
        .software_version
        .iter()
        .map(|(k, v)| format!("software_version\t{k}\t{v}"));
    product.chain(firmware).collect::<Vec<_>>().join("\n")
}

fn windows(defaults: MetricsWindows, args: &WindowArgs) -> MetricsWindows {
    MetricsWindows {
        online_secs: args.online_window.unwrap_or(defaults.online_secs),
        active_secs: args.active_window.unwrap_or(defaults.active_secs),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: MetricsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let configured = controller.config().windows;

    match args.command {
        MetricsCommand::Overview(window_args) => {
            let snapshot = controller.overview(windows(configured, &window_args)).await?;
            let out = output::render_single(
                global.format(),
                &snapshot,
                overview_detail,
                overview_line,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MetricsCommand::Distribution { limit } => {
            let dist = controller.distribution(limit).await?;
            let out = output::render_single(
                global.format(),
                &dist,
                distribution_detail,
                distribution_plain,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MetricsCommand::LastInforms { limit } => {
            let rows = controller.last_informs(limit).await?;
            let out = output::render_list(
                global.format(),
                &rows,
                last_inform_row,
                |l| l.device_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MetricsCommand::Watch {
            interval,
            count,
            windows: window_args,
        } => watch(controller, interval, count, windows(configured, &window_args), global).await,
    }
}

/// Stream snapshots until Ctrl-C or `count` snapshots were printed.
async fn watch(
    controller: &Controller,
    interval: u64,
    count: Option<usize>,
    windows: MetricsWindows,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.cancel();
        }
    });

    // One line per snapshot, also for JSON.
    let format = match global.format() {
        OutputFormat::Json => OutputFormat::JsonCompact,
        other => other,
    };

    let mut stream = std::pin::pin!(controller.overview_stream(
        Duration::from_secs(interval),
        windows,
        cancel.clone(),
    ));
    let mut printed = 0usize;
    while let Some(item) = stream.next().await {
        // Failed ticks are logged by the stream; keep watching.
        let Ok(snapshot) = item else { continue };
        let out = output::render_single(format, &snapshot, overview_line, overview_line)?;
        output::print_output(&out, global.quiet);
        printed += 1;
        if count.is_some_and(|n| printed >= n) {
            cancel.cancel();
            break;
        }
    }
    Ok(())
}
