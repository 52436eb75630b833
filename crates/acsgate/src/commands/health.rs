//! Health command handler.

use acsgate_core::{Controller, Health};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(h: &Health, color: bool) -> String {
    let mut lines = vec![
        format!("Status:  {}", output::ok_cell(h.ok, color)),
        format!("NBI:     {}", h.nbi),
        format!("Version: {}", h.version),
        format!("Time:    {}", h.now.to_rfc3339()),
    ];
    if let Some(ref err) = h.error {
        lines.push(format!("Error:   {err}"));
    }
    lines.join("\n")
}

/// Print the probe result; an unreachable NBI also fails the command.
pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color_mode());
    let health = controller.health().await;

    let out = output::render_single(
        global.format(),
        &health,
        |h| detail(h, color),
        |h| output::ok_cell(h.ok, false),
    )?;
    output::print_output(&out, global.quiet);

    if health.ok {
        Ok(())
    } else {
        Err(CliError::Unhealthy { url: health.nbi })
    }
}
