//! Shared helpers for command handlers.

use std::io::IsTerminal;

use secrecy::SecretString;

use acsgate_core::{CommandResult, TaskAck, TaskOutcome, TaskStatus};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal on stdin there is nobody to ask, so the operation
/// is refused unless `--yes` was given.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Use the flag value, or prompt for it without echo.
pub fn secret_or_prompt(
    value: Option<String>,
    prompt: &str,
    field: &str,
) -> Result<SecretString, CliError> {
    if let Some(value) = value {
        return Ok(SecretString::from(value));
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: format!("--{field} is required when stdin is not a terminal"),
        });
    }
    let value = rpassword::prompt_password(prompt)?;
    Ok(SecretString::from(value))
}

// ── Task acknowledgements ───────────────────────────────────────────

fn ack_detail(ack: &TaskAck, parameters: &[String]) -> String {
    let mut lines = vec![
        format!("Task:       {}", ack.name.as_deref().unwrap_or("-")),
        format!("Status:     {}", ack.status),
        format!("ID:         {}", ack.id.as_deref().unwrap_or("-")),
        format!("Device:     {}", ack.device.as_deref().unwrap_or("-")),
    ];
    if let Some(ref ts) = ack.timestamp {
        lines.push(format!("Submitted:  {ts}"));
    }
    for (i, p) in parameters.iter().enumerate() {
        let label = if i == 0 { "Parameters:" } else { "" };
        lines.push(format!("{label:<11} {p}"));
    }
    lines.join("\n")
}

fn outcome_detail(outcome: &TaskOutcome) -> String {
    ack_detail(&outcome.task, &outcome.parameters)
}

fn result_detail(result: &CommandResult) -> String {
    match result {
        CommandResult::Task(outcome) => outcome_detail(outcome),
        CommandResult::WifiAndReboot { wifi, reboot } => {
            format!("{}\n\n{}", outcome_detail(wifi), outcome_detail(reboot))
        }
    }
}

fn result_ids(result: &CommandResult) -> String {
    result
        .acks()
        .iter()
        .map(|ack| ack.id.clone().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print a command result, plus a hint when a connection request was
/// sent but the first task was still left queued.
pub fn print_result(
    result: &CommandResult,
    connection_request: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = output::render_single(global.format(), result, result_detail, result_ids)?;
    output::print_output(&out, global.quiet);

    if !global.quiet
        && connection_request
        && result
            .acks()
            .first()
            .is_some_and(|ack| ack.status == TaskStatus::Queued)
    {
        eprintln!("Task queued: the device will pick it up at its next inform.");
    }
    Ok(())
}
