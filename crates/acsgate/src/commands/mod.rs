//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod health;
pub mod metrics;
pub mod pppoe;
pub mod util;
pub mod wifi;

use acsgate_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an NBI-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(controller, args, global).await,
        Command::Wifi(args) => wifi::handle(controller, args, global).await,
        Command::Pppoe(args) => pppoe::handle(controller, args, global).await,
        Command::Metrics(args) => metrics::handle(controller, args, global).await,
        Command::Health => health::handle(controller, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
