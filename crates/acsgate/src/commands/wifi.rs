//! Wi-Fi command handlers.

use acsgate_core::{Command as CoreCommand, Controller, WifiChange};

use crate::cli::{GlobalOpts, WifiArgs, WifiCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: WifiArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        WifiCommand::Set(set) => {
            let password = util::secret_or_prompt(set.password, "Wi-Fi passphrase: ", "password")?;
            let change = WifiChange {
                band: set.band.band,
                ssid: set.ssid,
                password,
                ssid_param: set.ssid_param,
                password_param: set.password_param,
            };

            let command = if set.reboot {
                let prompt = format!("Change Wi-Fi on {} and reboot it?", set.device);
                if !util::confirm(&prompt, "reboot", global.yes)? {
                    return Ok(());
                }
                CoreCommand::ChangeWifiAndReboot {
                    device_id: set.device,
                    change,
                }
            } else {
                CoreCommand::ChangeWifi {
                    device_id: set.device,
                    change,
                }
            };

            let delivery = controller.config().delivery;
            let result = controller.execute(command, delivery).await?;
            util::print_result(&result, delivery.connection_request, global)
        }
    }
}
