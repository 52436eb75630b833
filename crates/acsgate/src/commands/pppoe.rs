//! PPPoE command handlers.

use acsgate_core::{Command as CoreCommand, Controller, PppoeChange};

use crate::cli::{GlobalOpts, PppoeArgs, PppoeCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: PppoeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PppoeCommand::Set(set) => {
            let enable = set.enable_flag();
            let password = util::secret_or_prompt(set.password, "PPPoE password: ", "password")?;
            let change = PppoeChange {
                username: set.username,
                password,
                enable,
                username_param: set.username_param,
                password_param: set.password_param,
                enable_param: set.enable_param,
            };

            let delivery = controller.config().delivery;
            let command = CoreCommand::ChangePppoe {
                device_id: set.device,
                change,
            };
            let result = controller.execute(command, delivery).await?;
            util::print_result(&result, delivery.connection_request, global)
        }
    }
}
