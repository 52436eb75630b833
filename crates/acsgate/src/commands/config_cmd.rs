//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::ExposeSecret;

use acsgate_core::DEFAULT_NBI_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util;

const REDACTED: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Copy of the config with plaintext keys masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(REDACTED.into());
        }
    }
    cfg
}

// ── Handler ─────────────────────────────────────────────────────────

/// `cfg` is the configuration already loaded from file and environment.
pub fn handle(args: ConfigArgs, global: &GlobalOpts, mut cfg: Config) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("acsgate configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. NBI URL
            let nbi_url: String = Input::new()
                .with_prompt("NBI URL")
                .default(DEFAULT_NBI_URL.into())
                .interact_text()
                .map_err(prompt_err)?;

            // 3. Optional API key
            let key_choices = &[
                "No API key (NBI is not behind an authenticating gateway)",
                "Store API key in system keyring (recommended)",
                "Save API key to config file (plaintext)",
            ];
            let key_selection = Select::new()
                .with_prompt("API key")
                .items(key_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let api_key = if key_selection == 0 {
                None
            } else {
                let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
                if key.trim().is_empty() {
                    return Err(CliError::Validation {
                        field: "api_key".into(),
                        reason: "API key cannot be empty".into(),
                    });
                }
                if key_selection == 1 {
                    config::store_api_key(&profile_name, key.trim())?;
                    eprintln!("   API key stored in system keyring");
                    None
                } else {
                    Some(key.trim().to_owned())
                }
            };

            // 4. Merge into the existing config
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            profile.nbi_url = nbi_url;
            if api_key.is_some() {
                profile.api_key = api_key;
            }
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }

            // 5. Validate before writing
            cfg.controller_config(&profile_name, &config::Overrides::default())?;
            let path = config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", path.display());
            eprintln!("  Profile: {profile_name}");
            eprintln!("\n  Test it: acsgate health --profile {profile_name}");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let shown = redacted(&cfg);
            let out = output::render_single(
                global.format(),
                &shown,
                |c| format!("{c:#?}"),
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── SetApiKey ───────────────────────────────────────────────
        ConfigCommand::SetApiKey { profile } => {
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) && profile_name != "default" {
                return Err(config::profile_not_found(profile_name, &cfg));
            }

            let secret = util::secret_or_prompt(None, "API key: ", "api-key")?;
            let secret = secret.expose_secret().trim().to_owned();
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "api-key".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            config::store_api_key(&profile_name, &secret)?;
            eprintln!("API key stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acsgate_config::Profile;

    #[test]
    fn show_masks_plaintext_keys() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                api_key: Some("s3cret".into()),
                ..Profile::default()
            },
        );
        cfg.profiles.insert("edge".into(), Profile::default());

        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["lab"].api_key.as_deref(), Some(REDACTED));
        assert_eq!(shown.profiles["edge"].api_key, None);
        assert_eq!(cfg.profiles["lab"].api_key.as_deref(), Some("s3cret"));
    }
}
