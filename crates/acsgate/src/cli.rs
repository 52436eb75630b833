//! Clap derive structures for the `acsgate` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use acsgate_config::Defaults;
use acsgate_core::{Band, ListSort, SortOrder};
use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// acsgate -- inspect and manage TR-069 CPE fleets through an ACS
#[derive(Debug, Parser)]
#[command(
    name = "acsgate",
    version,
    about = "Inspect and manage TR-069 CPE fleets through an ACS northbound interface",
    long_about = "Reads device documents from the ACS, resolves them into one flat view \
        regardless of data model (TR-181 Device. or TR-098 InternetGatewayDevice.), \
        and submits configuration tasks such as Wi-Fi and PPPoE changes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "ACSGATE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// NBI base URL (overrides profile)
    #[arg(long, short = 'u', env = "ACSGATE_NBI_URL", global = true)]
    pub nbi_url: Option<String>,

    /// API key sent as X-API-Key
    #[arg(long, env = "ACSGATE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "ACSGATE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "ACSGATE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ACSGATE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Queue tasks for the next inform instead of waking the device
    #[arg(long, global = true)]
    pub no_connection_request: bool,
}

impl GlobalOpts {
    /// Fill output and color from the config file when no flag was given.
    pub fn apply_defaults(&mut self, defaults: &Defaults) {
        if self.output.is_none() {
            self.output = OutputFormat::from_str(&defaults.output, true).ok();
        }
        if self.color.is_none() {
            self.color = ColorMode::from_str(&defaults.color, true).ok();
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.output.unwrap_or(OutputFormat::Table)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect devices and submit device tasks
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Change Wi-Fi credentials
    #[command(alias = "w")]
    Wifi(WifiArgs),

    /// Change PPPoE credentials
    Pppoe(PppoeArgs),

    /// Fleet counts and histograms
    #[command(alias = "m")]
    Metrics(MetricsArgs),

    /// Check that the NBI is reachable
    Health,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices, one page at a time
    #[command(alias = "ls")]
    List(DeviceListArgs),

    /// Show the resolved summary of one device
    Get {
        /// Device ID
        device: String,
    },

    /// Read one parameter from the stored device document
    Read {
        /// Device ID
        device: String,

        /// Full parameter path (e.g. Device.DeviceInfo.UpTime)
        path: String,
    },

    /// Read the SSID of one band
    Ssid {
        /// Device ID
        device: String,

        #[command(flatten)]
        band: BandArg,
    },

    /// Show the SSID and passphrase paths a Wi-Fi change would write
    WifiParams {
        /// Device ID
        device: String,

        #[command(flatten)]
        band: BandArg,
    },

    /// Reboot a device
    Reboot {
        /// Device ID
        device: String,
    },

    /// Factory-reset a device (destructive)
    FactoryReset {
        /// Device ID
        device: String,
    },

    /// Ask the device to report parameter values
    Params {
        /// Device ID
        device: String,

        /// Parameter paths
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Ask the device to re-report an object subtree
    Refresh {
        /// Device ID
        device: String,

        /// Object path (e.g. Device.WiFi.)
        object: String,
    },

    /// Wake the device with a connection request
    Connreq {
        /// Device ID
        device: String,
    },
}

#[derive(Debug, Args)]
pub struct DeviceListArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Devices per page (1-500)
    #[arg(long, short = 'l', default_value = "25")]
    pub page_size: u32,

    /// Case-insensitive regex over ID, product class, and firmware
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only devices carrying this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Only devices of this product class
    #[arg(long)]
    pub product_class: Option<String>,

    /// Liveness window in seconds [default: profile online window]
    #[arg(long, value_name = "SECS")]
    pub online_within: Option<u64>,

    /// Only devices seen within the liveness window
    #[arg(long)]
    pub online: bool,

    /// Sort key: last_inform, product_class, software_version
    #[arg(long, default_value = "last_inform")]
    pub sort: ListSort,

    /// Sort direction
    #[arg(long, default_value = "desc")]
    pub order: SortDirection,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl From<SortDirection> for SortOrder {
    fn from(dir: SortDirection) -> Self {
        match dir {
            SortDirection::Asc => SortOrder::Ascending,
            SortDirection::Desc => SortOrder::Descending,
        }
    }
}

#[derive(Debug, Args)]
pub struct BandArg {
    /// Radio band: 2.4 or 5
    #[arg(long, short = 'b', default_value = "2.4GHz")]
    pub band: Band,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WIFI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WifiArgs {
    #[command(subcommand)]
    pub command: WifiCommand,
}

#[derive(Debug, Subcommand)]
pub enum WifiCommand {
    /// Set the SSID and passphrase of one band
    Set(WifiSetArgs),
}

#[derive(Debug, Args)]
pub struct WifiSetArgs {
    /// Device ID
    pub device: String,

    /// New SSID (1-32 bytes)
    #[arg(long)]
    pub ssid: String,

    /// New passphrase (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,

    #[command(flatten)]
    pub band: BandArg,

    /// Explicit SSID parameter path (requires --password-param)
    #[arg(long, requires = "password_param")]
    pub ssid_param: Option<String>,

    /// Explicit passphrase parameter path (requires --ssid-param)
    #[arg(long, requires = "ssid_param")]
    pub password_param: Option<String>,

    /// Queue a reboot after the change
    #[arg(long)]
    pub reboot: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PPPOE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PppoeArgs {
    #[command(subcommand)]
    pub command: PppoeCommand,
}

#[derive(Debug, Subcommand)]
pub enum PppoeCommand {
    /// Set the PPPoE username and password
    Set(PppoeSetArgs),
}

#[derive(Debug, Args)]
pub struct PppoeSetArgs {
    /// Device ID
    pub device: String,

    #[arg(long)]
    pub username: String,

    /// PPPoE password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,

    /// Also enable the connection
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Also disable the connection
    #[arg(long)]
    pub disable: bool,

    /// Explicit username parameter path
    #[arg(long)]
    pub username_param: Option<String>,

    /// Explicit password parameter path
    #[arg(long)]
    pub password_param: Option<String>,

    /// Explicit enable parameter path
    #[arg(long)]
    pub enable_param: Option<String>,
}

impl PppoeSetArgs {
    pub fn enable_flag(&self) -> Option<bool> {
        match (self.enable, self.disable) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  METRICS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MetricsArgs {
    #[command(subcommand)]
    pub command: MetricsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MetricsCommand {
    /// Total, online, and active device counts
    Overview(WindowArgs),

    /// Product class and firmware histograms
    Distribution {
        /// Documents to sample [default: profile limit]
        #[arg(long, short = 'l')]
        limit: Option<u32>,
    },

    /// Most recently seen devices
    LastInforms {
        #[arg(long, short = 'l', default_value = "20")]
        limit: u32,
    },

    /// Print an overview snapshot periodically until interrupted
    Watch {
        /// Seconds between snapshots (minimum 1)
        #[arg(long, short = 'i', default_value = "10")]
        interval: u64,

        /// Stop after this many snapshots
        #[arg(long, short = 'n')]
        count: Option<usize>,

        #[command(flatten)]
        windows: WindowArgs,
    },
}

#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Online window in seconds [default: profile]
    #[arg(long, value_name = "SECS")]
    pub online_window: Option<u64>,

    /// Active window in seconds [default: profile]
    #[arg(long, value_name = "SECS")]
    pub active_window: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a profile with guided setup
    Init,

    /// Display the current configuration (secrets redacted)
    Show,

    /// Print the config file location
    Path,

    /// Store an API key in the system keyring
    SetApiKey {
        /// Profile name [default: active profile]
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_defaults_fill_missing_flags() {
        let mut cli = Cli::parse_from(["acsgate", "health"]);
        let defaults = Defaults {
            output: "json".into(),
            color: "never".into(),
            timeout: 30,
        };
        cli.global.apply_defaults(&defaults);
        assert_eq!(cli.global.format(), OutputFormat::Json);
        assert_eq!(cli.global.color_mode(), ColorMode::Never);

        let mut cli = Cli::parse_from(["acsgate", "-o", "yaml", "health"]);
        cli.global.apply_defaults(&defaults);
        assert_eq!(cli.global.format(), OutputFormat::Yaml);
    }

    #[test]
    fn pppoe_enable_flags() {
        let cli = Cli::parse_from(["acsgate", "pppoe", "set", "dev1", "--username", "u", "--disable"]);
        let Command::Pppoe(PppoeArgs {
            command: PppoeCommand::Set(args),
        }) = cli.command
        else {
            panic!("expected pppoe set");
        };
        assert_eq!(args.enable_flag(), Some(false));
    }

    #[test]
    fn band_accepts_short_spellings() {
        let cli = Cli::parse_from(["acsgate", "devices", "ssid", "dev1", "-b", "5"]);
        let Command::Devices(DevicesArgs {
            command: DevicesCommand::Ssid { band, .. },
        }) = cli.command
        else {
            panic!("expected devices ssid");
        };
        assert_eq!(band.band, Band::Five);
    }
}
