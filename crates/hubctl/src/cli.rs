//! Clap derive structures for the `hubctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hubctl -- manage IoT hub devices from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "hubctl",
    version,
    about = "Manage IoT hub devices from the command line",
    long_about = "A terminal dashboard for an IoT device hub.\n\n\
        Log in, list and toggle devices, onboard new ones by scanned or\n\
        server-generated ID, and watch live state changes.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "HUBCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, env = "HUBCTL_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HUBCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "HUBCTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "HUBCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Directory holding session state (token, last username)
    #[arg(long, env = "HUBCTL_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
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

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login(AuthArgs),

    /// Create an account, then log in with it
    #[command(alias = "signup")]
    Register(AuthArgs),

    /// Forget the stored session token
    Logout,

    /// Show the current user
    Whoami,

    /// List, toggle, onboard and watch devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Username (defaults to the profile's username, else prompts)
    #[arg(long, short = 'u', env = "HUBCTL_USERNAME")]
    pub username: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices
    #[command(alias = "ls")]
    List,

    /// Show one device
    Get {
        /// Device ID
        device_id: String,
    },

    /// Count devices by state
    Summary,

    /// Set a device's state (flips it when --state is omitted)
    Toggle {
        /// Device ID
        device_id: String,

        /// Target state
        #[arg(long, short = 's', value_enum, ignore_case = true)]
        state: Option<StateArg>,
    },

    /// Switch a device on
    On {
        /// Device ID
        device_id: String,
    },

    /// Switch a device off
    Off {
        /// Device ID
        device_id: String,
    },

    /// Register a device under an ID you supply (typed or scanned)
    Register {
        /// Device ID, usually printed on the device label
        #[arg(long, required_unless_present = "scan", conflicts_with = "scan")]
        id: Option<String>,

        /// Read the ID from the output of a QR decoder (file path, or - for stdin)
        #[arg(long, value_name = "FILE")]
        scan: Option<PathBuf>,

        /// Display name
        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// Create a device with a server-generated ID and provisioning QR code
    Add {
        /// Display name
        #[arg(long, short = 'n')]
        name: String,

        /// Write the QR code PNG to this file or directory
        #[arg(long, value_name = "PATH", default_value = ".")]
        save_qr: PathBuf,
    },

    /// Stream live state changes until interrupted
    Watch {
        /// Device ID
        device_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    On,
    Off,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value
    Set {
        /// Config key (dot-separated path, e.g., "profiles.home.api_url")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
