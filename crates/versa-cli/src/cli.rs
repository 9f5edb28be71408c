//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use versa_core::ApiVersion;

/// Versa CLI - API version negotiation, migration and routing
///
/// Inspect the served API versions, see how a request would be negotiated
/// and routed, and migrate records between versions.
#[derive(Parser, Debug)]
#[command(
    name = "versa",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VERSA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List served versions with their deprecation windows
    Versions,

    /// Show which version a request would be served with
    Negotiate(RequestArgs),

    /// Dispatch a request through the version router with an echo handler
    Route(RouteArgs),

    /// Migrate a record, or an array of records, between versions
    Migrate(MigrateArgs),

    /// Check directional compatibility and the upgrade path between versions
    Compat(CompatArgs),

    /// Show the capability flags of a version
    Features(FeaturesArgs),

    /// Encode and decode pagination cursors
    Cursor(CursorArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// The request whose version is negotiated
#[derive(Parser, Debug, Clone)]
pub struct RequestArgs {
    /// Request path, e.g. /api/v1/words
    #[arg(short, long, default_value = "/")]
    pub path: String,

    /// Request header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Accept header value
    #[arg(short, long)]
    pub accept: Option<String>,
}

/// Arguments for the route command
#[derive(Parser, Debug)]
pub struct RouteArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// JSON request body
    #[arg(short, long)]
    pub body: Option<String>,

    /// Versions that have a handler (defaults to every supported version)
    #[arg(long, value_delimiter = ',', value_parser = parse_version)]
    pub implemented: Vec<ApiVersion>,

    /// Leave version headers off the response
    #[arg(long)]
    pub no_version_headers: bool,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// JSON or YAML file holding one record or an array of records
    #[arg(value_name = "RECORDS_FILE")]
    pub input: PathBuf,

    /// Version the records are written in
    #[arg(long, value_parser = parse_version)]
    pub from: ApiVersion,

    /// Version to migrate the records to
    #[arg(long, value_parser = parse_version)]
    pub to: ApiVersion,

    /// Save the migrated records to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the compat command
#[derive(Parser, Debug)]
pub struct CompatArgs {
    /// Source version
    #[arg(long, value_parser = parse_version)]
    pub from: ApiVersion,

    /// Target version
    #[arg(long, value_parser = parse_version)]
    pub to: ApiVersion,
}

/// Arguments for the features command
#[derive(Parser, Debug)]
pub struct FeaturesArgs {
    /// Version to inspect
    #[arg(id = "api_version", value_name = "VERSION", value_parser = parse_version)]
    pub version: ApiVersion,

    /// Dotted feature path to check, e.g. pagination.cursor
    #[arg(long)]
    pub path: Option<String>,
}

/// Arguments for the cursor command
#[derive(Parser, Debug)]
pub struct CursorArgs {
    #[command(subcommand)]
    pub action: CursorAction,
}

/// Cursor actions
#[derive(Subcommand, Debug)]
pub enum CursorAction {
    /// Encode an offset and page size as an opaque token
    Encode {
        /// Offset of the first item
        #[arg(long)]
        offset: u64,

        /// Page size
        #[arg(long)]
        limit: u32,
    },

    /// Decode a token, falling back to the first page when it is malformed
    Decode {
        /// Token to decode
        token: String,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with the built-in catalog
    Init(ConfigInitArgs),

    /// Show current configuration values
    Show(ConfigShowArgs),

    /// Validate current configuration
    Validate,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file
    #[arg(long, default_value = ".versa.yaml")]
    pub path: PathBuf,

    /// Initialize the user config instead (~/.config/versa/config.yaml)
    #[arg(long, conflicts_with = "path")]
    pub user: bool,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

fn parse_version(input: &str) -> Result<ApiVersion, String> {
    ApiVersion::parse(input).map_err(|e| e.to_string())
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
