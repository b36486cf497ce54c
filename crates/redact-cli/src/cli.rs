use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use redact_core::Mode;

#[derive(Parser)]
#[command(name = "redactctl")]
#[command(about = "Detect and redact PII/PHI in text", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Redact text from an argument, a file or stdin
    Redact(RedactArgs),

    /// Inspect and exercise the engine
    ///
    /// The vault lives in process memory, so every invocation starts with an empty
    /// vault at key version 1 and nothing carries over to the next run.
    #[command(subcommand)]
    Engine(EngineCommands),

    /// Work with policy files
    #[command(subcommand)]
    Policy(PolicyCommands),

    /// Print version and engine layers
    Version,
}

#[derive(clap::Args)]
pub struct RedactArgs {
    /// Text to redact (reads --input or stdin when omitted)
    pub text: Option<String>,

    /// Read text from this file
    #[arg(short, long, conflicts_with = "text")]
    pub input: Option<PathBuf>,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// replace, mask, remove, tokenize, hash or encrypt
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Only detect these types (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<String>,

    /// Mint a token for restoring the original text
    #[arg(long)]
    pub reversible: bool,

    /// Token lifetime in seconds (default from config)
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Policy file (JSON or TOML) with rules and custom patterns
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Content field the text belongs to, for rule scoping
    #[arg(long)]
    pub field: Option<String>,

    /// Print engine stats after redacting
    #[arg(long)]
    pub stats: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum EngineCommands {
    /// Show engine configuration and statistics of a fresh in-process engine
    Stats,

    /// List active detection patterns
    Patterns,

    /// Sweep expired tokens from a fresh in-process vault (always 0; see `engine test`)
    Cleanup,

    /// Rotate the master key of a fresh in-process vault; the new key is discarded on exit
    RotateKeys,

    /// Run detection, token round-trip, key rotation and cleanup checks in one process
    Test,
}

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Validate the rules in a policy file
    Validate {
        /// Policy file (JSON or TOML)
        file: PathBuf,
    },
}
