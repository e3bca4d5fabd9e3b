use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::sequence::manager::SequencerConfig;
use crate::sequence::settings::Settings;
use crate::transport::message::TransportConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "ace-recorder",
    version,
    about = "Record, edit and compact replayable browser test steps"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Producer build tag accepted on inbound events
    #[arg(long, global = true)]
    pub build_tag: Option<String>,

    /// Path to config file (default: ace-recorder.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record an NDJSON stream of captured events into a test case
    Ingest {
        /// NDJSON file with one inbound event message per line
        #[arg(long)]
        input: String,

        /// Test case title (also the file name)
        #[arg(long)]
        title: String,

        /// Output directory (default: save_dir from config)
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Print the steps of a test case
    Show {
        #[arg(long)]
        file: String,
    },

    /// Renumber a test case's steps to 1..N and save it in place
    Compact {
        #[arg(long)]
        file: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `ace-recorder.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_sleep_ms")]
    pub default_sleep_ms: u64,

    #[serde(default = "default_save_dir")]
    pub save_dir: String,

    /// JSONL session journal
    pub journal: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            port: default_port(),
            default_sleep_ms: default_sleep_ms(),
            save_dir: default_save_dir(),
            journal: None,
        }
    }
}

// Serde default helpers
fn default_version() -> String { "1.0.0".to_string() }
fn default_port() -> u16 { 9910 }
fn default_sleep_ms() -> u64 { 1000 }
fn default_save_dir() -> String { ".".to_string() }

impl RecorderConfig {
    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            transport: TransportConfig {
                version: self.version.clone(),
                port: self.port,
            },
            settings: Settings {
                default_sleep_ms: self.default_sleep_ms,
                ..Settings::default()
            },
            journal: self.journal.as_ref().map(PathBuf::from),
        }
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> RecorderConfig {
    let config_path = path.unwrap_or("ace-recorder.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring malformed config '{}': {}", config_path, e);
            RecorderConfig::default()
        }),
        Err(_) => RecorderConfig::default(),
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides the verbosity count.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
