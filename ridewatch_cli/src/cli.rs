//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use ridewatch_sim::Scenario;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "ridewatch", version, about = "Subway ride detection")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print states, summaries and errors as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG takes precedence
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Simulated ride to monitor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ScenarioArg {
    /// Phone resting on a desk
    Stationary,
    /// Walking down the street
    Walking,
    /// Riding an underground train
    Subway,
}

impl From<ScenarioArg> for Scenario {
    fn from(s: ScenarioArg) -> Self {
        match s {
            ScenarioArg::Stationary => Scenario::Stationary,
            ScenarioArg::Walking => Scenario::Walking,
            ScenarioArg::Subway => Scenario::Subway,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the detector against simulated sensors and print every published state
    Monitor {
        /// Scenario driving the simulated positioning, Wi-Fi and (unless --motion-csv) motion
        #[arg(long, value_enum, default_value = "subway")]
        scenario: ScenarioArg,
        /// Stop after this many milliseconds (runs until Ctrl-C when omitted)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Replay a recorded motion trace (strict header kind,x,y,z) in a loop
        #[arg(long, value_name = "FILE")]
        motion_csv: Option<PathBuf>,
        /// Mirror the latest state to this file (JSON, replaced atomically)
        #[arg(long, value_name = "FILE")]
        state_file: Option<PathBuf>,
    },
    /// Score a recorded motion trace offline, window by window
    Analyze {
        /// Motion trace CSV (strict header kind,x,y,z)
        #[arg(long, value_name = "FILE")]
        motion_csv: PathBuf,
    },
    /// Validate the configuration and the detector wiring
    SelfCheck,
}
