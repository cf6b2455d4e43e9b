#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `ridewatch`: run the subway detector against simulated sensors, score
//! recorded motion traces, and check configurations.

mod analyze;
mod cli;
mod error_fmt;
mod logging;
mod monitor;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::monitor::MonitorArgs;

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn load_config(path: Option<&Path>) -> eyre::Result<ridewatch_config::Config> {
    let Some(path) = path else {
        return Ok(ridewatch_config::Config::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    ridewatch_config::load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    cfg.validate().wrap_err("invalid configuration")?;
    logging::init(&cli.log_level, cli.json, &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    match cli.cmd {
        Commands::Monitor {
            scenario,
            duration_ms,
            motion_csv,
            state_file,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("install Ctrl-C handler")?;
            let args = MonitorArgs {
                scenario: scenario.into(),
                duration_ms,
                motion_csv,
                state_file,
            };
            monitor::run_monitor(&cfg, &args, cli.json, &shutdown)
        }
        Commands::Analyze { motion_csv } => analyze::run_analyze(&cfg, &motion_csv, cli.json),
        Commands::SelfCheck => monitor::self_check(&cfg, cli.json),
    }
}
