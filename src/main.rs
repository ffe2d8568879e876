// for the quick data allocation on memory
#[global_allocator]
static ALLOC: rpmalloc::RpMalloc = rpmalloc::RpMalloc;

mod app;
mod arbitrage;
mod config;
mod enums;
mod exchange;
mod executor;
mod helpers;
mod market;
mod models;
mod monitor;
mod utils;

#[cfg(test)]
mod testkit;

use std::time::Duration;

use config::Config;
use anyhow::{ Context, Result };

use utils::logging;

const API_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
enum Command {
    Run,
    Scan,
}

fn main() -> Result<()> {
    let command = match std::env::args().nth(1).as_deref() {
        Some("scan") => Command::Scan,
        _ => Command::Run,
    };

    let config = Config::from_env().context(
        "Failed to load configuration from environment. Make sure you have a .env file with required variables."
    )?;

    // held until exit so buffered log lines are flushed
    let _log_guards = logging
        ::init_logging(config.log_level, config.debug, &config.log_config)
        .context("Failed to initialize logging system")?;

    match command {
        Command::Run => app::normal_mode::run_normal_mode(config)?,
        Command::Scan => app::scan_mode::run_scan(config)?,
    }

    Ok(())
}
