use anyhow::{ bail, Context, Result };
use dotenv::dotenv;
use serde::{ Deserialize, Serialize };
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

use crate::enums::fee_kind::FeeKind;
use crate::utils::serde_helpers::{ mask_secret, serialize_level, deserialize_level };

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub debug: bool,
    #[serde(serialize_with = "mask_secret")]
    pub api_key: String,
    #[serde(serialize_with = "mask_secret")]
    pub secret_key: String,
    pub rest_url: String,
    pub ws_url: String,

    pub base_assets: Vec<String>,
    /// crypto asset -> quote assets it may trade against; empty means no filter
    pub universe: BTreeMap<String, Vec<String>>,
    pub min_profit: f64,
    pub fee: f64,
    pub fee_kind: FeeKind,
    pub max_triangles: usize,
    pub trade_amount: f64,
    pub cooldown_secs: u64,

    pub reconnect_max_attempts: u32,
    pub reconnect_delay_ms: u64,
    pub keepalive_secs: u64,
    pub paper_trading: bool,

    pub spread: SpreadConfig,
    pub opportunities: OpportunityConfig,

    #[serde(serialize_with = "serialize_level", deserialize_with = "deserialize_level")]
    pub log_level: Level,
    pub log_config: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadConfig {
    pub enabled: bool,
    pub quote: String,
    pub peers: Vec<String>,
    pub conversion: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityConfig {
    pub file: PathBuf,
    pub batch: usize,
    pub flush_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub directory: PathBuf,
    pub filename_prefix: String,
    pub rotation: LogRotation,
    pub max_files: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // A missing .env is fine, the variables may come from the environment itself
        match dotenv() {
            Ok(path) => {
                println!("✅ Loaded .env file from: {}", path.display());
            }
            Err(e) => {
                println!("⚠️  Could not load .env file: {}", e);
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self> where F: Fn(&str) -> Option<String> {
        let var = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let debug = parse(&var("TAA_DEBUG", "false"), "TAA_DEBUG")?;

        let api_key = lookup("TAA_API_KEY").context("TAA_API_KEY environment variable not set")?;
        let secret_key = lookup("TAA_SECRET_KEY").context(
            "TAA_SECRET_KEY environment variable not set"
        )?;

        let rest_url = var("TAA_REST_URL", "https://api.binance.com");
        let ws_url = var("TAA_WS_URL", "wss://stream.binance.com:9443");

        let base_assets = split_list(&var("TAA_BASE_ASSETS", "USDT"), ',');
        if base_assets.is_empty() {
            bail!("TAA_BASE_ASSETS must name at least one asset");
        }

        let universe = parse_universe(&var("TAA_UNIVERSE", ""))?;

        let min_profit: f64 = parse(&var("TAA_MIN_PROFIT", "0.001"), "TAA_MIN_PROFIT")?;
        let fee: f64 = parse(&var("TAA_FEE", "0.001"), "TAA_FEE")?;
        if !(0.0..1.0).contains(&fee) {
            bail!("TAA_FEE must be within [0, 1), got {}", fee);
        }

        let fee_kind = FeeKind::from_str(&var("TAA_FEE_KIND", "taker")).context(
            "Failed to parse TAA_FEE_KIND environment variable (maker|taker)"
        )?;

        let max_triangles = parse(&var("TAA_MAX_TRIANGLES", "1000"), "TAA_MAX_TRIANGLES")?;
        let trade_amount: f64 = parse(&var("TAA_TRADE_AMOUNT", "0"), "TAA_TRADE_AMOUNT")?;
        let cooldown_secs = parse(&var("TAA_COOLDOWN_SECS", "5"), "TAA_COOLDOWN_SECS")?;

        let reconnect_max_attempts = parse(
            &var("TAA_RECONNECT_MAX_ATTEMPTS", "5"),
            "TAA_RECONNECT_MAX_ATTEMPTS"
        )?;
        let reconnect_delay_ms = parse(
            &var("TAA_RECONNECT_DELAY_MS", "1000"),
            "TAA_RECONNECT_DELAY_MS"
        )?;
        let keepalive_secs: u64 = parse(&var("TAA_KEEPALIVE_SECS", "1800"), "TAA_KEEPALIVE_SECS")?;
        if keepalive_secs == 0 {
            bail!("TAA_KEEPALIVE_SECS must be at least 1");
        }
        let paper_trading = parse(&var("TAA_PAPER_TRADING", "true"), "TAA_PAPER_TRADING")?;

        let spread = SpreadConfig {
            enabled: parse(&var("TAA_SPREAD_ENABLED", "true"), "TAA_SPREAD_ENABLED")?,
            quote: var("TAA_SPREAD_QUOTE", "USDT"),
            peers: split_list(&var("TAA_SPREAD_PEERS", "USDC"), ','),
            conversion: parse(&var("TAA_SPREAD_CONVERSION", "1.0"), "TAA_SPREAD_CONVERSION")?,
            threshold: parse(&var("TAA_SPREAD_THRESHOLD", "1.001"), "TAA_SPREAD_THRESHOLD")?,
        };

        let opportunities = OpportunityConfig {
            file: PathBuf::from(var("TAA_OPPORTUNITY_FILE", "opportunities.jsonl")),
            batch: parse(&var("TAA_OPPORTUNITY_BATCH", "50"), "TAA_OPPORTUNITY_BATCH")?,
            flush_secs: parse(
                &var("TAA_OPPORTUNITY_FLUSH_SECS", "5"),
                "TAA_OPPORTUNITY_FLUSH_SECS"
            )?,
        };

        let log_level = match var("TAA_LOG_LEVEL", "info").to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let rotation = match var("TAA_LOG_ROTATION", "daily").to_lowercase().as_str() {
            "hourly" => LogRotation::Hourly,
            "never" => LogRotation::Never,
            _ => LogRotation::Daily,
        };

        let log_config = LogConfig {
            directory: PathBuf::from(var("TAA_LOG_DIRECTORY", "logs")),
            filename_prefix: var("TAA_LOG_FILENAME_PREFIX", "triangular_arbitrage"),
            rotation,
            max_files: lookup("TAA_LOG_MAX_FILES").and_then(|s| s.parse::<usize>().ok()),
        };

        Ok(Config {
            debug,
            api_key,
            secret_key,
            rest_url,
            ws_url,
            base_assets,
            universe,
            min_profit,
            fee,
            fee_kind,
            max_triangles,
            trade_amount,
            cooldown_secs,
            reconnect_max_attempts,
            reconnect_delay_ms,
            keepalive_secs,
            paper_trading,
            spread,
            opportunities,
            log_level,
            log_config,
        })
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}

fn parse<T>(value: &str, key: &str) -> Result<T>
    where T: FromStr, T::Err: std::error::Error + Send + Sync + 'static
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("Failed to parse {} environment variable: {:?}", key, value))
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `BTC:USDT|USDC;ETH:USDT`
fn parse_universe(value: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let mut universe = BTreeMap::new();

    for entry in value.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (crypto, quotes) = entry
            .split_once(':')
            .with_context(|| format!("TAA_UNIVERSE entry {:?} is not CRYPTO:QUOTE|QUOTE", entry))?;

        let crypto = crypto.trim().to_uppercase();
        let quotes = split_list(quotes, '|');
        if crypto.is_empty() || quotes.is_empty() {
            bail!("TAA_UNIVERSE entry {:?} is missing its asset or quotes", entry);
        }

        universe.insert(crypto, quotes);
    }

    Ok(universe)
}
