use crate::errors::{EngineError, EngineResult};
use crate::types::{BlendWeights, ValidationPolicy, Verdict};

/// Expiry horizon this system trades. Contracts outside it are rejected.
pub const MIN_EXPIRY_DAYS: u32 = 7;
pub const MAX_EXPIRY_DAYS: u32 = 45;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub watchlist: Vec<String>,
    pub data_api_key: String,
    pub data_api_base_url: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    /// Seconds between full scan rounds.
    pub scan_interval_secs: u64,
    /// Seconds between consecutive symbols (data-provider rate limit).
    pub symbol_pause_secs: u64,
    /// Daily closes requested from the provider.
    pub history_days: u32,
    pub days_to_expiry: u32,
    /// Strike distance from spot, in percent (4.0 = 4% OTM).
    pub strike_offset_pct: f64,
    pub num_paths: u32,
    pub risk_free_rate: f64,
    /// Fixed Monte Carlo seed for reproducible runs. None = OS entropy.
    pub mc_seed: Option<u64>,
    pub weights: BlendWeights,
    pub validation: ValidationPolicy,
    /// Lowest verdict that still produces an alert.
    pub alert_floor: Verdict,
    /// Capital assumed by position sizing, in dollars.
    pub capital_allocated: f64,
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();

        let watchlist: Vec<String> = env_var_or("WATCHLIST", "SPY,QQQ,AAPL,MSFT,NVDA")
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if watchlist.is_empty() {
            return Err(EngineError::Config("WATCHLIST is empty".into()));
        }

        let scan_interval_secs = parse_var("SCAN_INTERVAL_SECS", "900")?;
        let symbol_pause_secs = parse_var("SYMBOL_PAUSE_SECS", "3")?;
        let history_days = parse_var("HISTORY_DAYS", "252")?;
        let days_to_expiry: u32 = parse_var("DAYS_TO_EXPIRY", "14")?;
        let strike_offset_pct: f64 = parse_var("STRIKE_OFFSET_PCT", "4.0")?;
        let num_paths: u32 = parse_var("NUM_PATHS", "10000")?;
        let risk_free_rate: f64 = parse_var("RISK_FREE_RATE", "0.045")?;
        let capital_allocated: f64 = parse_var("CAPITAL_ALLOCATED", "1000")?;

        let mc_seed = match std::env::var("MC_SEED") {
            Ok(v) => Some(
                v.parse::<u64>()
                    .map_err(|e| EngineError::Config(format!("MC_SEED: {e}")))?,
            ),
            Err(_) => None,
        };

        let weights = BlendWeights {
            monte_carlo: parse_var("WEIGHT_MONTE_CARLO", "0.4")?,
            historical: parse_var("WEIGHT_HISTORICAL", "0.3")?,
            technical: parse_var("WEIGHT_TECHNICAL", "0.3")?,
        };
        if (weights.sum() - 1.0).abs() > 1e-6 {
            return Err(EngineError::Config(format!(
                "blend weights must sum to 1.0, got {}",
                weights.sum()
            )));
        }

        let validation = match env_var_or("VALIDATION_MODE", "strict").as_str() {
            "strict" => ValidationPolicy::Strict,
            "permissive" => ValidationPolicy::Permissive,
            other => {
                return Err(EngineError::Config(format!(
                    "VALIDATION_MODE must be strict|permissive, got {other}"
                )))
            }
        };

        let alert_floor = match env_var_or("ALERT_FLOOR", "weak_buy").as_str() {
            "strong_buy" => Verdict::StrongBuy,
            "buy" => Verdict::Buy,
            "weak_buy" => Verdict::WeakBuy,
            "watch" => Verdict::Watch,
            other => {
                return Err(EngineError::Config(format!(
                    "ALERT_FLOOR must be strong_buy|buy|weak_buy|watch, got {other}"
                )))
            }
        };

        if !(MIN_EXPIRY_DAYS..=MAX_EXPIRY_DAYS).contains(&days_to_expiry) {
            return Err(EngineError::Config(format!(
                "DAYS_TO_EXPIRY {days_to_expiry} outside horizon {MIN_EXPIRY_DAYS}-{MAX_EXPIRY_DAYS}"
            )));
        }
        if num_paths == 0 {
            return Err(EngineError::Config("NUM_PATHS must be positive".into()));
        }

        Ok(Self {
            watchlist,
            data_api_key: env_var("DATA_API_KEY")?,
            data_api_base_url: env_var_or("DATA_API_BASE_URL", "https://api.marketdata.app/v1"),
            telegram_bot_token: env_var("TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: env_var("TELEGRAM_CHAT_ID")?,
            scan_interval_secs,
            symbol_pause_secs,
            history_days,
            days_to_expiry,
            strike_offset_pct,
            num_paths,
            risk_free_rate,
            mc_seed,
            weights,
            validation,
            alert_floor,
            capital_allocated,
        })
    }
}

fn env_var(key: &str) -> EngineResult<String> {
    std::env::var(key).map_err(|_| EngineError::Config(format!("missing env var: {key}")))
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: &str) -> EngineResult<T>
where
    T::Err: std::fmt::Display,
{
    env_var_or(key, default)
        .parse::<T>()
        .map_err(|e| EngineError::Config(format!("{key}: {e}")))
}
