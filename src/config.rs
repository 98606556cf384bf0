use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

use crate::exchange::PaperConfig;
use crate::indicators::StandardIndicators;
use crate::risk::RiskConfig;
use crate::strategy::StrategyKind;

/// Bot config file syntax; `Auto` picks by extension and falls back to TOML.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ConfigFormat {
    Auto,
    Toml,
    Yaml,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read bot config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bot config is not valid {format:?}: {details}")]
    Parse {
        format: ConfigFormat,
        details: String,
    },
    /// A `[bot]`, `[risk]`, `[strategy]` or `[paper]` value is out of range.
    #[error("bad bot config value: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub bot: BotSection,
    pub risk: RiskSection,
    pub strategy: StrategySection,
    #[serde(default)]
    pub indicators: StandardIndicators,
    #[serde(default)]
    pub paper: PaperConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BotSection {
    pub pair: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_candle_limit")]
    pub candle_limit: usize,
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Stop after this many cycles; run until shutdown when absent.
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RiskSection {
    pub initial_capital: f64,
    pub risk_per_trade: f64,
    pub max_daily_loss: f64,
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,
    /// Upper bound on order size in base units.
    pub max_position_size: f64,
    #[serde(default = "default_true")]
    pub halt_on_daily_loss: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct StrategySection {
    /// Kept as text so an unknown name is a warning at startup, not a parse failure.
    pub name: String,
}

fn default_timeframe() -> String {
    "1h".to_string()
}

const fn default_candle_limit() -> usize {
    100
}

const fn default_check_interval_ms() -> u64 {
    60_000
}

const fn default_stop_loss_pct() -> f64 {
    5.0
}

const fn default_true() -> bool {
    true
}

impl BotSection {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

impl RiskSection {
    pub fn risk_config(&self) -> RiskConfig {
        RiskConfig {
            risk_per_trade: self.risk_per_trade,
            max_daily_loss: self.max_daily_loss,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.pair.trim().is_empty() {
            return Err(ConfigError::Validation("bot.pair must not be empty".into()));
        }
        if self.bot.candle_limit < 2 {
            return Err(ConfigError::Validation(
                "bot.candle-limit must be at least 2".into(),
            ));
        }
        if self.bot.check_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "bot.check-interval-ms must be greater than zero".into(),
            ));
        }
        if !(self.risk.initial_capital.is_finite() && self.risk.initial_capital > 0.0) {
            return Err(ConfigError::Validation(
                "risk.initial-capital must be positive".into(),
            ));
        }
        self.risk
            .risk_config()
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if !(self.risk.stop_loss_pct.is_finite() && self.risk.stop_loss_pct > 0.0 && self.risk.stop_loss_pct < 100.0) {
            return Err(ConfigError::Validation(
                "risk.stop-loss-pct must be in (0, 100)".into(),
            ));
        }
        if !(self.risk.max_position_size.is_finite() && self.risk.max_position_size > 0.0) {
            return Err(ConfigError::Validation(
                "risk.max-position-size must be positive".into(),
            ));
        }
        self.paper
            .validate()
            .map_err(|err| ConfigError::Validation(format!("paper: {err}")))?;
        Ok(())
    }

    pub fn sample() -> Self {
        Self {
            bot: BotSection {
                pair: "BTC/USDT".into(),
                timeframe: default_timeframe(),
                candle_limit: default_candle_limit(),
                check_interval_ms: default_check_interval_ms(),
                max_cycles: None,
            },
            risk: RiskSection {
                initial_capital: 10_000.0,
                risk_per_trade: 1.0,
                max_daily_loss: 500.0,
                stop_loss_pct: default_stop_loss_pct(),
                max_position_size: 0.1,
                halt_on_daily_loss: true,
            },
            strategy: StrategySection {
                name: StrategyKind::Macd.to_string(),
            },
            indicators: StandardIndicators::default(),
            paper: PaperConfig::default(),
        }
    }
}

pub fn load_config(path: &Path, format: ConfigFormat) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, resolve_format(path, format))
}

pub fn parse_config(contents: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        ConfigFormat::Toml | ConfigFormat::Auto => toml::from_str(contents).map_err(|err| ConfigError::Parse {
            format: ConfigFormat::Toml,
            details: err.to_string(),
        }),
        ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|err| ConfigError::Parse {
            format,
            details: err.to_string(),
        }),
    }?;
    config.validate()?;
    Ok(config)
}

fn resolve_format(path: &Path, format: ConfigFormat) -> ConfigFormat {
    if format != ConfigFormat::Auto {
        return format;
    }
    match path.extension().and_then(OsStr::to_str) {
        Some("yaml" | "yml") => ConfigFormat::Yaml,
        _ => ConfigFormat::Toml,
    }
}
