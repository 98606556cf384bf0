use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pair_signal_bot::bot::TradingBot;
use pair_signal_bot::config::{load_config, Config, ConfigFormat};
use pair_signal_bot::exchange::{Exchange, PaperExchange};
use pair_signal_bot::types::Pair;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "bot", version, about = "Single-pair signal bot on a paper venue")]
struct Args {
    /// Path to configuration file (TOML or YAML). Built-in sample settings when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ConfigFormat::Auto)]
    config_format: ConfigFormat,

    /// Override the configured strategy (MACD, RSI, BOLLINGER, SUPPORT_RESISTANCE).
    #[arg(long, env = "BOT_STRATEGY")]
    strategy: Option<String>,

    /// Stop after this many cycles.
    #[arg(long)]
    cycles: Option<u64>,

    /// Override the polling interval.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let mut cfg = match &args.config {
        Some(path) => load_config(path, args.config_format)?,
        None => Config::sample(),
    };
    if let Some(name) = args.strategy {
        cfg.strategy.name = name;
    }
    if let Some(cycles) = args.cycles {
        cfg.bot.max_cycles = Some(cycles);
    }
    if let Some(ms) = args.interval_ms {
        cfg.bot.check_interval_ms = ms;
    }
    cfg.validate()?;

    let exchange: Arc<dyn Exchange> = Arc::new(PaperExchange::new(
        Pair(cfg.bot.pair.clone()),
        cfg.risk.initial_capital,
        cfg.paper.clone(),
    ));
    let mut bot = TradingBot::from_config(&cfg, exchange);
    info!(pair = %cfg.bot.pair, strategy = %cfg.strategy.name, "trading bot starting");

    let summary = bot.run(shutdown_signal()).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
