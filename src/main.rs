use btcbot::advisor::{AdvisoryGateway, AnthropicClient, RetryPolicy};
use btcbot::alert::{AlertSink, LogAlerter, TelegramAlerter};
use btcbot::api::UpbitClient;
use btcbot::config::Config;
use btcbot::cycle::TradingCycle;
use btcbot::db::{PostgresStore, Store};
use btcbot::execution::PaperExecutor;
use btcbot::models::Portfolio;
use btcbot::strategy::{MovingAverageCrossover, RsiThreshold, Strategy};
use btcbot::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::time::{interval_at, Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "btcbot", about = "LLM-advised KRW-BTC trading bot")]
struct Args {
    /// Run a single trading cycle and exit
    #[arg(long)]
    once: bool,

    /// Override the configured market, e.g. KRW-ETH
    #[arg(long)]
    market: Option<String>,

    /// Override the configured cycle interval
    #[arg(long)]
    interval_minutes: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(market) = args.market {
        config.market = market;
    }
    if let Some(minutes) = args.interval_minutes {
        if minutes == 0 {
            return Err("interval must be at least 1 minute".into());
        }
        config.interval_minutes = minutes;
    }

    tracing::info!("🚀 BtcBot starting");
    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Market: {}", config.market);
    tracing::info!("  Cycle interval: {} min", config.interval_minutes);
    tracing::info!("  Max position size: {}%", config.max_position_size * 100.0);
    tracing::info!("  Stop loss: {}%", config.stop_loss_pct * 100.0);
    tracing::info!("  Initial balance: {:.0} KRW (paper)", config.initial_quote_balance);

    let store = Arc::new(connect_store(&config).await);

    let feed = UpbitClient::new(
        config.market.clone(),
        config.daily_candle_count,
        config.hourly_candle_count,
    )?;

    let backend = AnthropicClient::new(
        config.anthropic_api_key.clone(),
        config.advisory_model.clone(),
        Duration::from_secs(config.advisory_timeout_secs),
    );
    let gateway = AdvisoryGateway::new(
        backend,
        store.clone(),
        RetryPolicy {
            max_attempts: config.advisory_max_attempts,
            delay: Duration::from_secs(config.advisory_retry_delay_secs),
        },
        chrono::Duration::minutes(config.fallback_freshness_minutes),
    );

    let strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(MovingAverageCrossover::default()),
        Box::new(RsiThreshold::default()),
    ];

    let executor = PaperExecutor::new(Portfolio {
        quote_balance: config.initial_quote_balance,
        base_balance: 0.0,
        base_avg_buy_price: 0.0,
    });

    let alerter = create_alerter(&config);

    let cycle = TradingCycle::new(
        feed,
        gateway,
        strategies,
        config.risk_limits(),
        executor,
        store,
        alerter,
    );

    if args.once {
        let outcome = cycle.run_once().await;
        tracing::info!("Cycle finished in state {}", outcome.state);
        return Ok(());
    }

    // First cycle runs immediately; a tick that arrives while a cycle is
    // still in flight is skipped, never queued
    let mut ticker = interval_at(
        Instant::now(),
        Duration::from_secs(config.interval_minutes * 60),
    );
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!("\nPress Ctrl+C to stop...\n");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = cycle.run_once().await;
                tracing::info!("Cycle finished in state {}", outcome.state);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    tracing::info!("👋 BtcBot stopped");
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "btcbot=info".into()),
        )
        .init();
}

/// Postgres when reachable, in-memory otherwise
async fn connect_store(config: &Config) -> Store {
    let Some(url) = &config.database_url else {
        tracing::info!("DATABASE_URL not set, using in-memory store");
        return Store::Memory(Default::default());
    };

    match PostgresStore::new(url).await {
        Ok(store) => {
            tracing::info!("Postgres persistence enabled");
            Store::Postgres(store)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to connect to Postgres ({}), continuing with in-memory store",
                e
            );
            Store::Memory(Default::default())
        }
    }
}

fn create_alerter(config: &Config) -> AlertSink {
    match (&config.telegram_bot_token, &config.telegram_chat_id) {
        (Some(token), Some(chat_id)) => {
            tracing::info!("Telegram alerts enabled");
            AlertSink::Telegram(TelegramAlerter::new(token.clone(), chat_id.clone()))
        }
        _ => AlertSink::Log(LogAlerter),
    }
}
