use crate::alerts::telegram::TelegramDispatcher;
use crate::analysis::SignalPipeline;
use crate::config::AppConfig;
use crate::data::MarketDataProvider;
use crate::db::AlertStore;
use crate::errors::EngineResult;
use portable_atomic::{AtomicU64, Ordering};

/// Lock-free scan counters, logged after every round.
pub struct ScanCounters {
    pub symbols_scanned: AtomicU64,
    pub alerts_sent: AtomicU64,
    pub alerts_suppressed: AtomicU64,
    pub no_opportunity: AtomicU64,
    pub errors_recovered: AtomicU64,
}

impl ScanCounters {
    pub fn new() -> Self {
        Self {
            symbols_scanned: AtomicU64::new(0),
            alerts_sent: AtomicU64::new(0),
            alerts_suppressed: AtomicU64::new(0),
            no_opportunity: AtomicU64::new(0),
            errors_recovered: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanOutcome {
    AlertSent,
    Deduplicated,
    NoOpportunity,
}

/// Walk the watchlist forever: fetch, analyze, gate, dedup, dispatch.
///
/// Each symbol is handled sequentially with a pause between requests; a
/// failure on one symbol is logged and never aborts the round. The data
/// provider's rate limit is the binding constraint, so there is nothing to
/// gain from parallelism here.
pub async fn run_scanner<P: MarketDataProvider>(
    config: AppConfig,
    provider: P,
    pipeline: SignalPipeline,
    store: AlertStore,
    dispatcher: TelegramDispatcher,
) {
    tracing::info!(
        watchlist = config.watchlist.len(),
        interval_secs = config.scan_interval_secs,
        "scanner started"
    );

    let counters = ScanCounters::new();

    loop {
        let today = chrono::Utc::now().date_naive();
        match store.prune(today) {
            Ok(removed) if removed > 0 => {
                tracing::debug!(removed, "pruned stale alert records")
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "alert store prune failed"),
        }

        for symbol in &config.watchlist {
            counters.symbols_scanned.fetch_add(1, Ordering::Relaxed);

            match scan_symbol(symbol, &config, &provider, &pipeline, &store, &dispatcher).await {
                Ok(ScanOutcome::AlertSent) => {
                    counters.alerts_sent.fetch_add(1, Ordering::Relaxed);
                }
                Ok(ScanOutcome::Deduplicated) => {
                    counters.alerts_suppressed.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(symbol, "already alerted, suppressed");
                }
                Ok(ScanOutcome::NoOpportunity) => {
                    counters.no_opportunity.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    counters.errors_recovered.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(symbol, error = %e, "symbol scan failed, continuing");
                }
            }

            tokio::time::sleep(std::time::Duration::from_secs(config.symbol_pause_secs)).await;
        }

        tracing::info!(
            scanned = counters.symbols_scanned.load(Ordering::Relaxed),
            sent = counters.alerts_sent.load(Ordering::Relaxed),
            suppressed = counters.alerts_suppressed.load(Ordering::Relaxed),
            quiet = counters.no_opportunity.load(Ordering::Relaxed),
            errors = counters.errors_recovered.load(Ordering::Relaxed),
            "scan round complete"
        );

        tokio::time::sleep(std::time::Duration::from_secs(config.scan_interval_secs)).await;
    }
}

async fn scan_symbol<P: MarketDataProvider>(
    symbol: &str,
    config: &AppConfig,
    provider: &P,
    pipeline: &SignalPipeline,
    store: &AlertStore,
    dispatcher: &TelegramDispatcher,
) -> EngineResult<ScanOutcome> {
    let snapshot = provider.fetch_snapshot(symbol).await?;
    let signal = pipeline.analyze(&snapshot)?;

    if signal.verdict < config.alert_floor {
        // A quiet symbol is a normal outcome, not an error.
        tracing::debug!(
            symbol,
            verdict = %signal.verdict,
            probability = signal.score.final_probability,
            "below alert floor"
        );
        return Ok(ScanOutcome::NoOpportunity);
    }

    let fingerprint = AlertStore::fingerprint(
        &signal.symbol,
        &signal.recommendation.strategy.option_kind().to_string(),
        signal.recommendation.strike,
        &signal.recommendation.expiry_date.to_string(),
    );

    if store.already_sent(&signal.symbol, signal.as_of.date_naive(), &fingerprint)? {
        return Ok(ScanOutcome::Deduplicated);
    }

    dispatcher.send(&signal).await?;
    store.record(&signal, &fingerprint)?;

    tracing::info!(
        symbol,
        strategy = %signal.recommendation.strategy,
        strike = signal.recommendation.strike,
        probability = signal.score.final_probability,
        verdict = %signal.verdict,
        "alert sent"
    );

    Ok(ScanOutcome::AlertSent)
}
