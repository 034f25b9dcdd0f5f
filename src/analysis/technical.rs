/// Technical probability that a strike level holds, from two observables:
/// how often recent closes respected the level, and the current RSI regime.

/// Closes inspected for the support/resistance hold rate.
const HOLD_WINDOW: usize = 50;
const RSI_PERIOD: usize = 14;
/// Mean-loss floor that guards the RSI ratio against division by zero.
const LOSS_FLOOR: f64 = 0.01;

/// Score in [5, 95]. A strike below spot is treated as support (share of
/// recent closes above it), a strike above spot as resistance. Oversold RSI
/// nudges support-holds up and resistance-holds down; overbought mirrors.
/// Returns neutral 50 when there is no history to score.
pub fn technical_probability(closes: &[f64], current_price: f64, strike: f64) -> f64 {
    if closes.is_empty() {
        return 50.0;
    }

    let start = closes.len().saturating_sub(HOLD_WINDOW);
    let recent = &closes[start..];

    let is_support = strike < current_price;
    let held = recent
        .iter()
        .filter(|c| if is_support { **c > strike } else { **c < strike })
        .count();
    let hold_rate = held as f64 / recent.len() as f64 * 100.0;

    let adjustment = match rsi(closes, RSI_PERIOD) {
        Some(rsi) if rsi < 30.0 => {
            // Oversold leans bullish
            if is_support {
                1.1
            } else {
                0.9
            }
        }
        Some(rsi) if rsi > 70.0 => {
            if is_support {
                0.9
            } else {
                1.1
            }
        }
        _ => 1.0,
    };

    (hold_rate * adjustment).clamp(5.0, 95.0)
}

/// Plain-average RSI over the trailing `period` price changes.
/// None when the series is too short to produce one.
fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period + 1 {
        return None;
    }

    let diffs: Vec<f64> = closes[closes.len() - period - 1..]
        .windows(2)
        .map(|w| w[1] - w[0])
        .collect();

    let avg_gain = diffs.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let avg_loss = -diffs.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;
    let avg_loss = if avg_loss > 0.0 { avg_loss } else { LOSS_FLOOR };

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_is_neutral() {
        assert_eq!(technical_probability(&[], 100.0, 96.0), 50.0);
    }

    #[test]
    fn test_support_always_held_scores_high() {
        // Mild oscillation well above the strike, RSI in the neutral band
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let p = technical_probability(&closes, 100.0, 90.0);
        assert!(p >= 90.0, "untouched support should score high: {p}");
    }

    #[test]
    fn test_broken_support_scores_low() {
        // Every close sits below the candidate strike
        let closes: Vec<f64> = (0..60).map(|i| 80.0 + (i % 3) as f64).collect();
        let p = technical_probability(&closes, 100.0, 95.0);
        assert_eq!(p, 5.0, "fully broken support should clamp to the floor");
    }

    #[test]
    fn test_resistance_side_mirrors() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let p = technical_probability(&closes, 100.0, 110.0);
        assert!(p >= 90.0, "untouched resistance should score high: {p}");
    }

    #[test]
    fn test_score_stays_in_bounds() {
        let rally: Vec<f64> = (0..60).map(|i| 100.0 + f64::from(i)).collect();
        for strike in [50.0, 100.0, 120.0, 200.0] {
            let p = technical_probability(&rally, 159.0, strike);
            assert!((5.0..=95.0).contains(&p), "score out of bounds for {strike}: {p}");
        }
    }

    #[test]
    fn test_rsi_needs_enough_closes() {
        assert!(rsi(&[100.0; 10], 14).is_none());
        assert!(rsi(&[100.0; 15], 14).is_some());
    }

    #[test]
    fn test_rsi_extremes() {
        // 14 straight up days: no losses, RSI pegged high by the loss floor
        let up: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i)).collect();
        let r = rsi(&up, 14).unwrap();
        assert!(r > 70.0, "straight rally should be overbought: {r}");

        let down: Vec<f64> = (0..20).map(|i| 100.0 - f64::from(i)).collect();
        let r = rsi(&down, 14).unwrap();
        assert!(r < 30.0, "straight slide should be oversold: {r}");
    }
}
