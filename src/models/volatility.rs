use crate::errors::{EngineError, EngineResult};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Daily percent returns from a close series, oldest first.
/// Non-finite inputs are skipped rather than propagated.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter_map(|w| {
            let (prev, cur) = (w[0], w[1]);
            if prev > 0.0 && prev.is_finite() && cur.is_finite() {
                let r = cur / prev - 1.0;
                r.is_finite().then_some(r)
            } else {
                None
            }
        })
        .collect()
}

/// Annualized close-to-close realized volatility: sample standard deviation
/// of daily percent returns scaled by sqrt(252).
///
/// Needs at least two returns (three closes); fewer is an insufficient-data
/// condition the caller decides how to handle.
pub fn realized_volatility(closes: &[f64]) -> EngineResult<f64> {
    let returns = daily_returns(closes);
    if returns.len() < 2 {
        return Err(EngineError::InvalidInput(format!(
            "need at least 3 closes for realized volatility, got {}",
            closes.len()
        )));
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / (n - 1.0);

    Ok(var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_series_zero_vol() {
        let closes = [100.0; 30];
        let vol = realized_volatility(&closes).unwrap();
        assert!(vol.abs() < 1e-12, "flat series should have zero vol: {vol}");
    }

    #[test]
    fn test_insufficient_closes_rejected() {
        assert!(realized_volatility(&[100.0, 101.0]).is_err());
        assert!(realized_volatility(&[]).is_err());
    }

    #[test]
    fn test_alternating_series_matches_hand_calc() {
        // Returns alternate +1% / ~-0.99%; sample std is computable by hand.
        let closes = [100.0, 101.0, 100.0, 101.0, 100.0];
        let returns = daily_returns(&closes);
        assert_eq!(returns.len(), 4);

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let var = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / (n - 1.0);
        let expected = var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();

        let vol = realized_volatility(&closes).unwrap();
        assert!((vol - expected).abs() < 1e-12);
        assert!(vol > 0.1, "1% daily swings should annualize well above 10%: {vol}");
    }

    #[test]
    fn test_non_finite_closes_skipped() {
        let closes = [100.0, f64::NAN, 101.0, 100.0, 101.0, 100.0];
        // NaN breaks two windows; the remaining returns still work.
        let returns = daily_returns(&closes);
        assert_eq!(returns.len(), 3);
    }
}
