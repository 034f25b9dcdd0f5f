use crate::errors::{EngineError, EngineResult};
use crate::models::greeks::black_scholes_greeks;
use crate::models::volatility::TRADING_DAYS_PER_YEAR;
use crate::types::{OptionKind, ProbabilityEstimate, ValidationPolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{ContinuousCDF, Normal};

/// Substitutes applied in permissive mode.
const DEFAULT_SPOT: f64 = 100.0;
const DEFAULT_SIGMA: f64 = 0.20;
const DEFAULT_DAYS: u32 = 1;

/// Risk-neutral GBM Monte Carlo estimator of the strike-hold probability.
///
/// Terminal price per path: S_T = S0 * exp((r - sigma^2/2)*T + sigma*sqrt(T)*Z)
/// with T = days_to_expiry / 252.
///
/// "Hold" means the strike level survives to expiry: for a put the underlying
/// stays above the strike, for a call it stays below. The long-option
/// finish-in-the-money probability is the complement.
pub struct MonteCarloEngine {
    num_paths: u32,
    risk_free_rate: f64,
    /// Fixed seed makes estimates reproducible; None draws OS entropy per call.
    seed: Option<u64>,
    policy: ValidationPolicy,
}

impl MonteCarloEngine {
    pub fn new(
        num_paths: u32,
        risk_free_rate: f64,
        seed: Option<u64>,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            num_paths: num_paths.max(1),
            risk_free_rate,
            seed,
            policy,
        }
    }

    /// Estimate the hold probability plus Greeks for one contract.
    ///
    /// Strict policy rejects degenerate inputs; Permissive substitutes the
    /// defaults above and logs what it did. Each call is pure given its
    /// inputs and the RNG stream.
    pub fn estimate(
        &self,
        spot: f64,
        sigma: f64,
        days_to_expiry: u32,
        strike: f64,
        kind: OptionKind,
    ) -> EngineResult<ProbabilityEstimate> {
        let (spot, sigma, days_to_expiry, strike) =
            self.checked_inputs(spot, sigma, days_to_expiry, strike)?;

        let t = f64::from(days_to_expiry) / TRADING_DAYS_PER_YEAR;
        let drift = (self.risk_free_rate - 0.5 * sigma * sigma) * t;
        let diffusion = sigma * t.sqrt();

        let mut rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let normal = Normal::standard();

        let n = self.num_paths as u64;
        let mut held: u64 = 0;
        let mut sum = 0.0_f64;
        let mut sum_sq = 0.0_f64;

        for _ in 0..n {
            // Inverse-transform sampling; clamp keeps the quantile finite.
            let u: f64 = rng.random::<f64>().clamp(1e-12, 1.0 - 1e-12);
            let z = normal.inverse_cdf(u);
            let terminal = spot * (drift + diffusion * z).exp();

            let holds = match kind {
                OptionKind::Put => terminal > strike,
                OptionKind::Call => terminal < strike,
            };
            if holds {
                held += 1;
            }
            sum += terminal;
            sum_sq += terminal * terminal;
        }

        let nf = n as f64;
        let p = held as f64 / nf;
        let mean = sum / nf;
        let var = (sum_sq / nf - mean * mean).max(0.0);

        // 95% binomial CI on the estimate itself; width shrinks as 1/sqrt(n).
        let se = (p * (1.0 - p) / nf).sqrt();
        let ci = (
            ((p - 1.96 * se).max(0.0)) * 100.0,
            ((p + 1.96 * se).min(1.0)) * 100.0,
        );

        Ok(ProbabilityEstimate {
            monte_carlo_probability: p * 100.0,
            greeks: black_scholes_greeks(spot, strike, days_to_expiry, sigma, self.risk_free_rate, kind),
            confidence_interval_95: ci,
            mean_terminal_price: mean,
            std_terminal_price: var.sqrt(),
        })
    }

    fn checked_inputs(
        &self,
        spot: f64,
        sigma: f64,
        days_to_expiry: u32,
        strike: f64,
    ) -> EngineResult<(f64, f64, u32, f64)> {
        let spot_ok = spot.is_finite() && spot > 0.0;
        let sigma_ok = sigma.is_finite() && sigma > 0.0;
        let days_ok = days_to_expiry > 0;
        let strike_ok = strike.is_finite() && strike > 0.0;

        if spot_ok && sigma_ok && days_ok && strike_ok {
            return Ok((spot, sigma, days_to_expiry, strike));
        }

        match self.policy {
            ValidationPolicy::Strict => Err(EngineError::InvalidInput(format!(
                "degenerate estimator inputs: spot={spot} sigma={sigma} days={days_to_expiry} strike={strike}"
            ))),
            ValidationPolicy::Permissive => {
                let spot = if spot_ok { spot } else { DEFAULT_SPOT };
                let sigma = if sigma_ok { sigma } else { DEFAULT_SIGMA };
                let days = if days_ok { days_to_expiry } else { DEFAULT_DAYS };
                let strike = if strike_ok { strike } else { spot };
                tracing::warn!(
                    spot,
                    sigma,
                    days,
                    strike,
                    "degenerate estimator inputs substituted (permissive mode)"
                );
                Ok((spot, sigma, days, strike))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::greeks::analytic_hold_probability;

    fn engine(paths: u32, seed: u64) -> MonteCarloEngine {
        MonteCarloEngine::new(paths, 0.045, Some(seed), ValidationPolicy::Strict)
    }

    #[test]
    fn test_probability_within_bounds() {
        let eng = engine(2000, 7);
        for strike in [50.0, 90.0, 100.0, 110.0, 200.0] {
            for kind in [OptionKind::Put, OptionKind::Call] {
                let est = eng.estimate(100.0, 0.25, 30, strike, kind).unwrap();
                assert!(
                    (0.0..=100.0).contains(&est.monte_carlo_probability),
                    "probability out of range for strike {strike}: {}",
                    est.monte_carlo_probability
                );
            }
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let eng = engine(5000, 42);
        let a = eng.estimate(100.0, 0.25, 30, 96.0, OptionKind::Put).unwrap();
        let b = eng.estimate(100.0, 0.25, 30, 96.0, OptionKind::Put).unwrap();
        assert_eq!(a.monte_carlo_probability, b.monte_carlo_probability);
        assert_eq!(a.mean_terminal_price, b.mean_terminal_price);
    }

    #[test]
    fn test_put_and_call_hold_are_complements() {
        // Same seed draws the same paths, so the counts partition exactly.
        let eng = engine(10_000, 11);
        let put = eng.estimate(100.0, 0.25, 30, 96.0, OptionKind::Put).unwrap();
        let call = eng.estimate(100.0, 0.25, 30, 96.0, OptionKind::Call).unwrap();
        assert!(
            (put.monte_carlo_probability + call.monte_carlo_probability - 100.0).abs() < 1e-9,
            "hold probabilities must partition: {} + {}",
            put.monte_carlo_probability,
            call.monte_carlo_probability
        );
    }

    #[test]
    fn test_confidence_interval_tightens_with_paths() {
        let coarse = engine(100, 42)
            .estimate(100.0, 0.25, 30, 96.0, OptionKind::Put)
            .unwrap();
        let fine = engine(100_000, 42)
            .estimate(100.0, 0.25, 30, 96.0, OptionKind::Put)
            .unwrap();

        let coarse_width = coarse.confidence_interval_95.1 - coarse.confidence_interval_95.0;
        let fine_width = fine.confidence_interval_95.1 - fine.confidence_interval_95.0;
        assert!(
            fine_width < coarse_width / 5.0,
            "100k-path CI should be far tighter than 100-path CI: {fine_width} vs {coarse_width}"
        );
    }

    #[test]
    fn test_matches_closed_form_probability() {
        // Cross-check against Phi(d2), not a hardcoded number.
        let eng = engine(50_000, 42);
        let est = eng.estimate(100.0, 0.25, 30, 96.0, OptionKind::Put).unwrap();
        let analytic = analytic_hold_probability(100.0, 96.0, 30, 0.25, 0.045, OptionKind::Put);
        assert!(
            (est.monte_carlo_probability - analytic).abs() < 1.0,
            "MC {} should be within 1pt of closed form {analytic}",
            est.monte_carlo_probability
        );
    }

    #[test]
    fn test_strict_rejects_degenerate_inputs() {
        let eng = engine(1000, 1);
        assert!(eng.estimate(-1.0, 0.25, 30, 96.0, OptionKind::Put).is_err());
        assert!(eng.estimate(100.0, 0.0, 30, 96.0, OptionKind::Put).is_err());
        assert!(eng.estimate(100.0, 0.25, 0, 96.0, OptionKind::Put).is_err());
        assert!(eng.estimate(100.0, 0.25, 30, f64::NAN, OptionKind::Put).is_err());
    }

    #[test]
    fn test_permissive_substitutes_defaults() {
        let eng = MonteCarloEngine::new(1000, 0.045, Some(1), ValidationPolicy::Permissive);
        let est = eng.estimate(-1.0, 0.0, 0, -5.0, OptionKind::Put).unwrap();
        assert!((0.0..=100.0).contains(&est.monte_carlo_probability));
    }

    #[test]
    fn test_deep_otm_put_strike_nearly_always_holds() {
        let eng = engine(5000, 3);
        let est = eng.estimate(100.0, 0.20, 14, 70.0, OptionKind::Put).unwrap();
        assert!(
            est.monte_carlo_probability > 99.0,
            "30% OTM put support should almost surely hold: {}",
            est.monte_carlo_probability
        );
    }
}
