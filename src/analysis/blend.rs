use crate::types::{BlendWeights, ComponentBreakdown, ConfidenceLabel, UnifiedScore};

/// A component must sit this many points away from the neutral 50 to count
/// as a strong signal for the confidence label.
const STRONG_DEVIATION_PTS: f64 = 15.0;

/// Weighted blend of the three evidence components into one probability.
///
/// final = mc*w_mc + hist*w_hist + tech*w_tech, clamped to [0, 100].
/// The confidence label is a rule-based heuristic, not a statistical test:
/// High when at least two components deviate strongly from 50 in the same
/// direction, Medium when exactly one deviates, Low otherwise (including
/// strong but opposing components).
pub fn blend(
    monte_carlo: f64,
    historical: f64,
    technical: f64,
    weights: BlendWeights,
) -> UnifiedScore {
    let final_probability = (monte_carlo * weights.monte_carlo
        + historical * weights.historical
        + technical * weights.technical)
        .clamp(0.0, 100.0);

    UnifiedScore {
        final_probability,
        breakdown: ComponentBreakdown {
            monte_carlo,
            historical,
            technical,
        },
        confidence: confidence_label([monte_carlo, historical, technical]),
    }
}

fn confidence_label(components: [f64; 3]) -> ConfidenceLabel {
    let strong_up = components
        .iter()
        .filter(|c| **c > 50.0 + STRONG_DEVIATION_PTS)
        .count();
    let strong_down = components
        .iter()
        .filter(|c| **c < 50.0 - STRONG_DEVIATION_PTS)
        .count();

    if strong_up >= 2 || strong_down >= 2 {
        ConfidenceLabel::High
    } else if strong_up + strong_down == 1 {
        ConfidenceLabel::Medium
    } else {
        ConfidenceLabel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_inputs_stay_neutral() {
        // Holds for any weight configuration summing to 1
        for weights in [
            BlendWeights::default(),
            BlendWeights {
                monte_carlo: 0.5,
                historical: 0.25,
                technical: 0.25,
            },
            BlendWeights {
                monte_carlo: 1.0,
                historical: 0.0,
                technical: 0.0,
            },
        ] {
            let score = blend(50.0, 50.0, 50.0, weights);
            assert!(
                (score.final_probability - 50.0).abs() < 1e-9,
                "neutral blend drifted: {}",
                score.final_probability
            );
            assert_eq!(score.confidence, ConfidenceLabel::Low);
        }
    }

    #[test]
    fn test_default_weights_hand_computed() {
        let score = blend(80.0, 60.0, 70.0, BlendWeights::default());
        // 80*0.4 + 60*0.3 + 70*0.3 = 32 + 18 + 21 = 71
        assert!((score.final_probability - 71.0).abs() < 1e-9);
        assert_eq!(score.breakdown.monte_carlo, 80.0);
        assert_eq!(score.breakdown.historical, 60.0);
        assert_eq!(score.breakdown.technical, 70.0);
    }

    #[test]
    fn test_result_clamped() {
        let hot = BlendWeights {
            monte_carlo: 1.0,
            historical: 1.0,
            technical: 1.0,
        };
        assert_eq!(blend(90.0, 90.0, 90.0, hot).final_probability, 100.0);
        assert_eq!(blend(0.0, 0.0, 0.0, BlendWeights::default()).final_probability, 0.0);
    }

    #[test]
    fn test_two_agreeing_components_high() {
        let score = blend(70.0, 68.0, 50.0, BlendWeights::default());
        assert_eq!(score.confidence, ConfidenceLabel::High);
        let score = blend(30.0, 32.0, 50.0, BlendWeights::default());
        assert_eq!(score.confidence, ConfidenceLabel::High);
    }

    #[test]
    fn test_single_strong_component_medium() {
        let score = blend(72.0, 55.0, 48.0, BlendWeights::default());
        assert_eq!(score.confidence, ConfidenceLabel::Medium);
    }

    #[test]
    fn test_opposing_strong_components_low() {
        // One strongly bullish, one strongly bearish: no consensus
        let score = blend(75.0, 25.0, 50.0, BlendWeights::default());
        assert_eq!(score.confidence, ConfidenceLabel::Low);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // Exactly 15 points away does not count as strong
        let score = blend(65.0, 65.0, 50.0, BlendWeights::default());
        assert_eq!(score.confidence, ConfidenceLabel::Low);
    }
}
