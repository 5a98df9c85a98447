use crate::analyzers::utility::saturate;
use crate::config::{ScoreReferences, ScoreWeights};

/// The three per-city measures that feed the hotspot score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    /// µg/m³
    pub pm25: f64,
    /// mean daily CO₂, kt/day
    pub co2: f64,
    /// TRI facilities per 100 km²
    pub facility_density: f64,
}

/// Blends the measures into a 0–100 hotspot score.
///
/// Each measure is divided by its reference value and clamped to `[0, 1]`,
/// then combined as a weighted mean. A zero weight sum scores 0.
pub fn hotspot_score(m: &Measurements, weights: &ScoreWeights, refs: &ScoreReferences) -> f64 {
    let parts = [
        (saturate(m.pm25, refs.pm25), weights.pm25),
        (saturate(m.co2, refs.co2), weights.co2),
        (
            saturate(m.facility_density, refs.facility_density),
            weights.facility_density,
        ),
    ];

    let weight_sum: f64 = parts.iter().map(|(_, w)| w).sum();
    if weight_sum == 0.0 {
        return 0.0;
    }
    let weighted_total: f64 = parts.iter().map(|(v, w)| v * w).sum();

    weighted_total / weight_sum * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurements(pm25: f64, co2: f64, facility_density: f64) -> Measurements {
        Measurements {
            pm25,
            co2,
            facility_density,
        }
    }

    fn score(m: Measurements) -> f64 {
        hotspot_score(&m, &ScoreWeights::default(), &ScoreReferences::default())
    }

    #[test]
    fn test_all_at_reference_scores_100() {
        assert!((score(measurements(35.0, 150.0, 10.0)) - 100.0).abs() < 1e-9);
        assert!((score(measurements(350.0, 1500.0, 100.0)) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_scores_zero() {
        assert_eq!(score(measurements(0.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_weighted_blend() {
        // 0.5 * 0.5 + 1.0 * 0.3 + 0.0 * 0.2
        let s = score(measurements(17.5, 150.0, 0.0));
        assert!((s - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_inputs_same_score() {
        let m = measurements(12.3, 98.7, 4.56);
        assert_eq!(score(m).to_bits(), score(m).to_bits());
    }

    #[test]
    fn test_zero_weights_score_zero() {
        let weights = ScoreWeights {
            pm25: 0.0,
            co2: 0.0,
            facility_density: 0.0,
        };
        let s = hotspot_score(
            &measurements(35.0, 150.0, 10.0),
            &weights,
            &ScoreReferences::default(),
        );
        assert_eq!(s, 0.0);
    }
}
