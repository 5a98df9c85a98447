use serde::{Deserialize, Serialize};
use std::fmt;

/// Hotspot band derived from a 0–100 score.
///
/// | Score  | Tier     |
/// |--------|----------|
/// | >= 75  | severe   |
/// | >= 50  | high     |
/// | >= 25  | moderate |
/// | < 25   | low      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotspotTier {
    Low,
    Moderate,
    High,
    Severe,
}

impl HotspotTier {
    pub const ALL: [HotspotTier; 4] = [Self::Severe, Self::High, Self::Moderate, Self::Low];

    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 75.0 => Self::Severe,
            s if s >= 50.0 => Self::High,
            s if s >= 25.0 => Self::Moderate,
            _ => Self::Low,
        }
    }

    /// Marker fill colour on the map.
    pub fn color(self) -> &'static str {
        match self {
            Self::Severe => "#b10026",
            Self::High => "#fc4e2a",
            Self::Moderate => "#feb24c",
            Self::Low => "#41ab5d",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Severe => "severe",
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for HotspotTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(HotspotTier::from_score(100.0), HotspotTier::Severe);
        assert_eq!(HotspotTier::from_score(75.0), HotspotTier::Severe);
        assert_eq!(HotspotTier::from_score(74.9), HotspotTier::High);
        assert_eq!(HotspotTier::from_score(50.0), HotspotTier::High);
        assert_eq!(HotspotTier::from_score(49.9), HotspotTier::Moderate);
        assert_eq!(HotspotTier::from_score(25.0), HotspotTier::Moderate);
        assert_eq!(HotspotTier::from_score(24.9), HotspotTier::Low);
        assert_eq!(HotspotTier::from_score(0.0), HotspotTier::Low);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&HotspotTier::Severe).unwrap(), "\"severe\"");
        assert_eq!(HotspotTier::Moderate.to_string(), "moderate");
    }
}
