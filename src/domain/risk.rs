// ============================================================
// Layer 3 — Risk Tiers
// ============================================================
// The classifier outputs one probability per tier, in this
// fixed order:
//
//   index 0 → Safe        (bank credits, OTPs, balances)
//   index 1 → Suspicious  (lotteries, "pre-approved" loans)
//   index 2 → Scam        (KYC threats, phishing links)
//
// The order is part of the exported model's contract: the
// mobile app reads output[0][i] as the probability of tier i.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of output classes of the classifier
pub const NUM_TIERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RiskTier {
    Safe,
    Suspicious,
    Scam,
}

impl RiskTier {
    pub const ALL: [RiskTier; NUM_TIERS] = [RiskTier::Safe, RiskTier::Suspicious, RiskTier::Scam];

    /// Class index used by the model
    pub fn index(self) -> usize {
        match self {
            RiskTier::Safe       => 0,
            RiskTier::Suspicious => 1,
            RiskTier::Scam       => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            RiskTier::Safe       => "safe",
            RiskTier::Suspicious => "suspicious",
            RiskTier::Scam       => "scam",
        }
    }
}

impl TryFrom<u8> for RiskTier {
    type Error = String;

    fn try_from(label: u8) -> Result<Self, Self::Error> {
        RiskTier::from_index(label as usize)
            .ok_or_else(|| format!("label {label} is not a risk tier (expected 0, 1 or 2)"))
    }
}

impl From<RiskTier> for u8 {
    fn from(tier: RiskTier) -> Self {
        tier.index() as u8
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── TierScores ───────────────────────────────────────────────────────────────
/// Softmax output of the classifier for a single message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierScores {
    pub safe:       f32,
    pub suspicious: f32,
    pub scam:       f32,
}

impl TierScores {
    /// Build from a probability vector in tier order.
    /// Returns None when the slice does not hold exactly one value per tier.
    pub fn from_probabilities(probs: &[f32]) -> Option<Self> {
        match probs {
            [safe, suspicious, scam] => Some(Self {
                safe:       *safe,
                suspicious: *suspicious,
                scam:       *scam,
            }),
            _ => None,
        }
    }

    pub fn to_array(&self) -> [f32; NUM_TIERS] {
        [self.safe, self.suspicious, self.scam]
    }

    pub fn get(&self, tier: RiskTier) -> f32 {
        self.to_array()[tier.index()]
    }

    /// The tier with the highest probability. Ties go to the lower tier.
    pub fn predicted(&self) -> RiskTier {
        let probs = self.to_array();
        let mut best = 0;
        for i in 1..NUM_TIERS {
            if probs[i] > probs[best] {
                best = i;
            }
        }
        RiskTier::ALL[best]
    }

    /// Shannon entropy normalised to [0, 1].
    /// 0.0 = all mass on one tier, 1.0 = uniform over the three tiers.
    pub fn entropy(&self) -> f32 {
        let max_entropy = (NUM_TIERS as f32).ln();
        let h: f32 = self
            .to_array()
            .iter()
            .filter(|&&p| p > 1e-12)
            .map(|&p| -p * p.ln())
            .sum();
        h / max_entropy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip_for_every_tier() {
        for tier in RiskTier::ALL {
            assert_eq!(RiskTier::from_index(tier.index()), Some(tier));
        }
        assert_eq!(RiskTier::from_index(3), None);
    }

    #[test]
    fn test_try_from_rejects_out_of_range() {
        assert_eq!(RiskTier::try_from(1u8), Ok(RiskTier::Suspicious));
        assert!(RiskTier::try_from(3u8).is_err());
    }

    #[test]
    fn test_predicted_picks_highest() {
        let s = TierScores::from_probabilities(&[0.1, 0.2, 0.7]).unwrap();
        assert_eq!(s.predicted(), RiskTier::Scam);
        assert!((s.get(RiskTier::Suspicious) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_from_probabilities_wrong_length() {
        assert!(TierScores::from_probabilities(&[0.5, 0.5]).is_none());
    }

    #[test]
    fn test_entropy_bounds() {
        let certain = TierScores::from_probabilities(&[1.0, 0.0, 0.0]).unwrap();
        assert!(certain.entropy() < 1e-6);

        let uniform = TierScores::from_probabilities(&[1.0 / 3.0; 3]).unwrap();
        assert!((uniform.entropy() - 1.0).abs() < 1e-4);
    }
}
