// ============================================================
// Layer 3 — LabeledMessage Domain Type
// ============================================================
// One training example: the raw SMS text and the risk tier a
// human assigned to it. Examples are immutable once authored.

use serde::{Deserialize, Serialize};

use crate::domain::risk::RiskTier;

/// A labelled SMS message.
///
/// On disk the tier is stored as its integer label under the
/// `label` key, e.g. `{ "text": "...", "label": 2 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledMessage {
    /// The message exactly as it was received
    pub text: String,

    /// The tier this message belongs to
    #[serde(rename = "label")]
    pub tier: RiskTier,
}

impl LabeledMessage {
    /// The integer class index used as the training target
    pub fn label(&self) -> usize {
        self.tier.index()
    }
}
