//! Development card types.
//!
//! Cards are drawn with a fixed 40/30/30 split between year-of-plenty,
//! victory point, and knight cards. Monopoly and road building exist as
//! kinds so they survive a round trip through the sync protocol, but the
//! draw never produces them and playing one only logs a notice.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A development card kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DevCardKind {
    /// Sends the robber out; pick a replacement resource
    Knight,
    /// Year of plenty: pick any two resources
    Yop,
    Monopoly,
    RoadBuilding,
    /// Worth one victory point, never played
    Point,
}

impl DevCardKind {
    /// Draw a random card: 40% yop, 30% point, 30% knight.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let roll: f64 = rng.gen();
        if roll < 0.4 {
            DevCardKind::Yop
        } else if roll < 0.7 {
            DevCardKind::Point
        } else {
            DevCardKind::Knight
        }
    }

    /// Whether this card sits in the unused pile waiting to be played.
    /// Point cards go straight to the used pile and score from there.
    pub fn is_usable(&self) -> bool {
        !matches!(self, DevCardKind::Point)
    }

    /// Victory points this card is worth once in the used pile.
    pub fn point_value(&self) -> u32 {
        match self {
            DevCardKind::Point => 1,
            _ => 0,
        }
    }
}
