//! Fractional grid coordinates for the pointy-top hex board.
//!
//! The board lives on a skewed logical grid where one x unit is half a hex
//! width and one y unit is one hex edge length. Hex centers sit on integer-ish
//! positions, vertices on (integer, half-integer) positions, and edge
//! midpoints on multiples of 3/4 in y. A coordinate carries both its logical
//! position and its derived pixel position; identity is the rounded pixel
//! position, which makes float noise from averaging harmless.

use serde::{Deserialize, Serialize};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Length of one hex edge in pixels.
pub const HEX_EDGE_PX: f64 = 58.0;

/// Half the pixel width of a hex (distance from center to edge midpoint).
pub const HALF_WIDTH_PX: f64 = HEX_EDGE_PX * SQRT_3 / 2.0;

const CANVAS_HEIGHT_PX: f64 = 600.0;
const INSTRUCTIONS_HEIGHT_PX: f64 = 50.0;
const BOARD_WIDTH_PX: f64 = 600.0;
const BOARD_HEIGHT_PX: f64 = CANVAS_HEIGHT_PX - INSTRUCTIONS_HEIGHT_PX;

/// Pixels per logical x unit.
pub const X_FACTOR: f64 = HALF_WIDTH_PX;
/// Pixels per logical y unit. Negative: logical y grows upward, pixel y down.
pub const Y_FACTOR: f64 = -HEX_EDGE_PX;

/// Pixel position of logical (0, 0), chosen to center the board.
pub const ORIGIN_X: f64 = (BOARD_WIDTH_PX - 8.0 * HALF_WIDTH_PX) / 2.0;
pub const ORIGIN_Y: f64 = CANVAS_HEIGHT_PX - (BOARD_HEIGHT_PX - 6.0 * HEX_EDGE_PX) / 2.0;

/// Derived integer identity for a grid coordinate.
///
/// Two coordinates that round to the same pixel are the same board position.
/// The packing (`round(px) * 10000 + round(py)`) is collision-free as long as
/// pixel magnitudes stay well under 10000, which holds everywhere on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoordKey(pub i64);

/// A position on the logical board grid.
///
/// Logical (x, y) is what goes over the wire; the pixel pair is derived on
/// construction and used for identity and proximity checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "LogicalXy", into = "LogicalXy")]
pub struct GridCoord {
    /// Logical x (half hex widths)
    pub x: f64,
    /// Logical y (hex edge lengths)
    pub y: f64,
    /// Derived pixel x
    pub px: f64,
    /// Derived pixel y
    pub py: f64,
}

/// Wire form of a coordinate: logical position only.
#[derive(Serialize, Deserialize)]
struct LogicalXy {
    x: f64,
    y: f64,
}

impl From<LogicalXy> for GridCoord {
    fn from(v: LogicalXy) -> Self {
        GridCoord::new(v.x, v.y)
    }
}

impl From<GridCoord> for LogicalXy {
    fn from(c: GridCoord) -> Self {
        LogicalXy { x: c.x, y: c.y }
    }
}

impl GridCoord {
    /// Create a coordinate from its logical position.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            px: x * X_FACTOR + ORIGIN_X,
            py: y * Y_FACTOR + ORIGIN_Y,
        }
    }

    /// Create a coordinate from a pixel position (e.g. a mouse click).
    pub fn from_pixel(px: f64, py: f64) -> Self {
        Self::new((px - ORIGIN_X) / X_FACTOR, (py - ORIGIN_Y) / Y_FACTOR)
    }

    /// Snap to the vertex grid: integer x, half-integer y.
    pub fn snapped_to_vertex_grid(&self) -> Self {
        Self::new(self.x.round(), (self.y * 2.0).round() / 2.0)
    }

    /// Snap to the edge-midpoint grid: y to the nearest multiple of 3/4,
    /// with the x offset pattern alternating by row.
    pub fn snapped_to_midpoint_grid(&self) -> Self {
        let y = (self.y * 4.0 / 3.0).round() * 3.0 / 4.0;
        let x = if y % 1.5 == 0.0 {
            self.x.round()
        } else {
            (self.x + 0.5).round() - 0.5
        };
        Self::new(x, y)
    }

    /// The derived integer identity of this position.
    pub fn key(&self) -> CoordKey {
        CoordKey(self.px.round() as i64 * 10_000 + self.py.round() as i64)
    }

    /// Whether another coordinate is within the click-tolerance radius (15px).
    pub fn is_very_close_to(&self, other: &GridCoord) -> bool {
        const THRESHOLD_PX: f64 = 15.0;
        let dx = self.px - other.px;
        let dy = self.py - other.py;
        dx * dx + dy * dy <= THRESHOLD_PX * THRESHOLD_PX
    }

    /// This coordinate shifted by a logical offset.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Logical-space average of a set of coordinates.
    pub fn centroid(coords: &[GridCoord]) -> Self {
        let n = coords.len() as f64;
        let sum_x: f64 = coords.iter().map(|c| c.x).sum();
        let sum_y: f64 = coords.iter().map(|c| c.y).sum();
        Self::new(sum_x / n, sum_y / n)
    }
}

impl PartialEq for GridCoord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for GridCoord {}

impl std::hash::Hash for GridCoord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// The six vertices of the hex centered at `center`, counterclockwise from
/// the upper-left corner.
pub fn hex_vertices(center: GridCoord) -> [GridCoord; 6] {
    [
        center.offset(-1.0, 0.5),
        center.offset(0.0, 1.0),
        center.offset(1.0, 0.5),
        center.offset(1.0, -0.5),
        center.offset(0.0, -1.0),
        center.offset(-1.0, -0.5),
    ]
}
