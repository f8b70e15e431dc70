//! Minimal-area oriented bounding rectangle, corner order normalised.

use geo::{Coord, LineString, MinimumRotatedRect, Polygon};

use super::PrecisionModel;
use nalgebra::Vector2;

/// Rectangle given by four consecutive corners.
///
/// Invariants:
/// - `corners[0] → corners[1]` and `corners[3] → corners[2]` are parallel,
///   as are `corners[1] → corners[2]` and `corners[0] → corners[3]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientedRect {
    pub corners: [Vector2<f64>; 4],
}

impl OrientedRect {
    /// `(|c0 c1|, |c1 c2|)`.
    pub fn side_lengths(&self) -> (f64, f64) {
        let c = &self.corners;
        ((c[1] - c[0]).norm(), (c[2] - c[1]).norm())
    }

    pub fn area(&self) -> f64 {
        let (a, b) = self.side_lengths();
        a * b
    }
}

/// Closed polygon through `pts` (no holes).
pub(crate) fn ring_polygon(pts: &[Vector2<f64>]) -> Polygon<f64> {
    let mut ring: Vec<Coord<f64>> = pts.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    Polygon::new(LineString(ring), Vec::new())
}

/// Minimal-area enclosing rectangle of `poly`. `None` for degenerate input.
///
/// Corners come back counter-clockwise, starting at the lowest (then
/// leftmost) one, with rotation noise snapped away on grid-aligned input.
pub fn minimal_bounding_rectangle(poly: &Polygon<f64>) -> Option<OrientedRect> {
    let rect = poly.minimum_rotated_rect()?;
    let mut pts: Vec<Vector2<f64>> = rect
        .exterior()
        .0
        .iter()
        .map(|c| {
            let c = settle(*c);
            Vector2::new(c.x, c.y)
        })
        .collect();
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    let Ok(mut corners) = <[Vector2<f64>; 4]>::try_from(pts) else {
        return None;
    };
    if signed_area(&corners) < 0.0 {
        corners.reverse();
    }
    let start = (0..4)
        .min_by(|&i, &j| {
            let (a, b) = (corners[i], corners[j]);
            a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
        })
        .unwrap_or(0);
    corners.rotate_left(start);
    let rect = OrientedRect { corners };
    let area = rect.area();
    (area.is_finite() && area > 1e-9).then_some(rect)
}

/// Snap coordinates lying within 1e-9 of the fine grid onto it.
fn settle(c: Coord<f64>) -> Coord<f64> {
    let snapped = PrecisionModel::FINE.snap(c);
    let pick = |raw: f64, grid: f64| if (raw - grid).abs() < 1e-9 { grid } else { raw };
    Coord {
        x: pick(c.x, snapped.x),
        y: pick(c.y, snapped.y),
    }
}

fn signed_area(c: &[Vector2<f64>; 4]) -> f64 {
    (0..4)
        .map(|i| {
            let (a, b) = (c[i], c[(i + 1) % 4]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}
