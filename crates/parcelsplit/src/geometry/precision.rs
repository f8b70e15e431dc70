//! Fixed-grid precision reduction.

use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Snapping grid: coordinates are rounded to multiples of `1 / scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrecisionModel {
    pub scale: f64,
}

impl PrecisionModel {
    /// Centimetre grid used for every boolean operation.
    pub const FINE: PrecisionModel = PrecisionModel { scale: 100.0 };
    /// Decimetre grid used for the single retry after a failure.
    pub const COARSE: PrecisionModel = PrecisionModel { scale: 10.0 };

    #[inline]
    pub fn snap(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x * self.scale).round() / self.scale,
            y: (c.y * self.scale).round() / self.scale,
        }
    }

    /// Snap a ring and drop repeated vertices. `None` if it collapses.
    pub fn reduce_ring(&self, ring: &LineString<f64>) -> Option<LineString<f64>> {
        let mut pts: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len() + 1);
        for c in ring.0.iter() {
            let s = self.snap(*c);
            if pts.last() != Some(&s) {
                pts.push(s);
            }
        }
        if pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        if pts.len() < 3 {
            return None;
        }
        // Grid cell area is the smallest non-degenerate ring.
        let cell = 1.0 / (self.scale * self.scale);
        if shoelace(&pts).abs() < 0.5 * cell {
            return None;
        }
        pts.push(pts[0]);
        Some(LineString(pts))
    }

    pub fn reduce_polygon(&self, p: &Polygon<f64>) -> Option<Polygon<f64>> {
        let exterior = self.reduce_ring(p.exterior())?;
        let interiors = p
            .interiors()
            .iter()
            .filter_map(|r| self.reduce_ring(r))
            .collect();
        Some(Polygon::new(exterior, interiors))
    }

    pub fn reduce(&self, mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon(mp.0.iter().filter_map(|p| self.reduce_polygon(p)).collect())
    }
}

impl Default for PrecisionModel {
    fn default() -> Self {
        Self::FINE
    }
}

fn shoelace(pts: &[Coord<f64>]) -> f64 {
    let n = pts.len();
    let mut acc = 0.0;
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        acc += p.x * q.y - q.x * p.y;
    }
    0.5 * acc
}
