//! One OBB cut: choose the axis, draw the offset, build the two boxes.

use geo::{Area, MultiPolygon, Polygon};
use nalgebra::Vector2;
use rand::Rng;

use crate::error::GeometryError;
use crate::geometry::{
    explode, intersection, minimal_bounding_rectangle, multi, ring_polygon, SLIVER_AREA,
};

/// Bounds for the cut position along the split side.
pub const ALPHA_MIN: f64 = 0.05;
pub const ALPHA_MAX: f64 = 0.95;

/// Axis and offset inputs of a single cut.
#[derive(Clone, Copy, Debug)]
pub struct CutParams {
    /// Always cut across the long side of the bounding box.
    pub short_direction: bool,
    pub harmony: f64,
    pub irregularity: f64,
    /// Width of the road box inserted in the cut, if any.
    pub road_width: Option<f64>,
}

/// Boxes covering each side of the cut, plus the road box between them.
#[derive(Clone, Debug)]
pub struct SplittingPolygons {
    pub halves: [Polygon<f64>; 2],
    pub lane: Option<Polygon<f64>>,
}

/// Whether corner order `c0 c1 c2 c3` is kept (`true`) or rotated by one.
///
/// Keeping the order cuts across `c0 → c1`. Without the short-direction
/// restriction a nearly square box (ratio above `harmony`) is cut the
/// other way, which tends to keep both halves on the road.
pub fn keep_corner_order(d1: f64, d2: f64, short_direction: bool, harmony: f64) -> bool {
    let mut keep = d1 > d2;
    if !short_direction && d1 > d2 && d2 / d1 > harmony {
        keep = !keep;
    } else if !short_direction && d1 < d2 && d1 / d2 > harmony {
        keep = !keep;
    }
    keep
}

/// Position of the cut along `p0 → p1`, in `[ALPHA_MIN, ALPHA_MAX]`.
///
/// `u` is drawn on every call so random streams stay aligned whatever the
/// irregularity. The clamp only bites for degenerate irregularity values
/// and keeps both halves non-empty.
pub fn draw_alpha<R: Rng + ?Sized>(d1: f64, d2: f64, irregularity: f64, rng: &mut R) -> f64 {
    let u: f64 = rng.gen();
    let alpha = 0.5 + (0.5 - u) * (d1.min(d2) / 3.0).min(irregularity);
    alpha.clamp(ALPHA_MIN, ALPHA_MAX)
}

#[inline]
fn lerp(a: Vector2<f64>, b: Vector2<f64>, t: f64) -> Vector2<f64> {
    a + (b - a) * t
}

/// Splitting boxes for `poly`; `None` when the polygon is too small to cut.
pub fn splitting_polygons<R: Rng + ?Sized>(
    poly: &Polygon<f64>,
    params: CutParams,
    rng: &mut R,
) -> Option<SplittingPolygons> {
    if poly.unsigned_area() < 1.0 {
        return None;
    }
    let obb = minimal_bounding_rectangle(poly)?;
    let c = obb.corners;
    let (d1, d2) = obb.side_lengths();
    let (p0, p1, p2, p3) = if keep_corner_order(d1, d2, params.short_direction, params.harmony) {
        (c[0], c[1], c[2], c[3])
    } else {
        (c[1], c[2], c[3], c[0])
    };
    let alpha = draw_alpha(d1, d2, params.irregularity, rng);

    if let Some(width) = params.road_width.filter(|w| *w > 0.0) {
        let road_alpha = width / ((p1 - p0).norm() * 2.0);
        // A lane wider than the room on either side would swallow a half.
        if road_alpha < alpha.min(1.0 - alpha) {
            let p4 = lerp(p0, p1, alpha - road_alpha);
            let p5 = lerp(p3, p2, alpha - road_alpha);
            let p6 = lerp(p0, p1, alpha + road_alpha);
            let p7 = lerp(p3, p2, alpha + road_alpha);
            return Some(SplittingPolygons {
                halves: [ring_polygon(&[p0, p4, p5, p3]), ring_polygon(&[p6, p1, p2, p7])],
                lane: Some(ring_polygon(&[p4, p5, p7, p6])),
            });
        }
        tracing::debug!(width, alpha, "lane does not fit in cut; splitting without it");
    }

    let p4 = lerp(p0, p1, alpha);
    let p5 = lerp(p3, p2, alpha);
    Some(SplittingPolygons {
        halves: [ring_polygon(&[p0, p4, p5, p3]), ring_polygon(&[p4, p1, p2, p5])],
        lane: None,
    })
}

/// `poly` intersected with each box, multi-part results exploded, slivers dropped.
pub fn split_by(poly: &Polygon<f64>, boxes: &[Polygon<f64>]) -> Result<Vec<Polygon<f64>>, GeometryError> {
    let subject = multi(poly);
    let mut out = Vec::new();
    for b in boxes {
        let part = intersection(&subject, &multi(b))?;
        out.extend(explode(part, SLIVER_AREA));
    }
    Ok(out)
}

/// Part of `poly` covered by the lane box.
pub fn lane_footprint(poly: &Polygon<f64>, lane: &Polygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
    intersection(&multi(poly), &multi(lane))
}
