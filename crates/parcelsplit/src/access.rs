//! Road-access predicate and the road reference it is evaluated against.
//!
//! Purpose
//! - Decide whether a polygon touches the road network (`has_road_access`)
//!   and how long that contact is (`frontage_width`).
//! - Hold the road reference: road centrelines plus the exterior of the urban
//!   block, extended with lanes while a decomposition runs.
//!
//! Model
//! - Access is "distance to some reference line ≤ `ACCESS_TOLERANCE`", which
//!   is the same predicate as intersecting the 0.5 buffer of the reference.
//! - Frontage is the length of reference lines inside `buffer(polygon, 1)`,
//!   falling back to `buffer(polygon, 5)` when nothing is within 1.
//! - `RoadReference` is an `Arc`-shared list; `with_*` builders return a new
//!   reference so sibling recursion branches never see each other's roads.

use std::sync::Arc;

use geo::{BoundingRect, Coord, Intersects, LineString, MultiPolygon, Polygon, Rect};

use crate::error::GeometryError;
use crate::geometry::{buffer_polygon, clip_lines, lines_length, polygon_line_distance, union_all};

/// Maximal distance between a polygon and a road line that still counts as access.
pub const ACCESS_TOLERANCE: f64 = 0.5;
/// Buffer used for the first frontage measurement.
pub const FRONTAGE_NEAR: f64 = 1.0;
/// Fallback buffer when nothing lies within `FRONTAGE_NEAR`.
pub const FRONTAGE_FAR: f64 = 5.0;

/// Ordered, immutable set of road lines (roads ∪ block exterior ∪ generated lanes).
#[derive(Clone, Debug, Default)]
pub struct RoadReference {
    lines: Arc<Vec<LineString<f64>>>,
}

impl RoadReference {
    pub fn new(lines: Vec<LineString<f64>>) -> Self {
        let lines = lines.into_iter().filter(|l| l.0.len() >= 2).collect();
        Self {
            lines: Arc::new(lines),
        }
    }

    /// Road centrelines followed by the block exterior rings.
    pub fn from_parts(roads: &[LineString<f64>], exterior: &[LineString<f64>]) -> Self {
        Self::new(roads.iter().chain(exterior.iter()).cloned().collect())
    }

    pub fn lines(&self) -> &[LineString<f64>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// New reference with `extra` appended; `self` is unchanged.
    pub fn with_lines(&self, extra: impl IntoIterator<Item = LineString<f64>>) -> Self {
        let mut lines: Vec<LineString<f64>> = self.lines.as_ref().clone();
        lines.extend(extra.into_iter().filter(|l| l.0.len() >= 2));
        Self {
            lines: Arc::new(lines),
        }
    }

    /// New reference extended with every ring of `mp`.
    pub fn with_polygon_outline(&self, mp: &MultiPolygon<f64>) -> Self {
        self.with_lines(polygon_rings(mp))
    }

    /// `true` if both handles share the same line storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lines, &other.lines)
    }

    /// Lines whose bounding box comes within `margin` of `rect`.
    pub(crate) fn near(&self, rect: Rect<f64>, margin: f64) -> Vec<LineString<f64>> {
        let grown = grow(rect, margin);
        self.lines
            .iter()
            .filter(|l| l.bounding_rect().is_some_and(|r| grown.intersects(&r)))
            .cloned()
            .collect()
    }
}

fn polygon_rings(mp: &MultiPolygon<f64>) -> Vec<LineString<f64>> {
    mp.0.iter()
        .flat_map(|p| std::iter::once(p.exterior().clone()).chain(p.interiors().iter().cloned()))
        .collect()
}

fn grow(r: Rect<f64>, m: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: r.min().x - m,
            y: r.min().y - m,
        },
        Coord {
            x: r.max().x + m,
            y: r.max().y + m,
        },
    )
}

/// Whether `poly` lies within `ACCESS_TOLERANCE` of any reference line.
pub fn has_road_access(poly: &Polygon<f64>, road: &RoadReference) -> bool {
    let Some(bb) = poly.bounding_rect() else {
        return false;
    };
    road.near(bb, ACCESS_TOLERANCE)
        .iter()
        .any(|l| polygon_line_distance(poly, l) <= ACCESS_TOLERANCE)
}

/// Multi-part variant: access through any part.
pub fn multi_has_road_access(mp: &MultiPolygon<f64>, road: &RoadReference) -> bool {
    mp.0.iter().any(|p| has_road_access(p, road))
}

fn clipped_length(poly: &Polygon<f64>, road: &RoadReference, r: f64) -> Result<f64, GeometryError> {
    let Some(bb) = poly.bounding_rect() else {
        return Ok(0.0);
    };
    let near = road.near(bb, r);
    if near.is_empty() {
        return Ok(0.0);
    }
    let zone = buffer_polygon(poly, r)?;
    Ok(lines_length(&clip_lines(&zone, &near)?))
}

/// Length of road in contact with `poly`; `0.0` when nothing is within `FRONTAGE_FAR`.
pub fn frontage_width(poly: &Polygon<f64>, road: &RoadReference) -> Result<f64, GeometryError> {
    let near = clipped_length(poly, road, FRONTAGE_NEAR)?;
    if near > 0.0 {
        return Ok(near);
    }
    clipped_length(poly, road, FRONTAGE_FAR)
}

/// Rings of the union of a parcel collection: the outline of the urban block.
pub fn block_exterior(parcels: &[MultiPolygon<f64>]) -> Result<Vec<LineString<f64>>, GeometryError> {
    let block = union_all(parcels.to_vec())?;
    Ok(polygon_rings(&block))
}
