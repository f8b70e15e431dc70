//! Geometry primitives adapter.
//!
//! Purpose
//! - Give the splitters a small, explicit surface over `geo`: boolean
//!   operations on a fixed precision grid, line clipping, buffering, minimal
//!   bounding rectangles and segment helpers.
//! - Turn backend failures into `GeometryError` values so recursion code
//!   inspects results instead of unwinding.
//!
//! Model
//! - Inputs of every boolean operation are snapped to `PrecisionModel::FINE`
//!   (1 cm). A failing operation is retried once on `PrecisionModel::COARSE`
//!   (1 dm) before the error is handed back.
//! - Buffers are built as unions of the input, one box per edge and one
//!   16-gon per vertex (a Minkowski sum with a polygonal disc).
//!
//! Code cross-refs: `access` (predicates), `obb::split` (cuts), `flag`
//! (driveways), `merge` (unions).

mod bbox;
mod buffer;
mod lines;
mod ops;
mod precision;

pub(crate) use bbox::ring_polygon;
pub use bbox::{minimal_bounding_rectangle, OrientedRect};
pub use buffer::{buffer_lines, buffer_multi_polygon, buffer_polygon, disc};
pub use lines::{
    line_length, lines_length, polygon_line_distance, segment_distance,
};
pub use ops::{
    clip_lines, difference, explode, intersection, is_finite, union, union_all, SLIVER_AREA,
};
pub use precision::PrecisionModel;

use geo::{Area, MultiPolygon, Polygon};

/// Unsigned area of a multipolygon.
#[inline]
pub fn area(mp: &MultiPolygon<f64>) -> f64 {
    mp.unsigned_area()
}

/// Wrap a single polygon.
#[inline]
pub fn multi(p: &Polygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon(vec![p.clone()])
}
