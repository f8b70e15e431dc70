//! Boolean operations with precision reduction and a single coarse retry.

use std::panic::{self, AssertUnwindSafe};

use geo::{Area, BooleanOps, CoordsIter, LineString, MultiLineString, MultiPolygon, Polygon};

use super::precision::PrecisionModel;
use crate::error::GeometryError;

/// Pieces below this area are numerical debris, never parcels.
pub const SLIVER_AREA: f64 = 1.0;

#[derive(Clone, Copy, Debug)]
enum BoolOp {
    Intersection,
    Union,
    Difference,
}

impl BoolOp {
    fn name(self) -> &'static str {
        match self {
            BoolOp::Intersection => "intersection",
            BoolOp::Union => "union",
            BoolOp::Difference => "difference",
        }
    }
}

/// `true` if every coordinate is finite.
pub fn is_finite(mp: &MultiPolygon<f64>) -> bool {
    mp.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite())
}

fn guarded<T>(op: &'static str, f: impl FnOnce() -> T) -> Result<T, GeometryError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|_| GeometryError::Topology { op })
}

fn run(
    op: BoolOp,
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
    pm: PrecisionModel,
) -> Result<MultiPolygon<f64>, GeometryError> {
    let a = pm.reduce(a);
    let b = pm.reduce(b);
    let out = guarded(op.name(), || match op {
        BoolOp::Intersection => a.intersection(&b),
        BoolOp::Union => a.union(&b),
        BoolOp::Difference => a.difference(&b),
    })?;
    if !is_finite(&out) {
        return Err(GeometryError::NonFinite { op: op.name() });
    }
    Ok(pm.reduce(&out))
}

fn with_retry(
    op: BoolOp,
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, GeometryError> {
    match run(op, a, b, PrecisionModel::FINE) {
        Ok(out) => Ok(out),
        Err(err) => {
            tracing::debug!(%err, "retrying at reduced precision");
            run(op, a, b, PrecisionModel::COARSE)
        }
    }
}

pub fn intersection(
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, GeometryError> {
    with_retry(BoolOp::Intersection, a, b)
}

pub fn union(
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, GeometryError> {
    with_retry(BoolOp::Union, a, b)
}

pub fn difference(
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, GeometryError> {
    with_retry(BoolOp::Difference, a, b)
}

/// Balanced pairwise union of many pieces.
pub fn union_all(mut parts: Vec<MultiPolygon<f64>>) -> Result<MultiPolygon<f64>, GeometryError> {
    if parts.is_empty() {
        return Ok(MultiPolygon(Vec::new()));
    }
    while parts.len() > 1 {
        let mut next = Vec::with_capacity(parts.len() / 2 + 1);
        let mut it = parts.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => next.push(union(&a, &b)?),
                None => next.push(a),
            }
        }
        parts = next;
    }
    Ok(parts.pop().unwrap_or_else(|| MultiPolygon(Vec::new())))
}

/// Parts of `lines` lying inside `area`.
pub fn clip_lines(
    area: &MultiPolygon<f64>,
    lines: &[LineString<f64>],
) -> Result<MultiLineString<f64>, GeometryError> {
    let attempt = |pm: PrecisionModel| -> Result<MultiLineString<f64>, GeometryError> {
        let area = pm.reduce(area);
        let snapped = MultiLineString(
            lines
                .iter()
                .map(|ls| LineString(ls.0.iter().map(|c| pm.snap(*c)).collect()))
                .filter(|ls: &LineString<f64>| ls.0.len() >= 2)
                .collect(),
        );
        let out = guarded("clip", || area.clip(&snapped, false))?;
        if out.coords_iter().any(|c| !(c.x.is_finite() && c.y.is_finite())) {
            return Err(GeometryError::NonFinite { op: "clip" });
        }
        Ok(out)
    };
    attempt(PrecisionModel::FINE).or_else(|err| {
        tracing::debug!(%err, "retrying clip at reduced precision");
        attempt(PrecisionModel::COARSE)
    })
}

/// Split into single polygons, keeping those with area strictly above `min_area`.
pub fn explode(mp: MultiPolygon<f64>, min_area: f64) -> Vec<Polygon<f64>> {
    mp.0.into_iter()
        .filter(|p| p.unsigned_area() > min_area)
        .collect()
}
