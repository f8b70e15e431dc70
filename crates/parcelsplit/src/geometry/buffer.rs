//! Positive buffers as Minkowski sums with a 16-gon.

use geo::{Coord, LineString, MultiPolygon, Polygon};

use super::ops::union_all;
use crate::error::GeometryError;

const DISC_SEGMENTS: usize = 16;

/// Regular polygon approximating a disc of radius `r` around `center`.
///
/// The polygon circumscribes the circle so buffers never come out thinner
/// than requested.
pub fn disc(center: Coord<f64>, r: f64) -> Polygon<f64> {
    let step = std::f64::consts::TAU / DISC_SEGMENTS as f64;
    let rr = r / (0.5 * step).cos();
    let mut pts: Vec<Coord<f64>> = (0..DISC_SEGMENTS)
        .map(|k| {
            let th = k as f64 * step;
            Coord {
                x: center.x + rr * th.cos(),
                y: center.y + rr * th.sin(),
            }
        })
        .collect();
    pts.push(pts[0]);
    Polygon::new(LineString(pts), Vec::new())
}

/// Rectangle of half-width `r` around segment `a → b`; `None` for zero-length segments.
fn segment_box(a: Coord<f64>, b: Coord<f64>, r: f64) -> Option<Polygon<f64>> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len <= 1e-12 {
        return None;
    }
    let nx = -dy / len * r;
    let ny = dx / len * r;
    let pts = vec![
        Coord { x: a.x + nx, y: a.y + ny },
        Coord { x: a.x - nx, y: a.y - ny },
        Coord { x: b.x - nx, y: b.y - ny },
        Coord { x: b.x + nx, y: b.y + ny },
        Coord { x: a.x + nx, y: a.y + ny },
    ];
    Some(Polygon::new(LineString(pts), Vec::new()))
}

fn stroke_pieces(ring: &LineString<f64>, r: f64, out: &mut Vec<MultiPolygon<f64>>) {
    for w in ring.0.windows(2) {
        if let Some(b) = segment_box(w[0], w[1], r) {
            out.push(MultiPolygon(vec![b]));
        }
    }
    let n = if ring.is_closed() && ring.0.len() > 1 {
        ring.0.len() - 1
    } else {
        ring.0.len()
    };
    for c in ring.0[..n].iter() {
        out.push(MultiPolygon(vec![disc(*c, r)]));
    }
}

/// Buffer a polygon outward by `r` (holes shrink). `r <= 0` returns the input.
pub fn buffer_polygon(p: &Polygon<f64>, r: f64) -> Result<MultiPolygon<f64>, GeometryError> {
    buffer_multi_polygon(&MultiPolygon(vec![p.clone()]), r)
}

pub fn buffer_multi_polygon(
    mp: &MultiPolygon<f64>,
    r: f64,
) -> Result<MultiPolygon<f64>, GeometryError> {
    if r <= 0.0 {
        return Ok(mp.clone());
    }
    let mut pieces = vec![mp.clone()];
    for p in mp.0.iter() {
        stroke_pieces(p.exterior(), r, &mut pieces);
        for hole in p.interiors() {
            stroke_pieces(hole, r, &mut pieces);
        }
    }
    union_all(pieces)
}

/// Buffer a set of polylines by `r` (round joins, round caps).
pub fn buffer_lines(
    lines: &[LineString<f64>],
    r: f64,
) -> Result<MultiPolygon<f64>, GeometryError> {
    let mut pieces = Vec::new();
    if r > 0.0 {
        for ls in lines {
            stroke_pieces(ls, r, &mut pieces);
        }
    }
    union_all(pieces)
}
