//! Candidate road sides: runs of donor boundary a driveway could follow.

use geo::{BoundingRect, Contains, Intersects, Line, MultiPolygon, Polygon};

use crate::access::RoadReference;
use crate::error::GeometryError;
use crate::geometry::{buffer_lines, buffer_polygon, segment_distance};

/// Distance under which segments count as shared, adjacent or connected.
pub const SIDE_TOLERANCE: f64 = 0.1;

/// Connected run of donor boundary segments.
#[derive(Clone, Debug)]
pub struct CandidateSide {
    pub run: Vec<Line<f64>>,
    /// Index of the donor in the accessible list the candidates were built from.
    pub donor: usize,
    pub length: f64,
}

fn covered(zone: &MultiPolygon<f64>, seg: &Line<f64>) -> bool {
    zone.0.iter().any(|p| p.contains(seg))
}

/// Group segments into runs; a run grows while a remaining segment lies within
/// `SIDE_TOLERANCE` of it.
pub fn regroup(mut rest: Vec<Line<f64>>) -> Vec<Vec<Line<f64>>> {
    let mut runs = Vec::new();
    while !rest.is_empty() {
        let mut run = vec![rest.remove(0)];
        while let Some(i) = rest
            .iter()
            .position(|s| run.iter().any(|r| segment_distance(*r, *s) <= SIDE_TOLERANCE))
        {
            run.push(rest.remove(i));
        }
        runs.push(run);
    }
    runs
}

/// Candidate sides for `landlocked` over every adjacent accessible polygon,
/// shortest first.
///
/// Donor segments shared with the landlocked polygon or lying on the road
/// reference are never part of a run.
pub fn candidate_sides(
    landlocked: &Polygon<f64>,
    accessible: &[Polygon<f64>],
    road: &RoadReference,
) -> Result<Vec<CandidateSide>, GeometryError> {
    let zone = buffer_polygon(landlocked, SIDE_TOLERANCE)?;
    let mut out = Vec::new();
    for (donor, poly) in accessible.iter().enumerate() {
        if !poly.intersects(&zone) {
            continue;
        }
        let road_zone = match poly.bounding_rect() {
            Some(bb) => buffer_lines(&road.near(bb, SIDE_TOLERANCE), SIDE_TOLERANCE)?,
            None => continue,
        };
        let kept: Vec<Line<f64>> = poly
            .exterior()
            .lines()
            .filter(|l| l.start != l.end)
            .filter(|l| !covered(&zone, l) && !covered(&road_zone, l))
            .collect();
        for run in regroup(kept) {
            let length = run
                .iter()
                .map(|l| (l.end.x - l.start.x).hypot(l.end.y - l.start.y))
                .sum();
            out.push(CandidateSide { run, donor, length });
        }
    }
    out.sort_by(|a, b| a.length.total_cmp(&b.length));
    Ok(out)
}
