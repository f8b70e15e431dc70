//! Driveway synthesis for landlocked polygons.

use geo::{Intersects, LineString, MultiPolygon, Polygon};

use super::candidates::{candidate_sides, CandidateSide};
use crate::access::{has_road_access, RoadReference};
use crate::error::GeometryError;
use crate::geometry::{buffer_lines, difference, explode, intersection, multi, union};

/// Fragments at or below this area are dropped after grafting.
pub const TOO_SMALL_PARCEL_AREA: f64 = 25.0;

/// Result of `generate_flag_parcel`.
#[derive(Clone, Debug, Default)]
pub struct FlagOutcome {
    /// Polygons with road access, donors already trimmed by their driveways.
    pub accessible: Vec<Polygon<f64>>,
    /// Former landlocked polygons joined to a driveway.
    pub grafted: Vec<Polygon<f64>>,
    /// Landlocked polygons no candidate could serve.
    pub isolated: Vec<Polygon<f64>>,
    /// Driveway footprints taken from donors.
    pub driveways: Vec<MultiPolygon<f64>>,
}

struct Graft {
    donor: usize,
    remainder: Vec<Polygon<f64>>,
    grafted: Vec<Polygon<f64>>,
    driveway: MultiPolygon<f64>,
}

/// Give every landlocked polygon of `split` a driveway over an accessible
/// neighbor, or report it as isolated.
///
/// Landlocked polygons are served in input order; each accepted graft
/// replaces its donor so later candidates see the trimmed geometry.
pub fn generate_flag_parcel(
    split: Vec<Polygon<f64>>,
    road: &RoadReference,
    buildings: &[Polygon<f64>],
    driveway_width: f64,
) -> FlagOutcome {
    let (mut accessible, landlocked): (Vec<_>, Vec<_>) =
        split.into_iter().partition(|p| has_road_access(p, road));
    let mut out = FlagOutcome::default();
    for cur in landlocked {
        match graft_one(&cur, &accessible, road, buildings, driveway_width) {
            Some(g) => {
                accessible.remove(g.donor);
                accessible.extend(g.remainder);
                out.grafted.extend(g.grafted);
                out.driveways.push(g.driveway);
            }
            None => {
                tracing::debug!("no driveway found; polygon stays isolated");
                out.isolated.push(cur);
            }
        }
    }
    out.accessible = accessible;
    out
}

fn graft_one(
    cur: &Polygon<f64>,
    accessible: &[Polygon<f64>],
    road: &RoadReference,
    buildings: &[Polygon<f64>],
    width: f64,
) -> Option<Graft> {
    let sides = match candidate_sides(cur, accessible, road) {
        Ok(sides) => sides,
        Err(err) => {
            tracing::warn!(%err, "candidate sides unavailable");
            return None;
        }
    };
    for side in &sides {
        match try_side(cur, &accessible[side.donor], side, road, buildings, width) {
            Ok(Some(g)) => return Some(g),
            Ok(None) => {}
            Err(err) => tracing::warn!(%err, donor = side.donor, "driveway candidate dropped"),
        }
    }
    None
}

fn try_side(
    cur: &Polygon<f64>,
    donor: &Polygon<f64>,
    side: &CandidateSide,
    road: &RoadReference,
    buildings: &[Polygon<f64>],
    width: f64,
) -> Result<Option<Graft>, GeometryError> {
    let run: Vec<LineString<f64>> = side
        .run
        .iter()
        .map(|l| LineString(vec![l.start, l.end]))
        .collect();
    let driveway = buffer_lines(&run, width / 2.0)?;
    if buildings.iter().any(|b| driveway.intersects(b)) {
        return Ok(None);
    }
    let cur_mp = multi(cur);
    let donor_mp = multi(donor);
    let remainder = explode(difference(&donor_mp, &driveway)?, TOO_SMALL_PARCEL_AREA);
    let grafted = explode(
        intersection(&union(&cur_mp, &driveway)?, &union(&cur_mp, &donor_mp)?)?,
        TOO_SMALL_PARCEL_AREA,
    );
    if grafted.is_empty() {
        return Ok(None);
    }
    if remainder
        .iter()
        .chain(grafted.iter())
        .any(|p| !has_road_access(p, road))
    {
        return Ok(None);
    }
    Ok(Some(Graft {
        donor: side.donor,
        remainder,
        grafted,
        driveway: intersection(&driveway, &donor_mp)?,
    }))
}
