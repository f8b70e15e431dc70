//! Densification: flag-cut marked parcels, keeping existing buildings whole.

use geo::{Area, Intersects, MultiPolygon, Polygon};
use rand::Rng;

use super::{consolidate, simulated_piece};
use crate::access::RoadReference;
use crate::error::ConfigError;
use crate::flag::flag_decompose;
use crate::geometry::{multi, union_all};
use crate::obb::{decompose, ObbConfig};
use crate::parcel::{any_marked, Mark, Parcel};
use crate::profile::UrbanFabricProfile;
use crate::tree::NodeKind;

/// Buildings at or below this footprint do not make a piece built.
pub const UNCOUNTED_BUILDING_AREA: f64 = 20.0;

/// Flag-cut every marked parcel larger than `maximal_area`.
///
/// A cut is kept only when it yields several pieces, all at least
/// `minimal_area`. If the flag engine cannot serve every piece from the
/// road, the parcel is cut with OBB and forced access when
/// `allow_isolated_parcel` is set, and kept whole otherwise. Built pieces
/// are fused back together (one building is assumed to span them); a cut
/// whose pieces are all built is dropped.
///
/// Pieces are numbered `<number>-<i>`; unmarked parcels pass through with
/// `simulated = false`.
pub fn densify<R: Rng + ?Sized>(
    parcels: &[Parcel],
    road: &RoadReference,
    buildings: &[Polygon<f64>],
    profile: &UrbanFabricProfile,
    allow_isolated_parcel: bool,
    rng: &mut R,
) -> Result<Vec<Parcel>, ConfigError> {
    profile.validate()?;
    if !any_marked(parcels) {
        tracing::info!(parcels = parcels.len(), "no marked parcel; collection unchanged");
        return Ok(parcels.to_vec());
    }
    let counted: Vec<&Polygon<f64>> = buildings
        .iter()
        .filter(|b| b.unsigned_area() > UNCOUNTED_BUILDING_AREA)
        .collect();
    let mut out = Vec::with_capacity(parcels.len());
    let (mut densified, mut kept) = (0usize, 0usize);
    for parcel in parcels {
        if !parcel.is_marked() {
            let mut p = parcel.clone();
            p.attributes.simulated = false;
            out.push(p);
            continue;
        }
        if parcel.area() <= profile.maximal_area {
            out.push(parcel.clone());
            continue;
        }
        let pieces = cut_parcel(parcel, road, buildings, profile, allow_isolated_parcel, rng)?;
        match pieces.and_then(|pieces| accept(pieces, &counted, profile.minimal_area)) {
            Some(pieces) => {
                densified += 1;
                out.extend(
                    pieces
                        .into_iter()
                        .enumerate()
                        .map(|(i, g)| simulated_piece(parcel, g, i)),
                );
            }
            None => {
                kept += 1;
                out.push(parcel.clone());
            }
        }
    }
    tracing::info!(
        densified,
        kept,
        parcels_in = parcels.len(),
        parcels_out = out.len(),
        "densification finished"
    );
    Ok(out)
}

fn cut_parcel<R: Rng + ?Sized>(
    parcel: &Parcel,
    road: &RoadReference,
    buildings: &[Polygon<f64>],
    profile: &UrbanFabricProfile,
    allow_isolated_parcel: bool,
    rng: &mut R,
) -> Result<Option<Vec<Polygon<f64>>>, ConfigError> {
    let flag = profile.flag_config();
    let mut leaves = Vec::new();
    let mut served = true;
    for part in &parcel.geometry.0 {
        let tree = flag_decompose(part.clone(), road, buildings, &flag, rng)?;
        served &= tree.leaves().len() > 1 && tree.leaves_of(NodeKind::Isolated).is_empty();
        leaves.extend(tree.leaf_polygons());
    }
    if served {
        return Ok(Some(leaves));
    }
    if !allow_isolated_parcel {
        tracing::debug!(number = %parcel.attributes.number, "flag cut left a piece without access");
        return Ok(None);
    }
    let cfg = ObbConfig {
        harmony_coeff: 0.5,
        ..profile.obb_config(true)
    };
    let mut leaves = Vec::new();
    for part in &parcel.geometry.0 {
        leaves.extend(decompose(part.clone(), road, &cfg, rng)?.leaf_polygons());
    }
    Ok(Some(leaves))
}

/// Final pieces of a cut, or `None` when the parcel should stay whole.
fn accept(
    pieces: Vec<Polygon<f64>>,
    buildings: &[&Polygon<f64>],
    minimal_area: f64,
) -> Option<Vec<MultiPolygon<f64>>> {
    if pieces.len() < 2 {
        return None;
    }
    if let Some(small) = pieces.iter().find(|p| p.unsigned_area() < minimal_area) {
        tracing::debug!(area = small.unsigned_area(), minimal_area, "cut rejected: piece too small");
        return None;
    }
    let (built, free): (Vec<Polygon<f64>>, Vec<Polygon<f64>>) = pieces
        .into_iter()
        .partition(|p| buildings.iter().any(|b| p.intersects(*b)));
    if free.is_empty() {
        tracing::debug!("cut rejected: every piece is built");
        return None;
    }
    let mut out = Vec::with_capacity(free.len() + 1);
    match built.len() {
        0 => {}
        1 => out.push(multi(&built[0])),
        _ => match union_all(built.iter().map(multi).collect()) {
            Ok(merged) => out.push(merged),
            Err(err) => {
                tracing::warn!(%err, "built pieces could not be fused; parcel kept whole");
                return None;
            }
        },
    }
    out.extend(free.iter().map(multi));
    Some(out)
}

/// Densify marked parcels below `factor * maximal_area`; consolidate the
/// larger ones into new neighborhoods.
///
/// Consolidation runs with streets as wide as lanes. Marks left on parcels
/// whose densification was rejected are cleared first.
pub fn densify_or_consolidate<R: Rng + ?Sized>(
    parcels: &[Parcel],
    road: &RoadReference,
    buildings: &[Polygon<f64>],
    profile: &UrbanFabricProfile,
    allow_isolated_parcel: bool,
    factor: f64,
    rng: &mut R,
) -> Result<Vec<Parcel>, ConfigError> {
    profile.validate()?;
    if !(factor.is_finite() && factor > 0.0) {
        return Err(ConfigError::invalid(format!(
            "large zone factor must be > 0 (got {factor})"
        )));
    }
    let threshold = profile.maximal_area * factor;
    let (large, small): (Vec<Parcel>, Vec<Parcel>) = parcels
        .iter()
        .cloned()
        .partition(|p| p.is_marked() && p.area() >= threshold);
    tracing::info!(large = large.len(), threshold, "parcels sent to consolidation");

    let mut staged = densify(&small, road, buildings, profile, allow_isolated_parcel, rng)?;
    for p in staged.iter_mut().filter(|p| p.is_marked()) {
        p.attributes.mark = Mark::Unset;
    }
    staged.extend(large);
    let neighborhood = UrbanFabricProfile {
        street_width: profile.lane_width,
        ..profile.clone()
    };
    consolidate(&staged, road, &neighborhood, rng)
}
