//! Collection workflows: apply a splitter to every marked parcel.
//!
//! Purpose
//! - Turn a parcel collection plus marks into a new collection: marked
//!   parcels are replaced by the leaves of their decomposition, the rest pass
//!   through.
//!
//! Model
//! - `split_marked` decomposes each polygon part of a marked parcel with the
//!   selected `Strategy`. Leaves copy the source attributes with
//!   `simulated = true`, `mark = Unset` and `number` suffixed by `-<leaf>`.
//! - The OBB strategy is calibrated in two passes (`calibrated_decompose`):
//!   a first run without lanes yields the median leaf depth `m`; the final run
//!   carves lanes while `level < m - block_shape` and streets while
//!   `level < m - street_lane`.
//! - `consolidate` (in `consolidate.rs`), `densify` and
//!   `densify_or_consolidate` (in `densify.rs`), `zone_division` (in
//!   `zone.rs`) and the synthetic zone generator (in `synthetic.rs`) build on
//!   the same pieces.
//!
//! Code cross-refs: `obb::decompose`, `flag::flag_decompose`,
//! `merge::merge_undersized`, `profile::UrbanFabricProfile`.

mod consolidate;
mod densify;
mod synthetic;
mod zone;

pub use consolidate::consolidate;
pub use densify::{densify, densify_or_consolidate, UNCOUNTED_BUILDING_AREA};
pub use synthetic::{synthetic_parcels, synthetic_zone};
pub use zone::{zone_division, ZONE_FRAGMENT_AREA};

use std::fmt;
use std::str::FromStr;

use geo::{LineString, MultiPolygon, Polygon};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::access::{block_exterior, RoadReference};
use crate::error::ConfigError;
use crate::flag::flag_decompose;
use crate::obb::{decompose, ObbConfig};
use crate::parcel::{any_marked, Mark, Parcel};
use crate::profile::UrbanFabricProfile;
use crate::tree::DecompositionTree;

/// Splitter applied to marked parcels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Obb,
    Flag,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Obb => write!(f, "obb"),
            Strategy::Flag => write!(f, "flag"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "obb" => Ok(Strategy::Obb),
            "flag" => Ok(Strategy::Flag),
            other => Err(format!("unknown strategy '{other}' (expected obb or flag)")),
        }
    }
}

/// Road network plus the outline of the block formed by `parcels`.
///
/// If the block union fails the roads alone are used.
pub fn block_reference(parcels: &[Parcel], roads: &[LineString<f64>]) -> RoadReference {
    let geoms: Vec<MultiPolygon<f64>> = parcels.iter().map(|p| p.geometry.clone()).collect();
    match block_exterior(&geoms) {
        Ok(exterior) => RoadReference::from_parts(roads, &exterior),
        Err(err) => {
            tracing::warn!(%err, "block exterior failed; using roads only");
            RoadReference::new(roads.to_vec())
        }
    }
}

/// OBB decomposition with lane levels derived from a lane-free first run.
pub fn calibrated_decompose<R: Rng + ?Sized>(
    polygon: Polygon<f64>,
    road: &RoadReference,
    profile: &UrbanFabricProfile,
    force_street_access: bool,
    rng: &mut R,
) -> Result<DecompositionTree, ConfigError> {
    let base = profile.obb_config(force_street_access);
    let draft = decompose(polygon.clone(), road, &base, rng)?;
    let median = draft.median_leaf_depth();
    let cfg = ObbConfig {
        lane_level: median.saturating_sub(profile.block_shape),
        street_level: median.saturating_sub(profile.street_lane),
        ..base
    };
    tracing::debug!(
        median,
        lane_level = cfg.lane_level,
        street_level = cfg.street_level,
        "lane levels calibrated"
    );
    if cfg.lane_level == 0 {
        return Ok(draft);
    }
    decompose(polygon, road, &cfg, rng)
}

/// Replace every marked parcel by the leaves of its decomposition.
///
/// Returns the input unchanged when nothing is marked.
pub fn split_marked<R: Rng + ?Sized>(
    parcels: &[Parcel],
    road: &RoadReference,
    buildings: &[Polygon<f64>],
    profile: &UrbanFabricProfile,
    strategy: Strategy,
    force_street_access: bool,
    rng: &mut R,
) -> Result<Vec<Parcel>, ConfigError> {
    profile.validate()?;
    if !any_marked(parcels) {
        tracing::info!(parcels = parcels.len(), "no marked parcel; collection unchanged");
        return Ok(parcels.to_vec());
    }
    let mut out = Vec::with_capacity(parcels.len());
    let mut split = 0usize;
    for parcel in parcels {
        if !parcel.is_marked() {
            let mut kept = parcel.clone();
            kept.attributes.simulated = false;
            out.push(kept);
            continue;
        }
        let mut leaves = Vec::new();
        for part in &parcel.geometry.0 {
            let tree = match strategy {
                Strategy::Obb => {
                    calibrated_decompose(part.clone(), road, profile, force_street_access, rng)?
                }
                Strategy::Flag => {
                    flag_decompose(part.clone(), road, buildings, &profile.flag_config(), rng)?
                }
            };
            leaves.extend(tree.leaf_polygons());
        }
        split += 1;
        out.extend(
            leaves
                .into_iter()
                .enumerate()
                .map(|(i, leaf)| simulated_piece(parcel, MultiPolygon(vec![leaf]), i)),
        );
    }
    tracing::info!(
        %strategy,
        split,
        parcels_in = parcels.len(),
        parcels_out = out.len(),
        "marked parcels split"
    );
    Ok(out)
}

/// Piece `index` of `source`: its attributes, numbered `<number>-<index>`.
fn simulated_piece(source: &Parcel, geometry: MultiPolygon<f64>, index: usize) -> Parcel {
    let mut p = source.with_geometry(geometry);
    p.attributes.number = format!("{}-{}", source.attributes.number, index);
    p.attributes.mark = Mark::Unset;
    p.attributes.simulated = true;
    p
}
