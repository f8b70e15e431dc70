//! Flag decomposition engine.
//!
//! Purpose
//! - Split a polygon like the OBB splitter (short-direction cuts, no lanes)
//!   and, when a cut leaves a piece without road access, give that piece a
//!   driveway ("flag pole") taken from an accessible neighbor.
//!
//! Model
//! - Stop when `area <= maximal_area` or `frontage <= maximal_width`.
//! - Candidate driveways follow runs of a neighbor's boundary that are
//!   neither shared with the landlocked piece nor on the road; shortest runs
//!   are tried first. A driveway is `buffer(run, driveway_width / 2)` and is
//!   rejected when it touches a building.
//! - Accepted: the donor loses the driveway, the landlocked piece gains it;
//!   every resulting fragment above `TOO_SMALL_PARCEL_AREA` must reach the
//!   road. Rejected everywhere: the piece is kept as `NodeKind::Isolated`.
//! - Grafted and isolated pieces are leaves; only accessible pieces recurse.
//!
//! Code cross-refs: `obb::split` (cut geometry), `access` (predicates).

mod candidates;
mod graft;

pub use candidates::{candidate_sides, regroup, CandidateSide, SIDE_TOLERANCE};
pub use graft::{generate_flag_parcel, FlagOutcome, TOO_SMALL_PARCEL_AREA};

use geo::{Area, Polygon};
use rand::Rng;

use crate::access::{frontage_width, has_road_access, RoadReference};
use crate::error::{non_negative, ConfigError};
use crate::obb::split::{split_by, splitting_polygons, CutParams};
use crate::tree::{DecompositionTree, NodeId, NodeKind};

/// Parameters of a flag decomposition.
#[derive(Clone, Debug, PartialEq)]
pub struct FlagConfig {
    pub maximal_area: f64,
    /// Frontage at or below which a polygon is not cut again.
    pub maximal_width: f64,
    /// Full width of a driveway; the run is buffered by half of it.
    pub driveway_width: f64,
    pub irregularity_coeff: f64,
    pub max_depth: u32,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            maximal_area: 800.0,
            maximal_width: 7.0,
            driveway_width: 3.0,
            irregularity_coeff: 0.0,
            max_depth: 64,
        }
    }
}

impl FlagConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("maximal_area", self.maximal_area)?;
        if self.maximal_area <= 0.0 {
            return Err(ConfigError::invalid("maximal_area must be > 0"));
        }
        non_negative("maximal_width", self.maximal_width)?;
        non_negative("driveway_width", self.driveway_width)?;
        if self.driveway_width == 0.0 {
            return Err(ConfigError::invalid("driveway_width must be > 0"));
        }
        non_negative("irregularity_coeff", self.irregularity_coeff)?;
        if self.max_depth == 0 {
            return Err(ConfigError::invalid("max_depth must be >= 1"));
        }
        Ok(())
    }

    pub fn end_condition(&self, area: f64, frontage: f64) -> bool {
        area <= self.maximal_area || frontage <= self.maximal_width
    }
}

/// Decompose `polygon`, grafting driveways onto landlocked pieces.
pub fn flag_decompose<R: Rng + ?Sized>(
    polygon: Polygon<f64>,
    road: &RoadReference,
    buildings: &[Polygon<f64>],
    cfg: &FlagConfig,
    rng: &mut R,
) -> Result<DecompositionTree, ConfigError> {
    cfg.validate()?;
    let mut runner = FlagRunner {
        cfg,
        road,
        buildings,
        tree: DecompositionTree::new(polygon, 0),
        rng,
    };
    let root = runner.tree.root();
    runner.grow(root);
    tracing::debug!(
        leaves = runner.tree.leaves().len(),
        flags = runner.tree.leaves_of(NodeKind::FlagParcel).len(),
        isolated = runner.tree.leaves_of(NodeKind::Isolated).len(),
        "flag decomposition finished"
    );
    Ok(runner.tree)
}

struct FlagRunner<'a, R: Rng + ?Sized> {
    cfg: &'a FlagConfig,
    road: &'a RoadReference,
    buildings: &'a [Polygon<f64>],
    tree: DecompositionTree,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> FlagRunner<'a, R> {
    fn grow(&mut self, id: NodeId) {
        let poly = self.tree.node(id).polygon.clone();
        let area = poly.unsigned_area();
        let frontage = frontage_width(&poly, self.road).unwrap_or_else(|err| {
            tracing::warn!(%err, "frontage measurement failed; assuming none");
            0.0
        });
        if self.cfg.end_condition(area, frontage) {
            return;
        }
        if self.tree.depth(id) >= self.cfg.max_depth {
            tracing::warn!(area, "max depth reached; keeping polygon as a parcel");
            return;
        }

        let params = CutParams {
            short_direction: true,
            harmony: 0.0,
            irregularity: self.cfg.irregularity_coeff,
            road_width: None,
        };
        let Some(sp) = splitting_polygons(&poly, params, &mut *self.rng) else {
            return;
        };
        let pieces = match split_by(&poly, &sp.halves) {
            Ok(pieces) => pieces,
            Err(err) => {
                tracing::warn!(%err, area, "split abandoned; keeping polygon as a parcel");
                return;
            }
        };
        if pieces.len() < 2 || pieces.iter().any(|p| p.unsigned_area() >= area) {
            return;
        }

        if pieces.iter().all(|p| has_road_access(p, self.road)) {
            for p in pieces {
                let child = self.tree.push_child(id, p, NodeKind::Parcel);
                self.grow(child);
            }
            return;
        }

        let out = generate_flag_parcel(pieces, self.road, self.buildings, self.cfg.driveway_width);
        for d in out.driveways {
            self.tree.add_driveway(id, d);
        }
        for p in out.grafted {
            self.tree.push_child(id, p, NodeKind::FlagParcel);
        }
        for p in out.isolated {
            self.tree.push_child(id, p, NodeKind::Isolated);
        }
        for p in out.accessible {
            let child = self.tree.push_child(id, p, NodeKind::Parcel);
            self.grow(child);
        }
    }
}

#[cfg(test)]
mod tests;
