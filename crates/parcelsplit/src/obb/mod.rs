//! Oriented-bounding-box recursive splitter.
//!
//! Purpose
//! - Cut a polygon in two across its minimal bounding rectangle, recursively,
//!   until every piece is small enough or has too little road frontage to be
//!   worth cutting again.
//!
//! Model
//! - Stop when `area <= maximal_area`, or when the frontage is positive and
//!   at most `minimal_width_contact_road`.
//! - Each cut is computed by `split::splitting_polygons`. At shallow levels
//!   (`level < lane_level`) a road box of `lane_width` (`street_width` when
//!   `level < street_level`) is carved between the halves; its footprint is
//!   stored on the tree node and its outline extends the branch's road
//!   reference.
//! - With `force_street_access`, a first cut across the long side that leaves
//!   a half without road access is recomputed once with the harmony-aware
//!   axis choice, and that second cut is used.
//!
//! Why this design
//! - The runner owns the tree, the RNG and the config; each recursion call
//!   owns its polygon and its `RoadReference`, so siblings never observe each
//!   other's lanes.
//! - A geometry failure that survives the coarse-precision retry keeps the
//!   node as a leaf and logs a warning; it never aborts the decomposition.
//!
//! Code cross-refs: `access` (frontage, access), `geometry` (bounding box,
//! boolean ops), `workflow` (two-pass lane calibration).

pub mod split;

use geo::{Area, MultiPolygon, Polygon};
use rand::Rng;

use crate::access::{frontage_width, has_road_access, RoadReference};
use crate::error::{non_negative, ConfigError, GeometryError};
use crate::tree::{DecompositionTree, NodeId, NodeKind};

use split::{lane_footprint, split_by, splitting_polygons, CutParams};

/// Relative slack on the area stop test so exact halves of `2 * maximal_area` stop.
const AREA_SLACK: f64 = 1e-9;

/// Parameters of an OBB decomposition.
#[derive(Clone, Debug, PartialEq)]
pub struct ObbConfig {
    pub maximal_area: f64,
    pub minimal_width_contact_road: f64,
    pub irregularity_coeff: f64,
    pub harmony_coeff: f64,
    pub lane_width: f64,
    /// Lanes are carved while `level < lane_level`.
    pub lane_level: u32,
    /// Streets replace lanes while `level < street_level`.
    pub street_level: u32,
    pub street_width: f64,
    pub force_street_access: bool,
    /// Level assigned to the root polygon.
    pub start_level: u32,
    pub max_depth: u32,
}

impl Default for ObbConfig {
    fn default() -> Self {
        Self {
            maximal_area: 800.0,
            minimal_width_contact_road: 7.0,
            irregularity_coeff: 0.0,
            harmony_coeff: 0.5,
            lane_width: 5.0,
            lane_level: 0,
            street_level: 0,
            street_width: 10.0,
            force_street_access: true,
            start_level: 0,
            max_depth: 64,
        }
    }
}

impl ObbConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("maximal_area", self.maximal_area)?;
        if self.maximal_area <= 0.0 {
            return Err(ConfigError::invalid("maximal_area must be > 0"));
        }
        non_negative("minimal_width_contact_road", self.minimal_width_contact_road)?;
        non_negative("irregularity_coeff", self.irregularity_coeff)?;
        non_negative("harmony_coeff", self.harmony_coeff)?;
        if self.harmony_coeff > 1.0 {
            return Err(ConfigError::invalid("harmony_coeff must lie in [0, 1]"));
        }
        non_negative("lane_width", self.lane_width)?;
        non_negative("street_width", self.street_width)?;
        if self.max_depth == 0 {
            return Err(ConfigError::invalid("max_depth must be >= 1"));
        }
        Ok(())
    }

    /// Leaf test for a polygon of `area` with `frontage` metres of road contact.
    pub fn end_condition(&self, area: f64, frontage: f64) -> bool {
        area <= self.maximal_area * (1.0 + AREA_SLACK) + 1e-6
            || (frontage <= self.minimal_width_contact_road && frontage != 0.0)
    }

    /// Road box width to carve at `level`, if any.
    pub fn road_width_at(&self, level: u32) -> Option<f64> {
        if level >= self.lane_level {
            return None;
        }
        let w = if level < self.street_level {
            self.street_width
        } else {
            self.lane_width
        };
        (w > 0.0).then_some(w)
    }
}

/// Decompose `polygon` into a tree whose leaves satisfy the stop rule.
pub fn decompose<R: Rng + ?Sized>(
    polygon: Polygon<f64>,
    road: &RoadReference,
    cfg: &ObbConfig,
    rng: &mut R,
) -> Result<DecompositionTree, ConfigError> {
    cfg.validate()?;
    let mut runner = ObbRunner::new(cfg, polygon, rng);
    let root = runner.tree.root();
    runner.grow(root, road.clone());
    tracing::debug!(
        leaves = runner.tree.leaves().len(),
        depth = runner.tree.max_depth(),
        "obb decomposition finished"
    );
    Ok(runner.tree)
}

/// Outcome of one cut: pieces, carved road footprint, reference for the children.
struct Cut {
    pieces: Vec<Polygon<f64>>,
    lane: Option<MultiPolygon<f64>>,
    road: RoadReference,
}

/// Recursion state shared by every node of one decomposition.
struct ObbRunner<'a, R: Rng + ?Sized> {
    cfg: &'a ObbConfig,
    tree: DecompositionTree,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> ObbRunner<'a, R> {
    fn new(cfg: &'a ObbConfig, polygon: Polygon<f64>, rng: &'a mut R) -> Self {
        Self {
            cfg,
            tree: DecompositionTree::new(polygon, cfg.start_level),
            rng,
        }
    }

    fn grow(&mut self, id: NodeId, road: RoadReference) {
        let poly = self.tree.node(id).polygon.clone();
        let level = self.tree.node(id).level;
        let area = poly.unsigned_area();
        let frontage = frontage_width(&poly, &road).unwrap_or_else(|err| {
            tracing::warn!(%err, level, "frontage measurement failed; assuming none");
            0.0
        });
        if self.cfg.end_condition(area, frontage) {
            return;
        }
        if self.tree.depth(id) >= self.cfg.max_depth {
            tracing::warn!(level, area, "max depth reached; keeping polygon as a parcel");
            return;
        }

        let cut = match self.cut(&poly, level, &road) {
            Ok(Some(cut)) => cut,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%err, level, area, "split abandoned; keeping polygon as a parcel");
                return;
            }
        };
        if cut.pieces.len() < 2 || cut.pieces.iter().any(|p| p.unsigned_area() >= area) {
            tracing::debug!(level, area, pieces = cut.pieces.len(), "cut made no progress");
            return;
        }

        if let Some(lane) = cut.lane {
            self.tree.add_road(id, lane);
        }
        for piece in cut.pieces {
            let child = self.tree.push_child(id, piece, NodeKind::Parcel);
            self.grow(child, cut.road.clone());
        }
    }

    fn cut(
        &mut self,
        poly: &Polygon<f64>,
        level: u32,
        road: &RoadReference,
    ) -> Result<Option<Cut>, GeometryError> {
        let Some(first) = self.attempt(poly, level, road, true)? else {
            return Ok(None);
        };
        if !self.cfg.force_street_access
            || first.pieces.iter().all(|p| has_road_access(p, &first.road))
        {
            return Ok(Some(first));
        }
        tracing::debug!(level, "half without road access; cutting the other way");
        match self.attempt(poly, level, road, false) {
            Ok(Some(second)) => Ok(Some(second)),
            Ok(None) => Ok(Some(first)),
            Err(err) => {
                tracing::warn!(%err, level, "second cut failed; keeping the first");
                Ok(Some(first))
            }
        }
    }

    fn attempt(
        &mut self,
        poly: &Polygon<f64>,
        level: u32,
        road: &RoadReference,
        short_direction: bool,
    ) -> Result<Option<Cut>, GeometryError> {
        let params = CutParams {
            short_direction,
            harmony: self.cfg.harmony_coeff,
            irregularity: self.cfg.irregularity_coeff,
            road_width: self.cfg.road_width_at(level),
        };
        let Some(sp) = splitting_polygons(poly, params, &mut *self.rng) else {
            return Ok(None);
        };
        let pieces = split_by(poly, &sp.halves)?;
        let (lane, road) = match &sp.lane {
            Some(lane) => (
                Some(lane_footprint(poly, lane)?),
                road.with_polygon_outline(&MultiPolygon(vec![lane.clone()])),
            ),
            None => (None, road.clone()),
        };
        Ok(Some(Cut { pieces, lane, road }))
    }
}
