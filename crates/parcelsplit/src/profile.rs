//! Urban-fabric profile: the user-facing parameter set.
//!
//! One profile describes the parcels a kind of urban fabric should end up
//! with (area bounds, frontage, road widths). Engine configs are derived
//! from it; `validate()` runs once before any recursion.

use serde::{Deserialize, Serialize};

use crate::error::{non_negative, ConfigError};
use crate::flag::FlagConfig;
use crate::merge::MergeConfig;
use crate::obb::ObbConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UrbanFabricProfile {
    /// Parcels at or below this area are not cut again.
    pub maximal_area: f64,
    /// Parcels below this area are merged into a neighbor.
    pub minimal_area: f64,
    pub minimal_width_contact_road: f64,
    pub harmony_coeff: f64,
    pub irregularity_coeff: f64,
    pub lane_width: f64,
    /// Levels above the median leaf depth at which streets replace lanes.
    pub street_lane: u32,
    pub street_width: f64,
    /// Deepest levels (counted up from the median leaf depth) without lanes.
    pub block_shape: u32,
    pub driveway_width: f64,
    pub max_depth: u32,
}

impl Default for UrbanFabricProfile {
    fn default() -> Self {
        Self {
            maximal_area: 800.0,
            minimal_area: 100.0,
            minimal_width_contact_road: 7.0,
            harmony_coeff: 0.5,
            irregularity_coeff: 0.0,
            lane_width: 5.0,
            street_lane: 2,
            street_width: 10.0,
            block_shape: 3,
            driveway_width: 3.0,
            max_depth: 64,
        }
    }
}

impl UrbanFabricProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, v) in [
            ("maximalArea", self.maximal_area),
            ("minimalArea", self.minimal_area),
            ("minimalWidthContactRoad", self.minimal_width_contact_road),
            ("harmonyCoeff", self.harmony_coeff),
            ("irregularityCoeff", self.irregularity_coeff),
            ("laneWidth", self.lane_width),
            ("streetWidth", self.street_width),
            ("drivewayWidth", self.driveway_width),
        ] {
            non_negative(name, v)?;
        }
        if self.maximal_area <= 0.0 {
            return Err(ConfigError::invalid("maximalArea must be > 0"));
        }
        if self.minimal_area > self.maximal_area {
            return Err(ConfigError::invalid(format!(
                "minimalArea ({}) exceeds maximalArea ({})",
                self.minimal_area, self.maximal_area
            )));
        }
        if self.harmony_coeff > 1.0 {
            return Err(ConfigError::invalid("harmonyCoeff must lie in [0, 1]"));
        }
        if self.driveway_width == 0.0 {
            return Err(ConfigError::invalid("drivewayWidth must be > 0"));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::invalid("maxDepth must be >= 1"));
        }
        Ok(())
    }

    /// OBB parameters without lanes; lane levels are set by calibration.
    pub fn obb_config(&self, force_street_access: bool) -> ObbConfig {
        ObbConfig {
            maximal_area: self.maximal_area,
            minimal_width_contact_road: self.minimal_width_contact_road,
            irregularity_coeff: self.irregularity_coeff,
            harmony_coeff: self.harmony_coeff,
            lane_width: self.lane_width,
            lane_level: 0,
            street_level: 0,
            street_width: self.street_width,
            force_street_access,
            start_level: 0,
            max_depth: self.max_depth,
        }
    }

    pub fn flag_config(&self) -> FlagConfig {
        FlagConfig {
            maximal_area: self.maximal_area,
            maximal_width: self.minimal_width_contact_road,
            driveway_width: self.driveway_width,
            irregularity_coeff: self.irregularity_coeff,
            max_depth: self.max_depth,
        }
    }

    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            min_area: self.minimal_area,
        }
    }
}
