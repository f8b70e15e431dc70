//! Parcel records: geometry plus cadastral attributes.

use std::collections::BTreeMap;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::geometry::area;

/// Simulation mark carried by each parcel (wire codes -1 / 0 / 1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Mark {
    /// Never marked.
    #[default]
    Unset,
    /// Explicitly excluded; threshold markers keep it excluded.
    Skip,
    /// Selected for splitting.
    Split,
}

impl Mark {
    pub fn code(self) -> i64 {
        match self {
            Mark::Unset => -1,
            Mark::Skip => 0,
            Mark::Split => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Mark::Unset),
            0 => Some(Mark::Skip),
            1 => Some(Mark::Split),
            _ => None,
        }
    }
}

impl From<Mark> for i64 {
    fn from(m: Mark) -> i64 {
        m.code()
    }
}

impl TryFrom<i64> for Mark {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Mark::from_code(code).ok_or_else(|| format!("unknown mark code {code}"))
    }
}

/// Typed attribute record; `extra` carries fields the engine does not interpret.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelAttributes {
    pub community: String,
    pub section: String,
    pub number: String,
    pub mark: Mark,
    pub simulated: bool,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parcel {
    pub geometry: MultiPolygon<f64>,
    pub attributes: ParcelAttributes,
}

impl Parcel {
    pub fn new(geometry: MultiPolygon<f64>, attributes: ParcelAttributes) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    pub fn area(&self) -> f64 {
        area(&self.geometry)
    }

    pub fn is_marked(&self) -> bool {
        self.attributes.mark == Mark::Split
    }

    /// Same attributes, new geometry.
    pub fn with_geometry(&self, geometry: MultiPolygon<f64>) -> Self {
        Self {
            geometry,
            attributes: self.attributes.clone(),
        }
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.attributes.mark = mark;
        self
    }
}

/// `true` when at least one parcel carries `Mark::Split`.
pub fn any_marked(parcels: &[Parcel]) -> bool {
    parcels.iter().any(Parcel::is_marked)
}
