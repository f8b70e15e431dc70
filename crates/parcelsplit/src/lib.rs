//! Parcel subdivision engine.
//!
//! Recursive geometric splitters (oriented-bounding-box cuts and flag-lot
//! driveways), the road-access predicate they share, and a small-parcel
//! merger that cleans up their debris. Collection workflows and the
//! urban-fabric profile sit on top.
//!
//! API Policy
//! - The library never touches files and never installs a logger; callers
//!   own I/O and the `tracing` subscriber.
//! - All randomness comes from a caller-supplied `rand::Rng`; seed a
//!   `StdRng` for reproducible runs.
//! - Configuration is validated once at entry (`ConfigError`); geometry
//!   failures inside a recursion are logged and never abort it.

pub mod access;
pub mod error;
pub mod flag;
pub mod geometry;
pub mod mark;
pub mod merge;
pub mod obb;
pub mod parcel;
pub mod profile;
pub mod tree;
pub mod workflow;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use access::{has_road_access, RoadReference};
pub use error::{ConfigError, GeometryError};
pub use parcel::{Mark, Parcel, ParcelAttributes};
pub use profile::UrbanFabricProfile;
pub use tree::{DecompositionTree, NodeId, NodeKind};
pub use workflow::Strategy;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::access::{block_exterior, frontage_width, has_road_access, RoadReference};
    pub use crate::flag::{flag_decompose, generate_flag_parcel, FlagConfig, FlagOutcome};
    pub use crate::mark::{
        mark_all, mark_connected_to_road, mark_intersecting, mark_larger_than, mark_random,
        mark_smaller_than, mark_unbuilt,
    };
    pub use crate::merge::{merge, merge_undersized, MergeConfig};
    pub use crate::obb::{decompose, ObbConfig};
    pub use crate::parcel::{any_marked, Mark, Parcel, ParcelAttributes};
    pub use crate::profile::UrbanFabricProfile;
    pub use crate::tree::{DecompositionTree, NodeId, NodeKind};
    pub use crate::workflow::{
        block_reference, calibrated_decompose, consolidate, densify, densify_or_consolidate,
        split_marked, synthetic_parcels, synthetic_zone, zone_division, Strategy,
    };
}
