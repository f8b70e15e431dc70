//! Synthetic parcel plan on a fixed three-region zone.

use geo::{polygon, MultiPolygon};
use rand::Rng;

use crate::access::RoadReference;
use crate::error::ConfigError;
use crate::geometry::area;
use crate::obb::{decompose, ObbConfig};
use crate::parcel::{Parcel, ParcelAttributes};

/// Triangle `(0 0, 1000 0, 500 1000)` cut into three regions meeting at `(500 333)`.
pub fn synthetic_zone() -> MultiPolygon<f64> {
    MultiPolygon(vec![
        polygon![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0), (x: 500.0, y: 333.0)],
        polygon![(x: 0.0, y: 0.0), (x: 500.0, y: 333.0), (x: 500.0, y: 1000.0)],
        polygon![(x: 500.0, y: 1000.0), (x: 500.0, y: 333.0), (x: 1000.0, y: 0.0)],
    ])
}

/// Decompose every region of `synthetic_zone()` into about `approx_count`
/// parcels in total.
///
/// Region outlines act as roads. Parcels are tagged with section = region
/// index (from 1) and a running number inside the region.
pub fn synthetic_parcels<R: Rng + ?Sized>(
    approx_count: usize,
    rng: &mut R,
) -> Result<Vec<Parcel>, ConfigError> {
    if approx_count == 0 {
        return Err(ConfigError::invalid("approx_count must be >= 1"));
    }
    let zone = synthetic_zone();
    let cfg = ObbConfig {
        maximal_area: area(&zone) / approx_count as f64,
        minimal_width_contact_road: 0.0,
        irregularity_coeff: 0.5,
        harmony_coeff: 0.5,
        lane_width: 0.0,
        lane_level: 0,
        street_level: 0,
        street_width: 0.0,
        force_street_access: false,
        start_level: 0,
        max_depth: 64,
    };
    let road = RoadReference::default().with_polygon_outline(&zone);
    let mut out = Vec::new();
    for (region, poly) in zone.0.iter().enumerate() {
        let tree = decompose(poly.clone(), &road, &cfg, rng)?;
        for (number, leaf) in tree.leaf_polygons().into_iter().enumerate() {
            out.push(Parcel::new(
                MultiPolygon(vec![leaf]),
                ParcelAttributes {
                    community: "synthetic".into(),
                    section: (region + 1).to_string(),
                    number: number.to_string(),
                    simulated: true,
                    ..Default::default()
                },
            ));
        }
    }
    tracing::info!(
        parcels = out.len(),
        maximal_area = cfg.maximal_area,
        "synthetic zone generated"
    );
    Ok(out)
}
