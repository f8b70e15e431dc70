//! Consolidation: redraw the parcels of contiguous marked areas.

use geo::{Intersects, MultiPolygon, Polygon};
use rand::Rng;

use super::calibrated_decompose;
use crate::access::RoadReference;
use crate::error::ConfigError;
use crate::geometry::{area, explode, multi, union_all, SLIVER_AREA};
use crate::merge::merge_undersized;
use crate::parcel::{any_marked, Mark, Parcel, ParcelAttributes};
use crate::profile::UrbanFabricProfile;

/// Fuse the marked parcels into islets and cut each islet anew.
///
/// Islets above `maximal_area` are decomposed with OBB and forced street
/// access against `road` plus the islet outline; the new parcels are merged
/// with `minimal_area`, then the unmarked parcels are appended untouched.
/// New parcels carry the community of the first marked parcel touching
/// their islet and the islet index as section.
pub fn consolidate<R: Rng + ?Sized>(
    parcels: &[Parcel],
    road: &RoadReference,
    profile: &UrbanFabricProfile,
    rng: &mut R,
) -> Result<Vec<Parcel>, ConfigError> {
    profile.validate()?;
    if !any_marked(parcels) {
        return Ok(parcels.to_vec());
    }
    let (marked, saved): (Vec<&Parcel>, Vec<&Parcel>) =
        parcels.iter().partition(|p| p.is_marked());
    let union = match union_all(marked.iter().map(|p| p.geometry.clone()).collect()) {
        Ok(u) => u,
        Err(err) => {
            tracing::warn!(%err, "islet union failed; collection unchanged");
            return Ok(parcels.to_vec());
        }
    };
    let islets = explode(union, SLIVER_AREA);

    let mut fresh = Vec::new();
    for (index, islet) in islets.iter().enumerate() {
        let community = marked
            .iter()
            .find(|p| p.geometry.intersects(islet))
            .map(|p| p.attributes.community.clone())
            .unwrap_or_default();
        for (number, piece) in cut_islet(islet, road, profile, rng)?.into_iter().enumerate() {
            fresh.push(Parcel::new(
                MultiPolygon(vec![piece]),
                ParcelAttributes {
                    community: community.clone(),
                    section: index.to_string(),
                    number: number.to_string(),
                    mark: Mark::Unset,
                    simulated: true,
                    ..Default::default()
                },
            ));
        }
    }
    let created = fresh.len();
    let mut out = merge_undersized(fresh, profile.minimal_area, rng);
    let merged = out.len();
    out.extend(saved.into_iter().cloned());
    tracing::info!(
        islets = islets.len(),
        created,
        after_merge = merged,
        total = out.len(),
        "consolidation finished"
    );
    Ok(out)
}

fn cut_islet<R: Rng + ?Sized>(
    islet: &Polygon<f64>,
    road: &RoadReference,
    profile: &UrbanFabricProfile,
    rng: &mut R,
) -> Result<Vec<Polygon<f64>>, ConfigError> {
    let outline = multi(islet);
    if area(&outline) <= profile.maximal_area {
        return Ok(vec![islet.clone()]);
    }
    let reference = road.with_polygon_outline(&outline);
    let tree = calibrated_decompose(islet.clone(), &reference, profile, true, rng)?;
    Ok(tree.leaf_polygons())
}
