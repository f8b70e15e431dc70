//! Zone division: cut the part of a parcel layer covered by zoning polygons.

use geo::{Area, Intersects, MultiPolygon, Polygon};
use rand::Rng;

use super::calibrated_decompose;
use crate::access::RoadReference;
use crate::error::ConfigError;
use crate::geometry::{difference, explode, intersection, multi, union_all, SLIVER_AREA};
use crate::merge::merge_undersized;
use crate::parcel::{Mark, Parcel, ParcelAttributes};
use crate::profile::UrbanFabricProfile;

/// Zone fragments at or below this area are ignored.
pub const ZONE_FRAGMENT_AREA: f64 = 5.0;

struct ZonePiece {
    polygon: Polygon<f64>,
    section: String,
    community: String,
}

/// Redraw the parcels covered by `zones`.
///
/// Parcels touching a zone are clipped: their part inside the zones is
/// pooled per zone and cut with OBB (lane calibration, no forced access);
/// their part outside keeps the original attributes. All of it then goes
/// through the small-parcel merger, and parcels away from every zone are
/// appended untouched. New parcels of the `n`-th zone (1-based) get section
/// `New<n>Section` and a running number.
///
/// The collection comes back unchanged when the zones cover nothing or less
/// than `minimal_area` in total.
pub fn zone_division<R: Rng + ?Sized>(
    zones: &[Polygon<f64>],
    parcels: &[Parcel],
    road: &RoadReference,
    profile: &UrbanFabricProfile,
    rng: &mut R,
) -> Result<Vec<Parcel>, ConfigError> {
    profile.validate()?;
    let zone_union = match union_all(zones.iter().map(multi).collect()) {
        Ok(u) => u,
        Err(err) => {
            tracing::warn!(%err, "zone union failed; collection unchanged");
            return Ok(parcels.to_vec());
        }
    };
    let (inside, saved): (Vec<&Parcel>, Vec<&Parcel>) = parcels
        .iter()
        .partition(|p| p.geometry.intersects(&zone_union));
    let covered = match union_all(inside.iter().map(|p| p.geometry.clone()).collect()) {
        Ok(u) => u,
        Err(err) => {
            tracing::warn!(%err, "parcel union failed; collection unchanged");
            return Ok(parcels.to_vec());
        }
    };

    let pieces = zone_pieces(zones, &covered, &inside);
    let total: f64 = pieces.iter().map(|z| z.polygon.unsigned_area()).sum();
    if pieces.is_empty() || total < profile.minimal_area {
        tracing::info!(zones = zones.len(), total, "no zone to cut; collection unchanged");
        return Ok(parcels.to_vec());
    }

    let mut staged = Vec::new();
    for piece in &pieces {
        let outline = multi(&piece.polygon);
        let reference = road.with_polygon_outline(&outline);
        let tree = calibrated_decompose(piece.polygon.clone(), &reference, profile, false, rng)?;
        for (number, leaf) in tree.leaf_polygons().into_iter().enumerate() {
            staged.push(Parcel::new(
                MultiPolygon(vec![leaf]),
                ParcelAttributes {
                    community: piece.community.clone(),
                    section: piece.section.clone(),
                    number: number.to_string(),
                    mark: Mark::Unset,
                    simulated: true,
                    ..Default::default()
                },
            ));
        }
    }
    let created = staged.len();
    for parcel in &inside {
        match difference(&parcel.geometry, &zone_union) {
            Ok(rest) => staged.extend(
                explode(rest, SLIVER_AREA)
                    .into_iter()
                    .map(|p| remainder(parcel, p)),
            ),
            Err(err) => tracing::warn!(%err, number = %parcel.attributes.number, "remainder dropped"),
        }
    }

    let mut out = merge_undersized(staged, profile.minimal_area, rng);
    let merged = out.len();
    out.extend(saved.into_iter().cloned());
    tracing::info!(
        zones = pieces.len(),
        created,
        after_merge = merged,
        total = out.len(),
        "zone division finished"
    );
    Ok(out)
}

fn zone_pieces(zones: &[Polygon<f64>], covered: &MultiPolygon<f64>, inside: &[&Parcel]) -> Vec<ZonePiece> {
    let mut out = Vec::new();
    for (i, zone) in zones.iter().enumerate() {
        let clipped = match intersection(&multi(zone), covered) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(%err, zone = i + 1, "zone clip failed; zone skipped");
                continue;
            }
        };
        for polygon in explode(clipped, ZONE_FRAGMENT_AREA) {
            let community = inside
                .iter()
                .find(|p| p.geometry.intersects(&polygon))
                .map(|p| p.attributes.community.clone())
                .unwrap_or_default();
            out.push(ZonePiece {
                polygon,
                section: format!("New{}Section", i + 1),
                community,
            });
        }
    }
    out
}

fn remainder(source: &Parcel, polygon: Polygon<f64>) -> Parcel {
    let mut p = source.with_geometry(MultiPolygon(vec![polygon]));
    p.attributes.simulated = false;
    p
}
