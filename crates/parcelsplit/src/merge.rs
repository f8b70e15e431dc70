//! Small-parcel merger.
//!
//! Purpose
//! - Repair decomposition debris: every parcel under `min_area` is fused into
//!   the neighbor it shares the most boundary with, or dropped (left as
//!   public space) when it has no neighbor.
//!
//! Model
//! - One pass visits parcels by increasing area (ties broken by a jitter below
//!   1e-6 drawn from the caller's RNG). A neighbor that already absorbed a
//!   parcel during the pass is not used again; the small parcel waits for the
//!   next pass.
//! - Passes repeat until the parcel count stops changing.
//! - Output order is stable: untouched parcels keep their position and a
//!   merged parcel takes the position of the neighbor that absorbed it, so
//!   merging a converged collection returns it unchanged.

use geo::{Intersects, MultiPolygon};
use rand::Rng;

use crate::error::{non_negative, ConfigError, GeometryError};
use crate::geometry::{area, buffer_multi_polygon, intersection, union};
use crate::parcel::Parcel;

/// Width of the band around a small parcel used to rank its neighbors.
const CONTACT_BAND: f64 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct MergeConfig {
    pub min_area: f64,
}

impl MergeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("min_area", self.min_area)
    }
}

/// Validate `cfg` and merge.
pub fn merge<R: Rng + ?Sized>(
    parcels: Vec<Parcel>,
    cfg: &MergeConfig,
    rng: &mut R,
) -> Result<Vec<Parcel>, ConfigError> {
    cfg.validate()?;
    Ok(merge_undersized(parcels, cfg.min_area, rng))
}

/// Fuse or drop every parcel smaller than `min_area`; attributes of the
/// absorbing neighbor win.
pub fn merge_undersized<R: Rng + ?Sized>(parcels: Vec<Parcel>, min_area: f64, rng: &mut R) -> Vec<Parcel> {
    let mut slots: Vec<Option<Parcel>> = parcels.into_iter().map(Some).collect();
    let mut count = live(&slots);
    let mut passes = 0usize;
    loop {
        merge_pass(&mut slots, min_area, rng);
        passes += 1;
        let next = live(&slots);
        if next == count {
            break;
        }
        count = next;
    }
    tracing::debug!(passes, parcels = count, "merge converged");
    slots.into_iter().flatten().collect()
}

fn live(slots: &[Option<Parcel>]) -> usize {
    slots.iter().filter(|s| s.is_some()).count()
}

fn merge_pass<R: Rng + ?Sized>(slots: &mut [Option<Parcel>], min_area: f64, rng: &mut R) {
    let mut order: Vec<(f64, usize)> = slots
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.as_ref().map(|p| (p.area() + rng.gen::<f64>() / 1e6, i)))
        .collect();
    order.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut absorbed_into = vec![false; slots.len()];
    for (_, i) in order {
        if absorbed_into[i] {
            continue;
        }
        let Some(small) = slots[i].as_ref() else {
            continue;
        };
        if small.area() >= min_area {
            continue;
        }
        let target = match best_neighbor(slots, i) {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(%err, "neighbor ranking failed; parcel kept as is");
                continue;
            }
        };
        let Some(j) = target else {
            tracing::debug!(area = small.area(), "isolated small parcel dropped");
            slots[i] = None;
            continue;
        };
        if absorbed_into[j] {
            continue;
        }
        let (Some(a), Some(b)) = (slots[j].as_ref(), slots[i].as_ref()) else {
            continue;
        };
        match union(&a.geometry, &b.geometry) {
            Ok(geometry) => {
                slots[j] = slots[j].take().map(|p| Parcel { geometry, ..p });
                slots[i] = None;
                absorbed_into[j] = true;
            }
            Err(err) => tracing::warn!(%err, "union failed; small parcel kept"),
        }
    }
}

/// Index of the intersecting parcel with the largest overlap with the
/// contact band around `slots[i]`.
fn best_neighbor(
    slots: &[Option<Parcel>],
    i: usize,
) -> Result<Option<usize>, GeometryError> {
    let Some(small) = slots[i].as_ref() else {
        return Ok(None);
    };
    let band: MultiPolygon<f64> = buffer_multi_polygon(&small.geometry, CONTACT_BAND)?;
    let mut best: Option<(f64, usize)> = None;
    for (j, other) in slots.iter().enumerate() {
        let Some(other) = other else { continue };
        if j == i || !other.geometry.intersects(&small.geometry) {
            continue;
        }
        let shared = area(&intersection(&other.geometry, &band)?);
        if best.map_or(true, |(b, _)| shared > b) {
            best = Some((shared, j));
        }
    }
    Ok(best.map(|(_, j)| j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parcel::ParcelAttributes;
    use geo::polygon;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parcel(x0: f64, y0: f64, x1: f64, y1: f64, number: &str) -> Parcel {
        Parcel::new(
            MultiPolygon(vec![polygon![
                (x: x0, y: y0),
                (x: x1, y: y0),
                (x: x1, y: y1),
                (x: x0, y: y1),
            ]]),
            ParcelAttributes {
                number: number.into(),
                ..Default::default()
            },
        )
    }

    fn block() -> Vec<Parcel> {
        vec![
            parcel(0.0, 20.0, 5.0, 21.0, "s1"),
            parcel(0.0, 0.0, 25.0, 20.0, "A"),
            parcel(22.5, 20.0, 27.5, 21.0, "s2"),
            parcel(25.0, 0.0, 50.0, 20.0, "B"),
            parcel(45.0, 20.0, 50.0, 21.0, "s3"),
        ]
    }

    #[test]
    fn three_slivers_fold_into_two_parcels() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = merge_undersized(block(), 50.0, &mut rng);
        assert_eq!(out.len(), 2);
        let total: f64 = out.iter().map(Parcel::area).sum();
        assert!((total - 1015.0).abs() < 1e-6);
        let names: Vec<&str> = out.iter().map(|p| p.attributes.number.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    fn triangle(a: (f64, f64), b: (f64, f64), c: (f64, f64), number: &str) -> Parcel {
        Parcel::new(
            MultiPolygon(vec![polygon![(x: a.0, y: a.1), (x: b.0, y: b.1), (x: c.0, y: c.1)]]),
            ParcelAttributes {
                number: number.into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn mutually_touching_slivers_end_in_two_parcels() {
        // Every parcel meets the others at (25, 20).
        let parcels = vec![
            parcel(0.0, 0.0, 25.0, 20.0, "A"),
            parcel(25.0, 0.0, 50.0, 20.0, "B"),
            triangle((25.0, 20.0), (20.0, 20.0), (22.5, 22.0), "s1"),
            triangle((25.0, 20.0), (22.5, 22.0), (27.5, 22.0), "s2"),
            triangle((25.0, 20.0), (27.5, 22.0), (30.0, 20.0), "s3"),
        ];
        let areas: Vec<f64> = parcels.iter().map(Parcel::area).collect();
        assert_eq!(areas, vec![500.0, 500.0, 5.0, 5.0, 5.0]);
        for seed in 0..4 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = merge(parcels.clone(), &MergeConfig { min_area: 50.0 }, &mut rng).unwrap();
            assert_eq!(out.len(), 2, "seed {seed}");
            let total: f64 = out.iter().map(Parcel::area).sum();
            assert!((total - 1015.0).abs() < 1e-3, "seed {seed}: {total}");
            assert!(out.iter().all(|p| p.area() >= 50.0));
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(9);
        let once = merge_undersized(block(), 50.0, &mut rng);
        let twice = merge_undersized(once.clone(), 50.0, &mut rng);
        assert_eq!(once, twice);
    }

    #[test]
    fn lonely_small_parcel_is_dropped() {
        let mut rng = StdRng::seed_from_u64(0);
        let out = merge_undersized(
            vec![parcel(0.0, 0.0, 30.0, 30.0, "big"), parcel(100.0, 100.0, 102.0, 102.0, "far")],
            50.0,
            &mut rng,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].attributes.number, "big");
    }

    #[test]
    fn neighbor_with_longest_contact_wins() {
        // The sliver shares 4 units with "left" and 1 unit with "right".
        let mut rng = StdRng::seed_from_u64(0);
        let out = merge_undersized(
            vec![
                parcel(0.0, 0.0, 10.0, 10.0, "left"),
                parcel(10.0, 0.0, 20.0, 10.0, "right"),
                parcel(6.0, 10.0, 11.0, 11.0, "sliver"),
            ],
            20.0,
            &mut rng,
        );
        assert_eq!(out.len(), 2);
        assert!((out[0].area() - 105.0).abs() < 1e-6);
        assert!((out[1].area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(merge(block(), &MergeConfig { min_area: -1.0 }, &mut rng).is_err());
    }
}
