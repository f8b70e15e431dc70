//! Parcel selection: set `Mark::Split` on the parcels a workflow should touch.
//!
//! Threshold markers combine like filters: a parcel already `Skip` stays
//! `Skip`, a parcel that fails the test becomes `Skip`, and a parcel that
//! passes becomes `Split`. Chaining two markers therefore selects the
//! parcels that pass both.

use geo::{Intersects, Polygon};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::access::{multi_has_road_access, RoadReference};
use crate::parcel::{Mark, Parcel};

fn mark_where(parcels: &[Parcel], pred: impl Fn(&Parcel) -> bool) -> Vec<Parcel> {
    parcels
        .iter()
        .map(|p| {
            let pass = p.attributes.mark != Mark::Skip && pred(p);
            p.clone().with_mark(if pass { Mark::Split } else { Mark::Skip })
        })
        .collect()
}

pub fn mark_all(parcels: &[Parcel]) -> Vec<Parcel> {
    parcels.iter().map(|p| p.clone().with_mark(Mark::Split)).collect()
}

/// Mark parcels with `area > threshold`.
pub fn mark_larger_than(parcels: &[Parcel], threshold: f64) -> Vec<Parcel> {
    mark_where(parcels, |p| p.area() > threshold)
}

/// Mark parcels with `area <= threshold`.
pub fn mark_smaller_than(parcels: &[Parcel], threshold: f64) -> Vec<Parcel> {
    mark_where(parcels, |p| p.area() <= threshold)
}

/// Mark parcels that reach the road reference.
pub fn mark_connected_to_road(parcels: &[Parcel], road: &RoadReference) -> Vec<Parcel> {
    mark_where(parcels, |p| multi_has_road_access(&p.geometry, road))
}

/// Mark parcels intersecting any of `zones`.
pub fn mark_intersecting(parcels: &[Parcel], zones: &[Polygon<f64>]) -> Vec<Parcel> {
    mark_where(parcels, |p| zones.iter().any(|z| p.geometry.intersects(z)))
}

/// Mark parcels no building touches.
pub fn mark_unbuilt(parcels: &[Parcel], buildings: &[Polygon<f64>]) -> Vec<Parcel> {
    mark_where(parcels, |p| !buildings.iter().any(|b| p.geometry.intersects(b)))
}

/// Mark `count` parcels drawn at random among those with `area > min_area`.
pub fn mark_random<R: Rng + ?Sized>(
    parcels: &[Parcel],
    min_area: f64,
    count: usize,
    rng: &mut R,
) -> Vec<Parcel> {
    let mut eligible: Vec<usize> = parcels
        .iter()
        .enumerate()
        .filter(|(_, p)| p.attributes.mark != Mark::Skip && p.area() > min_area)
        .map(|(i, _)| i)
        .collect();
    eligible.shuffle(rng);
    eligible.truncate(count);
    let mut chosen = vec![false; parcels.len()];
    for i in eligible {
        chosen[i] = true;
    }
    parcels
        .iter()
        .zip(chosen)
        .map(|(p, c)| p.clone().with_mark(if c { Mark::Split } else { Mark::Skip }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parcel::ParcelAttributes;
    use geo::{polygon, Coord, LineString, MultiPolygon};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sq(x: f64, side: f64) -> Parcel {
        Parcel::new(
            MultiPolygon(vec![polygon![
                (x: x, y: 0.0),
                (x: x + side, y: 0.0),
                (x: x + side, y: side),
                (x: x, y: side),
            ]]),
            ParcelAttributes::default(),
        )
    }

    fn marks(ps: &[Parcel]) -> Vec<Mark> {
        ps.iter().map(|p| p.attributes.mark).collect()
    }

    #[test]
    fn thresholds_chain_as_filters() {
        let ps = vec![sq(0.0, 5.0), sq(10.0, 20.0), sq(40.0, 40.0)];
        let big = mark_larger_than(&ps, 100.0);
        assert_eq!(marks(&big), vec![Mark::Skip, Mark::Split, Mark::Split]);
        let band = mark_smaller_than(&big, 500.0);
        assert_eq!(marks(&band), vec![Mark::Skip, Mark::Split, Mark::Skip]);
    }

    #[test]
    fn road_marker_uses_access_predicate() {
        let ps = vec![sq(0.0, 10.0), Parcel::new(
            MultiPolygon(vec![polygon![(x: 0.0, y: 20.0), (x: 10.0, y: 20.0), (x: 10.0, y: 30.0), (x: 0.0, y: 30.0)]]),
            ParcelAttributes::default(),
        )];
        let road = RoadReference::new(vec![LineString(vec![Coord { x: -5.0, y: 0.0 }, Coord { x: 50.0, y: 0.0 }])]);
        assert_eq!(marks(&mark_connected_to_road(&ps, &road)), vec![Mark::Split, Mark::Skip]);
    }

    #[test]
    fn random_marker_picks_requested_count() {
        let ps: Vec<Parcel> = (0..10).map(|k| sq(k as f64 * 20.0, 10.0)).collect();
        let mut rng = StdRng::seed_from_u64(4);
        let out = mark_random(&ps, 50.0, 3, &mut rng);
        assert_eq!(out.iter().filter(|p| p.is_marked()).count(), 3);
        let none = mark_random(&ps, 500.0, 3, &mut rng);
        assert!(!crate::parcel::any_marked(&none));
    }

    #[test]
    fn built_parcels_are_skipped() {
        let ps = vec![sq(0.0, 10.0), sq(20.0, 10.0)];
        let house = polygon![(x: 2.0, y: 2.0), (x: 4.0, y: 2.0), (x: 4.0, y: 4.0), (x: 2.0, y: 4.0)];
        assert_eq!(marks(&mark_unbuilt(&ps, &[house])), vec![Mark::Skip, Mark::Split]);
        assert_eq!(marks(&mark_all(&ps)), vec![Mark::Split, Mark::Split]);
    }
}
