//! End-to-end runs through the public API.

use geo::{polygon, Area, Coord, LineString, MultiPolygon, Polygon};
use parcelsplit::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn square_parcel(x: f64, y: f64, side: f64, number: &str) -> Parcel {
    Parcel::new(
        MultiPolygon(vec![polygon![
            (x: x, y: y),
            (x: x + side, y: y),
            (x: x + side, y: y + side),
            (x: x, y: y + side),
        ]]),
        ParcelAttributes {
            community: "25056".into(),
            section: "AB".into(),
            number: number.into(),
            ..Default::default()
        },
    )
}

#[test]
fn rectangle_with_max_area_200_gives_four_parcels_on_the_boundary() {
    let p: Polygon<f64> = polygon![(x: 0.0, y: 0.0), (x: 40.0, y: 0.0), (x: 40.0, y: 20.0), (x: 0.0, y: 20.0)];
    let road = RoadReference::new(vec![p.exterior().clone()]);
    let cfg = ObbConfig {
        maximal_area: 200.0,
        minimal_width_contact_road: 0.0,
        irregularity_coeff: 0.0,
        ..ObbConfig::default()
    };
    let tree = decompose(p, &road, &cfg, &mut StdRng::seed_from_u64(0)).unwrap();
    let leaves = tree.leaf_polygons();
    assert_eq!(leaves.len(), 4);
    for l in &leaves {
        assert!((l.unsigned_area() - 200.0).abs() < 1e-6);
        assert!(has_road_access(l, &road));
    }
}

fn strip(x0: f64, y0: f64, x1: f64, y1: f64) -> Parcel {
    Parcel::new(
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]]),
        ParcelAttributes::default(),
    )
}

#[test]
fn three_slivers_and_two_lots_merge_into_two() {
    let parcels = vec![
        strip(0.0, 20.0, 5.0, 21.0),
        strip(0.0, 0.0, 25.0, 20.0),
        strip(25.0, 0.0, 50.0, 20.0),
        strip(30.0, 20.0, 35.0, 21.0),
        strip(44.0, 20.0, 49.0, 21.0),
    ];
    let out = merge(parcels, &MergeConfig { min_area: 50.0 }, &mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(out.len(), 2);
    let after: f64 = out.iter().map(Parcel::area).sum();
    assert!((after - 1015.0).abs() < 1e-6);
}

#[test]
fn synthetic_plan_densified_then_cleaned() {
    let mut rng = StdRng::seed_from_u64(2024);
    let plan = synthetic_parcels(30, &mut rng).unwrap();
    let zone_area = synthetic_zone().unsigned_area();

    let marked = mark_random(&plan, 1_000.0, 6, &mut rng);
    assert_eq!(marked.iter().filter(|p| p.is_marked()).count(), 6);

    let profile = UrbanFabricProfile {
        maximal_area: 2_000.0,
        minimal_area: 200.0,
        minimal_width_contact_road: 0.0,
        ..Default::default()
    };
    let road = block_reference(&marked, &[]);
    let split = split_marked(&marked, &road, &[], &profile, Strategy::Obb, false, &mut rng).unwrap();
    assert!(split.len() > plan.len());
    assert!(!any_marked(&split));
    assert_eq!(split.iter().filter(|p| !p.attributes.simulated).count(), plan.len() - 6);

    let cleaned = merge(split, &profile.merge_config(), &mut rng).unwrap();
    let total: f64 = cleaned.iter().map(Parcel::area).sum();
    assert!(total <= zone_area + 1.0);
    assert!(cleaned.iter().all(|p| p.area() >= 200.0 - 1e-6));
}

#[test]
fn flag_split_of_a_deep_lot_keeps_access() {
    let deep = square_parcel(0.0, 0.0, 60.0, "9").with_mark(Mark::Split);
    let road = RoadReference::new(vec![LineString(vec![
        Coord { x: -20.0, y: 0.0 },
        Coord { x: 80.0, y: 0.0 },
    ])]);
    let profile = UrbanFabricProfile {
        maximal_area: 1_000.0,
        minimal_area: 100.0,
        minimal_width_contact_road: 5.0,
        ..Default::default()
    };
    let out = split_marked(&[deep], &road, &[], &profile, Strategy::Flag, true, &mut StdRng::seed_from_u64(3))
        .unwrap();
    assert!(out.len() > 1);
    assert!(out.iter().all(|p| has_road_access(&p.geometry.0[0], &road)));
    let total: f64 = out.iter().map(Parcel::area).sum();
    assert!((total - 3_600.0).abs() < 1.0);
}

#[test]
fn consolidating_a_whole_block() {
    let grid: Vec<Parcel> = (0..4)
        .flat_map(|i| (0..4).map(move |j| (i, j)))
        .map(|(i, j)| square_parcel(i as f64 * 15.0, j as f64 * 15.0, 15.0, &format!("{i}{j}")))
        .collect();
    let marked = mark_all(&grid);
    let profile = UrbanFabricProfile {
        maximal_area: 600.0,
        minimal_area: 100.0,
        minimal_width_contact_road: 0.0,
        lane_width: 0.0,
        ..Default::default()
    };
    let out = consolidate(&marked, &RoadReference::default(), &profile, &mut StdRng::seed_from_u64(1)).unwrap();
    let total: f64 = out.iter().map(Parcel::area).sum();
    assert!((total - 3_600.0).abs() < 1.0);
    assert!(out.iter().all(|p| p.attributes.simulated && p.attributes.section == "0"));
    assert!(out.iter().all(|p| p.area() <= 600.0 + 1e-3));
    assert_eq!(out[0].attributes.community, "25056");
}
