use super::*;
use geo::{polygon, Coord, Line, LineString};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
}

fn street(x0: f64, x1: f64) -> RoadReference {
    RoadReference::new(vec![LineString(vec![
        Coord { x: x0, y: 0.0 },
        Coord { x: x1, y: 0.0 },
    ])])
}

#[test]
fn landlocked_piece_gets_a_driveway() {
    let donor = rect(0.0, 0.0, 40.0, 20.0);
    let landlocked = rect(0.0, 20.0, 40.0, 40.0);
    let road = street(0.0, 40.0);
    let out = generate_flag_parcel(vec![donor, landlocked], &road, &[], 3.0);
    assert_eq!(out.grafted.len(), 1);
    assert_eq!(out.accessible.len(), 1);
    assert!(out.isolated.is_empty());
    assert_eq!(out.driveways.len(), 1);

    let g = &out.grafted[0];
    assert!(has_road_access(g, &road));
    assert!((g.unsigned_area() - 830.0).abs() < 1.0, "grafted {}", g.unsigned_area());
    let rest = &out.accessible[0];
    assert!(has_road_access(rest, &road));
    assert!((rest.unsigned_area() - 770.0).abs() < 1.0, "remainder {}", rest.unsigned_area());
    let taken = crate::geometry::area(&out.driveways[0]);
    assert!((taken - 30.0).abs() < 1.0, "driveway {taken}");
}

#[test]
fn buildings_block_every_driveway() {
    let donor = rect(0.0, 0.0, 40.0, 20.0);
    let landlocked = rect(0.0, 20.0, 40.0, 40.0);
    let buildings = vec![rect(0.5, 5.0, 2.5, 7.0), rect(37.5, 5.0, 39.5, 7.0)];
    let out = generate_flag_parcel(vec![donor.clone(), landlocked.clone()], &street(0.0, 40.0), &buildings, 3.0);
    assert!(out.grafted.is_empty());
    assert_eq!(out.isolated, vec![landlocked]);
    assert_eq!(out.accessible, vec![donor]);
    assert!(out.driveways.is_empty());
}

#[test]
fn no_neighbor_means_isolated() {
    let out = generate_flag_parcel(vec![rect(0.0, 50.0, 10.0, 60.0)], &street(0.0, 40.0), &[], 3.0);
    assert_eq!(out.isolated.len(), 1);
    assert!(out.accessible.is_empty());
}

#[test]
fn candidate_sides_are_sorted_by_length() {
    let donor = polygon![(x: 0.0, y: 0.0), (x: 40.0, y: 0.0), (x: 40.0, y: 20.0), (x: 0.0, y: 10.0)];
    let landlocked = polygon![(x: 0.0, y: 10.0), (x: 40.0, y: 20.0), (x: 40.0, y: 40.0), (x: 0.0, y: 40.0)];
    let sides = candidate_sides(&landlocked, &[donor], &street(0.0, 40.0)).unwrap();
    let lengths: Vec<f64> = sides.iter().map(|s| s.length).collect();
    assert_eq!(lengths.len(), 2);
    assert!((lengths[0] - 10.0).abs() < 1e-9);
    assert!((lengths[1] - 20.0).abs() < 1e-9);
    assert!(sides.iter().all(|s| s.donor == 0));
}

#[test]
fn regroup_joins_touching_segments() {
    let l = |a: (f64, f64), b: (f64, f64)| Line::new(Coord { x: a.0, y: a.1 }, Coord { x: b.0, y: b.1 });
    let runs = regroup(vec![
        l((0.0, 0.0), (1.0, 0.0)),
        l((5.0, 5.0), (6.0, 5.0)),
        l((1.0, 0.0), (1.0, 1.0)),
    ]);
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].len(), 2);
    assert_eq!(runs[1].len(), 1);
}

#[test]
fn flag_decomposition_grafts_the_back_half() {
    let p = rect(0.0, 0.0, 40.0, 60.0);
    let road = street(-10.0, 50.0);
    let cfg = FlagConfig {
        maximal_area: 1300.0,
        maximal_width: 10.0,
        driveway_width: 3.0,
        ..FlagConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(5);
    let tree = flag_decompose(p, &road, &[], &cfg, &mut rng).unwrap();
    assert_eq!(tree.leaves().len(), 2);
    assert_eq!(tree.leaves_of(NodeKind::FlagParcel).len(), 1);
    assert!(tree.leaves_of(NodeKind::Isolated).is_empty());
    for id in tree.leaves() {
        assert!(has_road_access(&tree.node(id).polygon, &road));
    }
    assert_eq!(tree.driveways().len(), 1);
}

#[test]
fn small_polygon_is_left_alone() {
    let p = rect(0.0, 0.0, 10.0, 10.0);
    let mut rng = StdRng::seed_from_u64(0);
    let tree = flag_decompose(p, &street(0.0, 10.0), &[], &FlagConfig::default(), &mut rng).unwrap();
    assert_eq!(tree.leaves().len(), 1);
}

#[test]
fn zero_driveway_width_is_rejected() {
    let cfg = FlagConfig {
        driveway_width: 0.0,
        ..FlagConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn l_shaped_block_grafts_its_landlocked_arm() {
    let p = polygon![
        (x: 0.0, y: 0.0),
        (x: 60.0, y: 0.0),
        (x: 60.0, y: 20.0),
        (x: 20.0, y: 20.0),
        (x: 20.0, y: 60.0),
        (x: 0.0, y: 60.0),
    ];
    let total = p.unsigned_area();
    let road = street(0.0, 60.0);
    let cfg = FlagConfig {
        maximal_area: 700.0,
        maximal_width: 5.0,
        driveway_width: 3.0,
        ..FlagConfig::default()
    };
    for seed in 0..4 {
        let mut rng = StdRng::seed_from_u64(seed);
        let tree = flag_decompose(p.clone(), &road, &[], &cfg, &mut rng).unwrap();
        let leaves = tree.leaves();
        assert!(leaves.len() > 1, "seed {seed}");
        for &id in &leaves {
            assert!(has_road_access(&tree.node(id).polygon, &road), "seed {seed}");
        }
        assert!(!tree.leaves_of(NodeKind::FlagParcel).is_empty(), "seed {seed}");
        let sum = tree.leaf_area();
        assert!((sum - total).abs() < 2.0, "seed {seed}: {sum} vs {total}");
    }
}
