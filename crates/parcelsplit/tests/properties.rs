//! Property tests for the splitters and the merger.

use geo::{polygon, Area, Coord, LineString, MultiPolygon, Polygon};
use parcelsplit::prelude::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rect(w: f64, h: f64) -> Polygon<f64> {
    polygon![(x: 0.0, y: 0.0), (x: w, y: 0.0), (x: w, y: h), (x: 0.0, y: h)]
}

fn no_lanes(maximal_area: f64, irregularity_coeff: f64) -> ObbConfig {
    ObbConfig {
        maximal_area,
        minimal_width_contact_road: 0.0,
        irregularity_coeff,
        ..ObbConfig::default()
    }
}

fn row(widths: &[u32]) -> Vec<Parcel> {
    let mut x = 0.0;
    widths
        .iter()
        .map(|&w| {
            let w = w as f64;
            let p = Parcel::new(
                MultiPolygon(vec![polygon![
                    (x: x, y: 0.0),
                    (x: x + w, y: 0.0),
                    (x: x + w, y: 10.0),
                    (x: x, y: 10.0),
                ]]),
                ParcelAttributes::default(),
            );
            x += w;
            p
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn leaves_conserve_area_without_lanes(
        w in 10u32..120,
        h in 10u32..120,
        max_area in 50.0f64..2000.0,
        irr in 0.0f64..0.4,
        seed in any::<u64>(),
    ) {
        let p = rect(w as f64, h as f64);
        let road = RoadReference::new(vec![p.exterior().clone()]);
        let mut rng = StdRng::seed_from_u64(seed);
        let tree = decompose(p.clone(), &road, &no_lanes(max_area, irr), &mut rng).unwrap();
        let root = p.unsigned_area();
        prop_assert!((tree.leaf_area() - root).abs() < 1e-3 * root + 1.0);
        prop_assert_eq!(tree.road_area(), 0.0);
    }

    #[test]
    fn small_polygon_is_returned_as_is(w in 1u32..20, h in 1u32..20, seed in any::<u64>()) {
        let p = rect(w as f64, h as f64);
        let road = RoadReference::new(vec![p.exterior().clone()]);
        let mut rng = StdRng::seed_from_u64(seed);
        let tree = decompose(p.clone(), &road, &no_lanes(400.0, 0.3), &mut rng).unwrap();
        prop_assert_eq!(tree.leaves().len(), 1);
        prop_assert_eq!(&tree.leaf_polygons()[0], &p);
    }

    #[test]
    fn depth_is_logarithmic(w in 10u32..200, h in 10u32..200, max_area in 20.0f64..500.0) {
        let p = rect(w as f64, h as f64);
        let road = RoadReference::new(vec![p.exterior().clone()]);
        let mut rng = StdRng::seed_from_u64(1);
        let tree = decompose(p, &road, &no_lanes(max_area, 0.0), &mut rng).unwrap();
        let ratio = (w * h) as f64 / max_area;
        let bound = if ratio <= 1.0 { 0 } else { ratio.log2().ceil() as u32 };
        prop_assert!(tree.max_depth() <= bound + 2, "depth {} bound {}", tree.max_depth(), bound);
    }

    #[test]
    fn merging_twice_changes_nothing(
        widths in prop::collection::vec(1u32..30, 2..12),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let once = merge_undersized(row(&widths), 100.0, &mut rng);
        let twice = merge_undersized(once.clone(), 100.0, &mut rng);
        prop_assert_eq!(&once, &twice);
        let total: f64 = widths.iter().map(|&w| w as f64 * 10.0).sum();
        if total >= 100.0 {
            prop_assert!(once.iter().all(|p| p.area() >= 100.0 - 1e-6));
        }
    }

    #[test]
    fn flag_leaves_reach_the_road(
        w in 20u32..80,
        h in 20u32..80,
        max_area in 200.0f64..800.0,
        seed in any::<u64>(),
    ) {
        let p = rect(w as f64, h as f64);
        let road = RoadReference::new(vec![LineString(vec![
            Coord { x: -10.0, y: 0.0 },
            Coord { x: w as f64 + 10.0, y: 0.0 },
        ])]);
        let cfg = FlagConfig {
            maximal_area: max_area,
            maximal_width: 5.0,
            driveway_width: 3.0,
            ..FlagConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let tree = flag_decompose(p, &road, &[], &cfg, &mut rng).unwrap();
        for id in tree.leaves() {
            let node = tree.node(id);
            if node.kind != NodeKind::Isolated {
                prop_assert!(has_road_access(&node.polygon, &road));
            }
        }
    }
}
