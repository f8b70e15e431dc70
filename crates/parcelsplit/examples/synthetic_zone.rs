//! Print a summary of the synthetic parcel plan for a few sizes.
//!
//! Usage:
//!   cargo run -p parcelsplit --example synthetic_zone -- 150
//!
//! Prints, per region, the parcel count and the min / mean / max area.

use parcelsplit::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

fn main() {
    let count = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(150);
    let mut rng = StdRng::seed_from_u64(42);
    let plan = match synthetic_parcels(count, &mut rng) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("synthetic_zone: {err}");
            return;
        }
    };
    for region in ["1", "2", "3"] {
        let areas: Vec<f64> = plan
            .iter()
            .filter(|p| p.attributes.section == region)
            .map(Parcel::area)
            .collect();
        if areas.is_empty() {
            continue;
        }
        let min = areas.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = areas.iter().cloned().fold(0.0, f64::max);
        let mean = areas.iter().sum::<f64>() / areas.len() as f64;
        println!(
            "region {region}: n={} min={min:.1} mean={mean:.1} max={max:.1}",
            areas.len()
        );
    }
}
