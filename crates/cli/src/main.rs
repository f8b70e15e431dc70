use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

use parcelsplit::prelude::*;

mod io;
mod provenance;

use provenance::{current_git_rev, Payload};

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Parcel subdivision runner")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Split the marked parcels of a GeoJSON layer and write the new layer
    Split(SplitArgs),
    /// Redraw the parcels covered by zoning polygons
    Zone(ZoneArgs),
    /// Generate the synthetic three-region parcel plan
    Synthetic {
        #[arg(long, default_value_t = 150)]
        parcels: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print area statistics of a parcel layer as JSON
    Report {
        #[arg(long)]
        parcels: PathBuf,
    },
}

#[derive(Args)]
struct SplitArgs {
    #[arg(long)]
    parcels: PathBuf,
    /// Urban-fabric profile (camelCase JSON); defaults apply when omitted
    #[arg(long)]
    profile: Option<PathBuf>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    roads: Option<PathBuf>,
    #[arg(long)]
    buildings: Option<PathBuf>,
    #[arg(long, default_value_t = Strategy::Obb)]
    strategy: Strategy,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Keep the first cut even when it leaves a half without road access
    #[arg(long)]
    no_force_access: bool,
    /// Mark parcels larger than this area before splitting
    #[arg(long)]
    mark_larger_than: Option<f64>,
    /// Merge parcels under the profile's minimal area afterwards
    #[arg(long)]
    merge: bool,
    /// Redraw contiguous marked parcels instead of splitting them one by one
    #[arg(long, conflicts_with = "densify")]
    consolidate: bool,
    /// Flag-cut marked parcels, keeping built pieces together
    #[arg(long)]
    densify: bool,
    /// With --densify: cut parcels the flag engine cannot serve with OBB
    #[arg(long, requires = "densify")]
    allow_isolated: bool,
    /// With --densify: consolidate marked parcels above this many maximal areas
    #[arg(long, requires = "densify")]
    large_zone_factor: Option<f64>,
}

#[derive(Args)]
struct ZoneArgs {
    #[arg(long)]
    parcels: PathBuf,
    /// Polygons whose covered parcels are redrawn
    #[arg(long)]
    zones: PathBuf,
    #[arg(long)]
    profile: Option<PathBuf>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    roads: Option<PathBuf>,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Split(args) => split(&args),
        Action::Zone(args) => zone(&args),
        Action::Synthetic { parcels, seed, out } => synthetic(parcels, seed, &out),
        Action::Report { parcels } => report(&parcels),
    }
}

fn load_profile(path: Option<&Path>) -> Result<UrbanFabricProfile> {
    let profile = match path {
        Some(p) => {
            let raw = fs::read(p).with_context(|| format!("reading profile {}", p.display()))?;
            serde_json::from_slice(&raw).with_context(|| format!("parsing profile {}", p.display()))?
        }
        None => UrbanFabricProfile::default(),
    };
    profile.validate().context("invalid profile")?;
    Ok(profile)
}

fn split(args: &SplitArgs) -> Result<()> {
    let profile = load_profile(args.profile.as_deref())?;
    let mut parcels = io::read_parcels(&args.parcels)?;
    let roads = match &args.roads {
        Some(p) => io::read_lines(p)?,
        None => Vec::new(),
    };
    let buildings = match &args.buildings {
        Some(p) => io::read_polygons(p)?,
        None => Vec::new(),
    };
    tracing::info!(
        parcels = parcels.len(),
        roads = roads.len(),
        buildings = buildings.len(),
        strategy = %args.strategy,
        seed = args.seed,
        "split"
    );
    if let Some(area) = args.mark_larger_than {
        parcels = mark_larger_than(&parcels, area);
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut out = if args.consolidate {
        consolidate(&parcels, &RoadReference::new(roads), &profile, &mut rng)?
    } else if args.densify {
        let road = block_reference(&parcels, &roads);
        match args.large_zone_factor {
            Some(factor) => densify_or_consolidate(
                &parcels,
                &road,
                &buildings,
                &profile,
                args.allow_isolated,
                factor,
                &mut rng,
            )?,
            None => densify(&parcels, &road, &buildings, &profile, args.allow_isolated, &mut rng)?,
        }
    } else {
        let road = block_reference(&parcels, &roads);
        split_marked(
            &parcels,
            &road,
            &buildings,
            &profile,
            args.strategy,
            !args.no_force_access,
            &mut rng,
        )?
    };
    if args.merge {
        out = merge(out, &profile.merge_config(), &mut rng)?;
    }
    io::write_parcels(&args.out, &out)?;

    let mut payload = Payload::new(
        "split",
        json!({
            "profile": profile,
            "strategy": args.strategy,
            "seed": args.seed,
            "force_street_access": !args.no_force_access,
            "mark_larger_than": args.mark_larger_than,
            "merge": args.merge,
            "consolidate": args.consolidate,
            "densify": args.densify,
            "allow_isolated": args.allow_isolated,
            "large_zone_factor": args.large_zone_factor,
            "parcels_out": out.len(),
        }),
    )
    .with_input(&args.parcels);
    for extra in [&args.profile, &args.roads, &args.buildings].into_iter().flatten() {
        payload = payload.with_input(extra);
    }
    let sidecar = provenance::write_sidecar(&args.out, payload)?;
    tracing::info!(out = %args.out.display(), sidecar = %sidecar.display(), parcels = out.len(), "written");
    Ok(())
}

fn zone(args: &ZoneArgs) -> Result<()> {
    let profile = load_profile(args.profile.as_deref())?;
    let parcels = io::read_parcels(&args.parcels)?;
    let zones = io::read_polygons(&args.zones)?;
    let roads = match &args.roads {
        Some(p) => io::read_lines(p)?,
        None => Vec::new(),
    };
    tracing::info!(parcels = parcels.len(), zones = zones.len(), seed = args.seed, "zone division");
    let mut rng = StdRng::seed_from_u64(args.seed);
    let road = block_reference(&parcels, &roads);
    let out = zone_division(&zones, &parcels, &road, &profile, &mut rng)?;
    io::write_parcels(&args.out, &out)?;

    let mut payload = Payload::new(
        "zone",
        json!({ "profile": profile, "seed": args.seed, "parcels_out": out.len() }),
    )
    .with_input(&args.parcels)
    .with_input(&args.zones);
    for extra in [&args.profile, &args.roads].into_iter().flatten() {
        payload = payload.with_input(extra);
    }
    provenance::write_sidecar(&args.out, payload)?;
    tracing::info!(out = %args.out.display(), parcels = out.len(), "written");
    Ok(())
}

fn synthetic(count: usize, seed: u64, out: &Path) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let parcels = synthetic_parcels(count, &mut rng)?;
    io::write_parcels(out, &parcels)?;
    provenance::write_sidecar(
        out,
        Payload::new("synthetic", json!({ "approx_count": count, "seed": seed })),
    )?;
    tracing::info!(out = %out.display(), parcels = parcels.len(), "synthetic plan written");
    Ok(())
}

fn stats(parcels: &[Parcel]) -> serde_json::Value {
    let areas: Vec<f64> = parcels.iter().map(Parcel::area).collect();
    let total: f64 = areas.iter().sum();
    let (min, max) = areas
        .iter()
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), &a| (lo.min(a), hi.max(a)));
    json!({
        "count": parcels.len(),
        "marked": parcels.iter().filter(|p| p.is_marked()).count(),
        "simulated": parcels.iter().filter(|p| p.attributes.simulated).count(),
        "total_area": total,
        "min_area": if areas.is_empty() { 0.0 } else { min },
        "mean_area": if areas.is_empty() { 0.0 } else { total / areas.len() as f64 },
        "max_area": max,
    })
}

fn report(path: &Path) -> Result<()> {
    let parcels = io::read_parcels(path)?;
    let obj = json!({
        "code_rev": current_git_rev(),
        "input": path.to_string_lossy(),
        "stats": stats(&parcels),
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
