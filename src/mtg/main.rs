// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//cargo run --bin mtg --release -- run --input buildings.geojson --output gaps.geojson --config params.json

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use mind_the_gap::chainage::{boundary_lines, chainage};
use mind_the_gap::io::{
    gap_output_to_geojson, read_boundary, read_point_set, tile_outcomes_to_geojson, write_geojson,
};
use mind_the_gap::pipeline::GapPolygons;
use mind_the_gap::tiles::{TileStatus, run_tiles};
use mind_the_gap::tune::{Region, TuneConfig};
use mind_the_gap::{GapOutput, GapParams, mind_the_gap};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the gap pipeline once with fixed parameters
    Run {
        /// GeoJSON points, usually building centroids
        #[arg(short, long)]
        input: PathBuf,
        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
        /// Boundary polygons whose outline is added as chainage points
        #[arg(long)]
        boundary: Option<PathBuf>,
        #[arg(long, default_value_t = 0.01)]
        chainage_interval: f64,
        /// JSON file with gap parameters; flags override its values
        #[arg(long, env = "MTG_PARAMS")]
        config: Option<PathBuf>,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Pick parameters for one region automatically
    Tune {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        boundary: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// JSON file with tuner settings
        #[arg(long, env = "MTG_TUNE_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Split points into square tiles and tune each in parallel
    Tiles {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Tile edge length in input units
        #[arg(long, default_value_t = 1.0)]
        tile_size: f64,
        #[arg(long, env = "MTG_TUNE_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct ParamArgs {
    #[arg(long)]
    x_bin_size: Option<f64>,
    #[arg(long)]
    y_bin_size: Option<f64>,
    #[arg(long)]
    x_gap_len_threshold: Option<f64>,
    #[arg(long)]
    y_gap_len_threshold: Option<f64>,
    #[arg(long)]
    x_min_intersections: Option<usize>,
    #[arg(long)]
    y_min_intersections: Option<usize>,
    #[arg(long)]
    alpha: Option<f64>,
    /// Also write the points each polygon was built from
    #[arg(long)]
    cluster_points: bool,
    /// Write gap intersection points instead of polygons
    #[arg(long)]
    write_points: bool,
}

impl ParamArgs {
    fn resolve(&self, base: Option<GapParams>) -> Result<GapParams> {
        let missing = |name: &str| anyhow!("--{} is required without a config file", name);

        let mut params = match base {
            Some(params) => params,
            None => GapParams::new(
                self.x_bin_size.ok_or_else(|| missing("x-bin-size"))?,
                self.y_bin_size.ok_or_else(|| missing("y-bin-size"))?,
                self.x_gap_len_threshold
                    .ok_or_else(|| missing("x-gap-len-threshold"))?,
                self.y_gap_len_threshold
                    .ok_or_else(|| missing("y-gap-len-threshold"))?,
                self.x_min_intersections
                    .ok_or_else(|| missing("x-min-intersections"))?,
                self.y_min_intersections
                    .ok_or_else(|| missing("y-min-intersections"))?,
            ),
        };

        if let Some(v) = self.x_bin_size {
            params.x_bin_size = v;
        }
        if let Some(v) = self.y_bin_size {
            params.y_bin_size = v;
        }
        if let Some(v) = self.x_gap_len_threshold {
            params.x_gap_len_threshold = v;
        }
        if let Some(v) = self.y_gap_len_threshold {
            params.y_gap_len_threshold = v;
        }
        if let Some(v) = self.x_min_intersections {
            params.x_min_intersections = v;
        }
        if let Some(v) = self.y_min_intersections {
            params.y_min_intersections = v;
        }
        if let Some(v) = self.alpha {
            params.alpha = v;
        }
        params.cluster_points |= self.cluster_points;
        params.write_points |= self.write_points;

        Ok(params)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config in {}", path.display()))
}

fn tune_config(path: Option<&Path>) -> Result<TuneConfig> {
    match path {
        Some(path) => read_json(path),
        None => Ok(TuneConfig::default()),
    }
}

fn run(
    input: &Path,
    output: &Path,
    boundary: Option<&Path>,
    chainage_interval: f64,
    params: GapParams,
) -> Result<()> {
    let mut points = read_point_set(input)?;

    if let Some(boundary) = boundary {
        let boundary = read_boundary(boundary)?;
        let chain = chainage(&boundary_lines(&boundary), chainage_interval)?;
        info!(chainage = chain.len(), "adding boundary chainage");
        points.extend_points(chain);
    }

    info!(points = points.len(), ?params, "running");
    let gaps = mind_the_gap(&points, &params)?;

    write_geojson(output, &gap_output_to_geojson(&gaps))?;
    info!("Done! Wrote to {:?}", output);
    Ok(())
}

fn tune(input: &Path, boundary: &Path, output: &Path, config: &TuneConfig) -> Result<()> {
    let buildings = read_point_set(input)?;
    let boundary = read_boundary(boundary)?;

    let region = Region::new(&buildings, &boundary, config).context("Failed to prepare region")?;
    let outcome = region.run(config)?;

    let polygons = match outcome.tuned {
        Some(tuned) => {
            info!(
                params = ?tuned.params,
                in_gaps_ratio = tuned.report.in_gaps_ratio,
                area_ratio = tuned.report.area_ratio,
                "tuned"
            );
            tuned.gaps.0
        }
        None => {
            warn!(attempts = outcome.attempts.len(), "no parameters fit this region");
            Vec::new()
        }
    };

    let gaps = GapOutput::Polygons(GapPolygons {
        srs: buildings.srs.clone(),
        polygons,
        point_groups: None,
        degenerate_clusters: Vec::new(),
    });
    write_geojson(output, &gap_output_to_geojson(&gaps))?;
    info!("Done! Wrote to {:?}", output);
    Ok(())
}

fn tiles(input: &Path, output: &Path, tile_size: f64, config: &TuneConfig) -> Result<()> {
    let points = read_point_set(input)?;

    let num_threads = std::env::var("MTG_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);

    info!(
        "Processing tiles in parallel with {} threads (set MTG_THREADS to change)",
        num_threads
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to create rayon thread pool")?;

    let outcomes = pool.install(|| run_tiles(&points, tile_size, config))?;

    let count = |status: TileStatus| outcomes.iter().filter(|o| o.status == status).count();
    info!(
        gaps_found = count(TileStatus::GapsFound),
        no_gaps = count(TileStatus::NoGaps),
        failed = count(TileStatus::Failed),
        "tiles finished"
    );

    write_geojson(output, &tile_outcomes_to_geojson(&outcomes, &points.srs))?;
    info!("Done! Wrote to {:?}", output);
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Run {
            input,
            output,
            boundary,
            chainage_interval,
            config,
            params,
        } => {
            let base = config.as_deref().map(read_json::<GapParams>).transpose()?;
            let params = params.resolve(base)?;
            run(&input, &output, boundary.as_deref(), chainage_interval, params)
        }
        Commands::Tune {
            input,
            boundary,
            output,
            config,
        } => tune(&input, &boundary, &output, &tune_config(config.as_deref())?),
        Commands::Tiles {
            input,
            output,
            tile_size,
            config,
        } => tiles(&input, &output, tile_size, &tune_config(config.as_deref())?),
    }
}
