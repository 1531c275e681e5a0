//! calocluster: Command-line driver for calorimeter shower clustering.
//!
//! Loads a cell layout once, then clusters a stream of JSON-lines events
//! and writes one flat record per cluster.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

mod input;
mod output;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use thiserror::Error;

use calocluster_algorithms::{ClusteringConfig, GeometryContext, ShowerClustering};
use calocluster_core::{ConfigError, GeometryError};

use crate::input::EventReader;
use crate::output::RecordWriter;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{}:{line}: {source}", path.display())]
    Event {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Seeded 2D/3D shower clustering for calorimeter trigger primitives.
#[derive(Parser)]
#[command(name = "calocluster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log clustering summaries per event (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the neighbor graph of a cell layout and describe it
    Geometry {
        /// Cell layout: JSON array of {module, cell, x, y}
        layout: PathBuf,
    },

    /// Cluster every event of a JSON-lines file
    Process {
        /// Cell layout: JSON array of {module, cell, x, y}
        layout: PathBuf,

        /// Events, one {"hits": [...]} object per line
        events: PathBuf,

        /// Output file (.csv for CSV, anything else for JSON lines); stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Clustering configuration (JSON); flags below override its fields
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed threshold (MeV)
        #[arg(long)]
        seed_thresh: Option<f64>,

        /// Neighbor threshold (MeV)
        #[arg(long)]
        neighb_thresh: Option<f64>,

        /// Number of growth passes per layer
        #[arg(long)]
        n_neighbors: Option<usize>,

        /// Give every contending cluster the full energy of a shared hit
        #[arg(long)]
        no_split_energy: bool,

        /// Minimum depth of a kept 3D cluster
        #[arg(long)]
        depth_good: Option<usize>,

        /// Energy floor of the log weighting (MeV)
        #[arg(long)]
        min_tp_energy: Option<f64>,
    },
}

/// Command-line overrides applied on top of the configuration file.
struct Overrides {
    seed_thresh: Option<f64>,
    neighb_thresh: Option<f64>,
    n_neighbors: Option<usize>,
    no_split_energy: bool,
    depth_good: Option<usize>,
    min_tp_energy: Option<f64>,
}

impl Overrides {
    fn apply(self, mut config: ClusteringConfig) -> ClusteringConfig {
        if let Some(v) = self.seed_thresh {
            config.seed_thresh = v;
        }
        if let Some(v) = self.neighb_thresh {
            config.neighb_thresh = v;
        }
        if let Some(v) = self.n_neighbors {
            config.n_neighbors = v;
        }
        if self.no_split_energy {
            config.split_energy = false;
        }
        if let Some(v) = self.depth_good {
            config.depth_good = v;
        }
        if let Some(v) = self.min_tp_energy {
            config.min_tp_energy = v;
        }
        config
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn describe_geometry(layout: &Path) -> Result<()> {
    let geometry = input::load_layout(layout)?;

    let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
    for id in geometry.cells() {
        *histogram.entry(geometry.neighbors_of(id).len()).or_default() += 1;
    }

    println!("Layout: {}", layout.display());
    println!("Cells: {}", geometry.len());
    println!(
        "Nearest-neighbor distance: {:.3} mm",
        geometry.nearest_neighbor_distance()
    );
    println!("Neighbor threshold: {:.3} mm", geometry.neighbor_threshold());
    println!("Neighbor pairs: {}", geometry.pair_count());
    println!("Neighbors per cell:");
    for (count, cells) in histogram {
        println!("  {:>3}: {} cells", count, cells);
    }
    Ok(())
}

fn process(
    layout: &Path,
    events: &Path,
    output: Option<&Path>,
    config: ClusteringConfig,
) -> Result<()> {
    let geometry: GeometryContext = input::load_layout(layout)?;
    let engine = ShowerClustering::new(&geometry, config)?;
    log::info!("clustering with {:?}", engine.config());

    let mut writer = RecordWriter::create(output)?;
    let start = Instant::now();
    let mut total_events = 0usize;
    let mut total_hits = 0usize;
    let mut total_rejected = 0usize;
    let mut total_2d = 0usize;
    let mut total_3d = 0usize;

    for event in EventReader::open(events)? {
        let (index, hits) = event?;
        let out = engine.cluster_event(&hits);

        total_events += 1;
        total_hits = total_hits.saturating_add(out.statistics.hits_processed);
        total_rejected = total_rejected.saturating_add(out.statistics.hits_rejected);
        total_2d = total_2d.saturating_add(out.clusters_2d.len());
        total_3d = total_3d.saturating_add(out.clusters_3d.len());

        writer.write_event(index, &out.records())?;
    }
    writer.finish()?;

    let elapsed = start.elapsed();
    if let Some(path) = output {
        log::info!("wrote clusters to {}", path.display());
    }
    eprintln!(
        "Processed {} events in {:.2}s",
        total_events,
        elapsed.as_secs_f64()
    );
    eprintln!("Total hits: {} ({} rejected)", total_hits, total_rejected);
    eprintln!("Total 3D clusters: {}", total_3d);
    eprintln!("Total unclaimed 2D clusters: {}", total_2d);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Geometry { layout } => describe_geometry(&layout),

        Commands::Process {
            layout,
            events,
            output,
            config,
            seed_thresh,
            neighb_thresh,
            n_neighbors,
            no_split_energy,
            depth_good,
            min_tp_energy,
        } => {
            let base = match config {
                Some(path) => input::load_config(&path)?,
                None => ClusteringConfig::default(),
            };
            let config = Overrides {
                seed_thresh,
                neighb_thresh,
                n_neighbors,
                no_split_energy,
                depth_good,
                min_tp_energy,
            }
            .apply(base);
            process(&layout, &events, output.as_deref(), config)
        }
    }
}
