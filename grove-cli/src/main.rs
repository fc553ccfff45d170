//! CLI for the grove time-series storage engine.
//!
//! Provides commands for creating nodes, storing datapoints, and
//! inspecting node metadata and slice inventories. This is a thin
//! external collaborator over the library's public surface, not a
//! daemon.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use grove::{Datapoint, MetaBag, MetaValue, Tree, meta};

/// grove — Append-biased fixed-resolution time-series storage CLI.
#[derive(Parser)]
#[command(name = "grove", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Display a node's metadata and slice inventory.
    Info {
        /// Path to the tree root directory.
        root: PathBuf,

        /// Dotted metric name.
        metric: String,
    },

    /// Create a node for a metric.
    Create {
        /// Path to the tree root directory.
        root: PathBuf,

        /// Dotted metric name.
        metric: String,

        /// Resolution in seconds per point (defaults to 60).
        #[arg(long)]
        time_step: Option<i64>,

        /// Extra metadata properties as KEY=VALUE pairs.
        #[arg(long = "property", value_name = "KEY=VALUE")]
        properties: Vec<String>,
    },

    /// Store a single datapoint for a metric.
    Store {
        /// Path to the tree root directory.
        root: PathBuf,

        /// Dotted metric name.
        metric: String,

        /// The value to store.
        value: f64,

        /// Unix-seconds timestamp (defaults to now).
        #[arg(long)]
        timestamp: Option<i64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Info { root, metric } => cmd_info(&root, &metric),
        Commands::Create {
            root,
            metric,
            time_step,
            properties,
        } => cmd_create(&root, &metric, time_step, &properties),
        Commands::Store {
            root,
            metric,
            value,
            timestamp,
        } => cmd_store(&root, &metric, value, timestamp),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Implements `grove info <root> <metric>`.
fn cmd_info(root: &PathBuf, metric: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tree = Tree::open(root)?;
    let node = tree.get_node(metric)?;
    let bag = node.read_metadata()?;

    println!("Node: {metric}");
    println!("Directory: {}", node.dir().display());
    println!();
    println!("Metadata:");
    println!("{}", meta::encode(&bag)?);
    println!();

    let slices = node.list_slices()?;
    println!("Slices: {}", slices.len());
    for (start, step) in slices {
        let path = node.dir().join(grove::Slice::file_name(start, step));
        let points = std::fs::metadata(&path).map_or(0, |m| m.len() / 8);
        let end = start + points as i64 * step;
        println!("  {start}@{step}: {points} points, covers [{start}, {end})");
    }

    Ok(())
}

/// Implements `grove create <root> <metric>`.
fn cmd_create(
    root: &PathBuf,
    metric: &str,
    time_step: Option<i64>,
    properties: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let tree = Tree::open(root)?;

    let mut bag = MetaBag::new();
    for property in properties {
        let (key, value) = property
            .split_once('=')
            .ok_or_else(|| format!("invalid property '{property}', expected KEY=VALUE"))?;
        bag.insert(key.to_string(), parse_property_value(value));
    }
    if let Some(step) = time_step {
        bag.insert(meta::TIME_STEP_KEY.to_string(), MetaValue::from(step));
    }

    let node = tree.create_node(metric, bag)?;
    println!("Created node '{metric}' at {}", node.dir().display());

    Ok(())
}

/// Implements `grove store <root> <metric> <value>`.
fn cmd_store(
    root: &PathBuf,
    metric: &str,
    value: f64,
    timestamp: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tree = Tree::open(root)?;

    if !tree.has_node(metric) {
        return Err(format!(
            "no node for metric '{metric}' (create it with `grove create` first)"
        )
        .into());
    }

    let timestamp = match timestamp {
        Some(ts) => ts,
        None => {
            #[allow(clippy::cast_possible_wrap)] // fine until the year 292 billion
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
            now
        }
    };

    tree.store(metric, Datapoint::new(timestamp, value))?;
    println!("Stored {value} at {timestamp} for '{metric}'");

    Ok(())
}

/// Parses a property value with the loosest useful typing: integer, then
/// float, then boolean, falling back to a string.
fn parse_property_value(value: &str) -> MetaValue {
    if let Ok(i) = value.parse::<i64>() {
        return MetaValue::from(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        return MetaValue::from(f);
    }
    if let Ok(b) = value.parse::<bool>() {
        return MetaValue::from(b);
    }
    MetaValue::from(value)
}
