//! skullmap CLI - skull thickness mapping from bone surface meshes.
//!
//! # Logging
//!
//! `-v` enables info logging for the skullmap crates and `-vv` debug logging.
//! `RUST_LOG` takes precedence when set:
//!
//! ```bash
//! RUST_LOG=skullmap_thickness=debug skullmap map skull.stl --dims 500 500 500
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{config, info, map, top_faces};

/// skullmap - measure skull thickness over the outer bone surface.
#[derive(Parser)]
#[command(name = "skullmap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// How command results are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

/// Point field shown when the surface is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ActiveField {
    /// Material thickness
    Thickness,
    /// Distance to the first air cell
    Void,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the top surface and write it with thickness maps as VTK
    Map {
        /// Input bone surface (.stl or .obj)
        input: PathBuf,

        /// Output VTK file (default: <input>_thickness.vtk)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Volume grid dimensions: depth width height
        #[arg(long, num_args = 3, value_names = ["DEPTH", "WIDTH", "HEIGHT"])]
        dims: Option<Vec<u32>>,

        /// Spacing between rainfall rays (overrides the config file)
        #[arg(long)]
        precision: Option<f64>,

        /// TOML file with mapping parameters
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Field shown when the surface is opened
        #[arg(long, default_value = "thickness")]
        active: ActiveField,
    },

    /// Write the original faces hit first by the rainfall grid as STL
    TopFaces {
        /// Input bone surface (.stl or .obj)
        input: PathBuf,

        /// Output STL file
        #[arg(short, long)]
        output: PathBuf,

        /// Volume grid dimensions: depth width height
        #[arg(long, num_args = 3, value_names = ["DEPTH", "WIDTH", "HEIGHT"])]
        dims: Option<Vec<u32>>,

        /// Spacing between rainfall rays (overrides the config file)
        #[arg(long)]
        precision: Option<f64>,

        /// TOML file with mapping parameters
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Accepted x range of first hits: low high
        #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], allow_negative_numbers = true)]
        band: Option<Vec<f64>>,

        /// Also keep faces sharing a vertex with a selected face
        #[arg(long)]
        inflate: bool,
    },

    /// Display mesh statistics and the grid that encloses it
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Print mapping parameters as TOML
    Config {
        /// Merge this file over the defaults before printing
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "skullmap_mesh=info,skullmap_thickness=info,skullmap_cli=info",
            2 => "skullmap_mesh=debug,skullmap_raytrace=debug,skullmap_thickness=debug,skullmap_cli=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Map {
            input,
            output,
            dims,
            precision,
            config,
            active,
        } => map::run(
            input,
            output.as_deref(),
            dims.as_deref(),
            *precision,
            config.as_deref(),
            *active,
            &cli,
        ),
        Commands::TopFaces {
            input,
            output,
            dims,
            precision,
            config,
            band,
            inflate,
        } => top_faces::run(
            input,
            output,
            dims.as_deref(),
            *precision,
            config.as_deref(),
            band.as_deref(),
            *inflate,
            &cli,
        ),
        Commands::Info { input } => info::run(input, &cli),
        Commands::Config { config } => config::run(config.as_deref(), &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            eprintln!("Error: {e}");
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {cause}");
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
