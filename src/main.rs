//! rasterwrap CLI
//!
//! Generates flow-rate test towers and other cylinder-wrapped images as
//! G-code.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rasterwrap::{init_logging, load_config, TowerConfig, VolumetricFlow};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "rasterwrap", version)]
#[command(about = "Wrap grayscale images around a cylinder as extrusion toolpaths", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a flow tower G-code file
    Generate {
        /// Job configuration (.toml or .json); defaults reproduce the stock tower
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Trace this image on every segment instead of flow-rate labels
        #[arg(short, long)]
        image: Option<PathBuf>,
        /// Output G-code file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma separated flow rates in mm³/s, bottom segment first
        #[arg(long, value_delimiter = ',')]
        flow_rates: Vec<f64>,
        /// Label font file
        #[arg(long)]
        font_file: Option<PathBuf>,
        /// Write E as filament length instead of volume
        #[arg(long)]
        linear: bool,
        /// Draw labels as solid blocks, no font needed
        #[arg(long)]
        block_labels: bool,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Destination (.toml or .json)
        path: PathBuf,
    },
    /// Show version and the effective job configuration
    Info {
        /// Job configuration to describe
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs)?;

    match cli.command {
        Commands::Generate {
            config,
            image,
            output,
            flow_rates,
            font_file,
            linear,
            block_labels,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(image) = image {
                config.tower.image = Some(image);
            }
            if let Some(output) = output {
                config.output.path = output;
            }
            if !flow_rates.is_empty() {
                config.tower.flow_rates = flow_rates.into_iter().map(VolumetricFlow).collect();
            }
            if let Some(font_file) = font_file {
                config.tower.font_file = Some(font_file);
            }
            if linear {
                config.process.volumetric = false;
            }
            if block_labels {
                config.tower.block_labels = true;
            }

            let summary = rasterwrap::generate(&config)?;
            println!(
                "Wrote {} ({} layers, {} extrusion moves, final E {:.3})",
                config.output.path.display(),
                summary.layers,
                summary.points,
                summary.extrusion
            );
        }
        Commands::InitConfig { path } => {
            TowerConfig::default().save_to_file(&path)?;
            info!("Wrote default configuration to {}", path.display());
            println!("Wrote {}", path.display());
        }
        Commands::Info { config } => {
            show_info(load_config(config.as_deref())?);
        }
    }

    Ok(())
}

fn show_info(config: TowerConfig) {
    println!("rasterwrap {} (built {})", rasterwrap::VERSION, rasterwrap::BUILD_DATE);
    println!();

    let process = &config.process;
    println!("Nozzle width:    {} mm", process.nozzle_width);
    println!("Layer height:    {} mm", process.layer_height);
    if process.volumetric {
        println!("Extrusion:       volumetric (mm³)");
    } else {
        println!(
            "Extrusion:       filament length ({} mm filament)",
            process.filament_diameter
        );
    }

    let tracer = &config.tracer;
    println!(
        "Cylinder:        r = {} mm at {}",
        tracer.base_radius, tracer.center
    );

    let tower = &config.tower;
    let layers = (tower.segment_height / process.layer_height).ceil() as u32;
    println!(
        "Segments:        {} x {} mm ({} layers + rim)",
        tower.flow_rates.len(),
        tower.segment_height,
        layers
    );
    for flow in &tower.flow_rates {
        match flow.feed_rate(process.layer_height, process.nozzle_width) {
            Ok(feed) => println!("  {:>12} -> F{:.0}", flow.to_string(), feed),
            Err(e) => println!("  {:>12} -> {}", flow.to_string(), e),
        }
    }
    match &tower.image {
        Some(image) => println!("Source:          image {}", image.display()),
        None if tower.block_labels => println!("Source:          block labels"),
        None => println!("Source:          labels ({:?})", tower.font_source()),
    }
    println!("Output:          {}", config.output.path.display());
}
