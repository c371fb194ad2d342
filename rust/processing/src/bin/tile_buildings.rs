// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: assign every building to exactly one tile
//!
//! Reads building and tile collections as JSON, writes the buildings back
//! with `tile_id` and `file_name` attributes.
//!
//! Usage:
//!   tile-buildings <buildings.json> <tiles.json> [options]

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use footprint_tiler_core::FeatureCollection;
use footprint_tiler_geometry::OverlayGeometryService;
use footprint_tiler_processing::pipeline::TILING_CAPABILITY;
use footprint_tiler_processing::{EnvCapability, TilingConfig, TilingPipeline};

struct Options {
    buildings: String,
    tiles: String,
    output: Option<String>,
    report: Option<String>,
    config: TilingConfig,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }
    if args.len() < 3 {
        print_usage();
        std::process::exit(1);
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(options) {
        tracing::error!(error = %format!("{:#}", e), "Tiling failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut config = TilingConfig::from_env();
    let mut output = None;
    let mut report = None;

    let mut i = 3;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = |i: usize| -> Result<String> {
            args.get(i + 1)
                .cloned()
                .with_context(|| format!("{} needs a value", flag))
        };
        match flag {
            "--building-id" => config.building_id_field = value(i)?,
            "--tile-id" => config.tile_id_field = value(i)?,
            "--file-name" => config.file_name_field = value(i)?,
            "--output-tile-id" => config.output_tile_id_field = value(i)?,
            "--output-file-name" => config.output_file_name_field = value(i)?,
            "--threads" => {
                config.worker_threads = value(i)?
                    .parse()
                    .with_context(|| "Invalid --threads value")?
            }
            "--output" => output = Some(value(i)?),
            "--report" => report = Some(value(i)?),
            other => bail!("Unknown option: {}", other),
        }
        i += 2;
    }

    Ok(Options {
        buildings: args[1].clone(),
        tiles: args[2].clone(),
        output,
        report,
        config,
    })
}

fn run(options: Options) -> Result<()> {
    let mut buildings = FeatureCollection::read_json(&options.buildings)
        .with_context(|| format!("Cannot read buildings '{}'", options.buildings))?;
    let tiles = FeatureCollection::read_json(&options.tiles)
        .with_context(|| format!("Cannot read tiles '{}'", options.tiles))?;

    let pipeline = TilingPipeline::new(
        Arc::new(OverlayGeometryService::new()),
        Arc::new(EnvCapability::new(TILING_CAPABILITY, "TILER_3D_AVAILABLE")),
        options.config,
    );
    let report = pipeline.run(&mut buildings, &tiles)?;

    // Updated in place unless an output path is given
    let output = options.output.as_deref().unwrap_or(&options.buildings);
    buildings
        .write_json(output)
        .with_context(|| format!("Cannot write '{}'", output))?;

    if let Some(path) = &options.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Cannot write report '{}'", path))?;
    }

    println!(
        "{} buildings, {} tiles: {} assigned ({} spanning several tiles), {} unassigned -> {}",
        report.building_count,
        report.tile_count,
        report.assigned,
        report.multi_tile_buildings,
        report.unassigned,
        output
    );
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: tile-buildings <buildings.json> <tiles.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --building-id <F>        Building id attribute (default: bldg_fid)");
    eprintln!("  --tile-id <F>            Tile id attribute (default: FID_tiles)");
    eprintln!("  --file-name <F>          Tile file name attribute (default: FileName)");
    eprintln!("  --output-tile-id <F>     Output tile id attribute (default: tile_id)");
    eprintln!("  --output-file-name <F>   Output file name attribute (default: file_name)");
    eprintln!("  --threads <N>            Worker threads (default: CPU count)");
    eprintln!("  --output <PATH>          Output file (default: overwrite buildings)");
    eprintln!("  --report <PATH>          Write a JSON run report");
    eprintln!();
    eprintln!("Environment: TILER_* variables set the defaults; TILER_3D_AVAILABLE=0");
    eprintln!("disables the 3D capability. RUST_LOG sets the log filter.");
}
