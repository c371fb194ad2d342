// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: attach product URLs to tile polygons
//!
//! Usage:
//!   attribute-tiles <tiles.json> <paths.json> --products a;b;c [options]

use std::env;

use anyhow::{bail, Context, Result};
use footprint_tiler_core::FeatureCollection;
use footprint_tiler_processing::attribution::{ATTRIBUTION_CAPABILITY, DEFAULT_PATH_COLUMN};
use footprint_tiler_processing::{
    attribute_tiles, parse_product_list, AttributionConfig, EnvCapability, PathTable,
};

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

    if let Err(e) = run(&args) {
        tracing::error!(error = %format!("{:#}", e), "Attribution failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let tiles_path = &args[1];
    let paths_path = &args[2];

    let mut products = Vec::new();
    let mut source_format = None;
    let mut tile_name_field = None;
    let mut column = DEFAULT_PATH_COLUMN.to_string();
    let mut output = None;

    let mut i = 3;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .cloned()
            .with_context(|| format!("{} needs a value", flag))?;
        match flag {
            "--products" => products = parse_product_list(&value),
            "--source-format" => source_format = Some(value),
            "--tile-name" => tile_name_field = Some(value),
            "--column" => column = value,
            "--output" => output = Some(value),
            other => {
                print_usage();
                bail!("Unknown option: {}", other);
            }
        }
        i += 2;
    }

    let mut config = AttributionConfig::new(products);
    config.source_format = source_format;
    if let Some(field) = tile_name_field {
        config.tile_name_field = field;
    }

    let tiles = FeatureCollection::read_json(tiles_path)
        .with_context(|| format!("Cannot read tiles '{}'", tiles_path))?;
    let table = PathTable::read_json(paths_path, &column)
        .with_context(|| format!("Cannot read path table '{}'", paths_path))?;

    let capability = EnvCapability::new(ATTRIBUTION_CAPABILITY, "TILER_IMAGE_ANALYST_AVAILABLE");
    let attributed = attribute_tiles(&tiles, &table, &config, &capability)?;

    let output = output.as_deref().unwrap_or(tiles_path);
    attributed
        .write_json(output)
        .with_context(|| format!("Cannot write '{}'", output))?;
    println!("{} tiles attributed -> {}", attributed.len(), output);
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: attribute-tiles <tiles.json> <paths.json> --products a;b;c [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --products <LIST>        ';' separated product prefixes, e.g. dsm;dtm");
    eprintln!("  --source-format <F>      Field for the exact file name match, e.g. zlas");
    eprintln!("  --tile-name <F>          Tile file name attribute (default: FileName)");
    eprintln!("  --column <C>             Path column in the table (default: full_path)");
    eprintln!("  --output <PATH>          Output file (default: overwrite tiles)");
}
