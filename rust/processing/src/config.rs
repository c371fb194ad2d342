// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration loaded from environment variables.

use crate::error::{Error, Result};

/// Field names and resources used by a tiling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilingConfig {
    /// Unique building identifier attribute (must pre-exist).
    pub building_id_field: String,
    /// Unique tile identifier attribute on the tile collection.
    pub tile_id_field: String,
    /// File-name label attribute on the tile collection.
    pub file_name_field: String,
    /// Numeric tile id written onto buildings.
    pub output_tile_id_field: String,
    /// Text file name written onto buildings.
    pub output_file_name_field: String,
    /// Whole-footprint area attribute on the temporary footprint collection.
    pub orig_area_field: String,
    /// Number of worker threads for parallel stages.
    pub worker_threads: usize,
}

impl TilingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            building_id_field: env_or("TILER_BUILDING_ID_FIELD", "bldg_fid"),
            tile_id_field: env_or("TILER_TILE_ID_FIELD", "FID_tiles"),
            file_name_field: env_or("TILER_FILE_NAME_FIELD", "FileName"),
            output_tile_id_field: env_or("TILER_OUTPUT_TILE_ID_FIELD", "tile_id"),
            output_file_name_field: env_or("TILER_OUTPUT_FILE_NAME_FIELD", "file_name"),
            orig_area_field: env_or("TILER_ORIG_AREA_FIELD", "orig_area"),
            worker_threads: std::env::var("TILER_WORKER_THREADS")
                .unwrap_or_else(|_| num_cpus::get().to_string())
                .parse()
                .unwrap_or_else(|_| num_cpus::get()),
        }
    }

    /// Reject empty or clashing output field names.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("building id", &self.building_id_field),
            ("tile id", &self.tile_id_field),
            ("file name", &self.file_name_field),
            ("output tile id", &self.output_tile_id_field),
            ("output file name", &self.output_file_name_field),
            ("area", &self.orig_area_field),
        ];
        if let Some((label, _)) = names.iter().find(|(_, name)| name.trim().is_empty()) {
            return Err(Error::Config(format!("{} field name is empty", label)));
        }
        if self.output_tile_id_field == self.output_file_name_field {
            return Err(Error::Config(format!(
                "output fields must differ, both are '{}'",
                self.output_tile_id_field
            )));
        }
        for output in [&self.output_tile_id_field, &self.output_file_name_field] {
            if *output == self.building_id_field {
                return Err(Error::Config(format!(
                    "output field '{}' would overwrite the building id",
                    output
                )));
            }
        }
        if self.worker_threads == 0 {
            return Err(Error::Config("worker_threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            building_id_field: "bldg_fid".into(),
            tile_id_field: "FID_tiles".into(),
            file_name_field: "FileName".into(),
            output_tile_id_field: "tile_id".into(),
            output_file_name_field: "file_name".into(),
            orig_area_field: "orig_area".into(),
            worker_threads: num_cpus::get(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.into())
}
