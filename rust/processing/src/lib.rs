// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Footprint Tiler Processing
//!
//! Assigns every building to exactly one tile of a polygon partition.
//! Footprints are intersected with the tiles; a building inside one tile
//! takes that tile, a building spanning several tiles takes the tile chosen
//! by [`selector::select_best`]. The winning tile id and file name are written
//! back onto the building collection.
//!
//! ```rust,ignore
//! use footprint_tiler_processing::{TilingConfig, TilingPipeline};
//!
//! let pipeline = TilingPipeline::with_config(TilingConfig::from_env());
//! let report = pipeline.run(&mut buildings, &tiles)?;
//! println!("{} of {} buildings assigned", report.assigned, report.building_count);
//! ```
//!
//! [`attribution`] is a separate tool that attaches product URLs to tiles.

pub mod area;
pub mod attribution;
pub mod capability;
pub mod config;
pub mod error;
pub mod grouping;
pub mod intersect;
pub mod pipeline;
pub mod selector;
pub mod writer;

pub use area::{annotate_area, measure_fragments};
pub use attribution::{attribute_tiles, parse_product_list, AttributionConfig, PathTable};
pub use capability::{ensure_available, CapabilityProvider, EnvCapability, StaticCapability};
pub use config::TilingConfig;
pub use error::{Error, Result};
pub use grouping::{group_by_building, sort_fragments, FragmentCounts, GroupKind};
pub use intersect::{intersect_tiles, FragmentPiece};
pub use pipeline::{TilingPipeline, TilingReport};
pub use selector::{select_assignments, select_best};
pub use writer::{write_assignments, OutputFields};
