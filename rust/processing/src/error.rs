// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the tiling pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors. Every variant aborts the run before the caller's
/// collection is touched.
#[derive(Debug, Error)]
pub enum Error {
    /// The processing capability is not available; checked before any work.
    #[error("{capability} capability is unavailable")]
    CapabilityUnavailable { capability: String },

    /// Precondition or schema failure on an input collection.
    #[error(transparent)]
    Data(#[from] footprint_tiler_core::Error),

    /// The geometry engine failed; its own message is kept verbatim.
    #[error("geometry engine failure on {context}: {source}")]
    Geometry {
        context: String,
        #[source]
        source: footprint_tiler_geometry::Error,
    },

    /// Intersection produced more area than the footprint it was cut from.
    #[error(
        "fragment of building {building} in tile {tile} has area {fragment_area}, \
         more than the building's {building_area}"
    )]
    FragmentExceedsBuilding {
        building: String,
        tile: String,
        fragment_area: f64,
        building_area: f64,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid path table: {0}")]
    PathTable(String),
}

impl Error {
    pub(crate) fn geometry(context: impl Into<String>, source: footprint_tiler_geometry::Error) -> Self {
        Error::Geometry {
            context: context.into(),
            source,
        }
    }
}
