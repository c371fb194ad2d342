// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Non-finite coordinate at vertex {index}")]
    NonFiniteCoordinate { index: usize },

    #[error("Empty footprint: {0}")]
    EmptyFootprint(String),
}
