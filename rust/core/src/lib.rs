// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Footprint Tiler Core
//!
//! Feature collections with typed attribute schemas, plus the records
//! passed between tiling stages: building footprints, tile polygons,
//! fragments and assignments.
//!
//! Collections are the in-memory stand-in for a GIS feature class. They can
//! be loaded from and written to a small JSON interchange format (see
//! [`serialization`]).

pub mod error;
pub mod feature;
pub mod records;
pub mod serialization;
pub mod value;

pub use error::{Error, Result};
pub use feature::{Feature, FeatureCollection, FieldDef, Geometry};
pub use records::{Assignment, AssignmentSet, BuildingFootprint, Fragment, TilePolygon};
pub use value::{FeatureId, FieldType, FieldValue};
