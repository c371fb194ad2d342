// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for feature collections and tiling records.

use crate::value::FieldType;

/// Result type alias for feature collection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating or mutating feature collections.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required attribute is not part of the collection schema.
    #[error("no attribute named {field} in feature collection '{collection}'")]
    MissingAttribute { collection: String, field: String },

    /// An attribute exists but with a type that cannot hold the value.
    #[error("attribute {field} has type {found}, expected {expected}")]
    FieldTypeMismatch {
        field: String,
        expected: FieldType,
        found: FieldType,
    },

    /// A value could not be stored in or converted to a field of this type.
    #[error("value {value} is not valid for {field_type} attribute {field}")]
    InvalidValue {
        field: String,
        field_type: FieldType,
        value: String,
    },

    /// An identifier attribute is null or not an integer/string.
    #[error("feature {index} has no usable identifier in attribute {field}")]
    MissingId { field: String, index: usize },

    /// Two features share an identifier that must be unique.
    #[error("duplicate identifier {id} in attribute {field}")]
    DuplicateId { field: String, id: String },

    /// Feature index outside the collection.
    #[error("feature index {index} out of range for {len} features")]
    FeatureOutOfRange { index: usize, len: usize },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
