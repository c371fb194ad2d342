// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feature collections with a typed attribute schema.
//!
//! A collection owns an ordered list of field definitions and a list of
//! features. Every feature carries a geometry (planar polygons or a 3-D
//! triangle mesh) and an attribute map keyed by field name. Attributes that
//! are not present on a feature read as [`FieldValue::Null`].

use footprint_tiler_geometry::{Mesh, MultiPolygon2D};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::value::{FeatureId, FieldType, FieldValue};

/// Geometry carried by a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Planar polygons (footprints, tiles)
    Polygon(MultiPolygon2D),
    /// 3-D model (multipatch) as a triangle mesh
    Mesh(Mesh),
}

/// Definition of one attribute field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A single feature: geometry plus attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub attributes: FxHashMap<String, FieldValue>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            attributes: FxHashMap::default(),
        }
    }

    /// Builder-style attribute setter, used when assembling test data.
    pub fn with(mut self, field: &str, value: FieldValue) -> Self {
        self.attributes.insert(field.to_string(), value);
        self
    }

    /// Attribute value, `Null` when absent.
    pub fn get(&self, field: &str) -> &FieldValue {
        static NULL: FieldValue = FieldValue::Null;
        self.attributes.get(field).unwrap_or(&NULL)
    }
}

/// Ordered schema plus features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub name: String,
    fields: Vec<FieldDef>,
    features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create an empty collection with the given schema.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
            features: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Returns the definition of a field, if it exists.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Fails with [`Error::MissingAttribute`] unless the field exists.
    pub fn require_field(&self, name: &str) -> Result<&FieldDef> {
        self.field(name).ok_or_else(|| Error::MissingAttribute {
            collection: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Append a feature, coercing its attributes to the schema types.
    ///
    /// Attributes that are not in the schema are rejected. Null values are
    /// not stored; absent and null read the same.
    pub fn push(&mut self, mut feature: Feature) -> Result<()> {
        let mut coerced = FxHashMap::default();
        for (name, value) in feature.attributes.drain() {
            let def = self.require_field(&name)?;
            let value = value.coerce(&name, def.field_type)?;
            if !value.is_null() {
                coerced.insert(name, value);
            }
        }
        feature.attributes = coerced;
        self.features.push(feature);
        Ok(())
    }

    /// Add a field if absent.
    ///
    /// Returns `Ok(true)` when the field was created, `Ok(false)` when a field
    /// of the same name and type already exists. An existing field with a
    /// different type is a [`Error::FieldTypeMismatch`].
    pub fn add_field(&mut self, name: &str, field_type: FieldType) -> Result<bool> {
        match self.field(name) {
            Some(def) if def.field_type == field_type => Ok(false),
            Some(def) => Err(Error::FieldTypeMismatch {
                field: name.to_string(),
                expected: field_type,
                found: def.field_type,
            }),
            None => {
                self.fields.push(FieldDef::new(name, field_type));
                Ok(true)
            }
        }
    }

    /// Drop a field and its values from every feature. Returns whether it existed.
    pub fn delete_field(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.name != name);
        if self.fields.len() == before {
            return false;
        }
        for feature in &mut self.features {
            feature.attributes.remove(name);
        }
        true
    }

    /// Replace any existing field of this name with a fresh, all-null one.
    pub fn replace_field(&mut self, name: &str, field_type: FieldType) {
        self.delete_field(name);
        self.fields.push(FieldDef::new(name, field_type));
    }

    /// Store a value, coercing it to the field type.
    pub fn set_value(&mut self, index: usize, field: &str, value: FieldValue) -> Result<()> {
        let field_type = self.require_field(field)?.field_type;
        let value = value.coerce(field, field_type)?;
        let len = self.features.len();
        let feature = self
            .features
            .get_mut(index)
            .ok_or(Error::FeatureOutOfRange { index, len })?;
        if value.is_null() {
            feature.attributes.remove(field);
        } else {
            feature.attributes.insert(field.to_string(), value);
        }
        Ok(())
    }

    /// Identifier of feature `index` read from `field`.
    pub fn feature_id(&self, index: usize, field: &str) -> Result<FeatureId> {
        let feature = self.features.get(index).ok_or(Error::FeatureOutOfRange {
            index,
            len: self.features.len(),
        })?;
        FeatureId::from_value(feature.get(field)).ok_or_else(|| Error::MissingId {
            field: field.to_string(),
            index,
        })
    }

    /// Read every feature's identifier, enforcing presence and uniqueness.
    pub fn unique_ids(&self, field: &str) -> Result<Vec<FeatureId>> {
        self.require_field(field)?;
        let mut seen = FxHashSet::default();
        let mut ids = Vec::with_capacity(self.features.len());
        for index in 0..self.features.len() {
            let id = self.feature_id(index, field)?;
            if !seen.insert(id.clone()) {
                return Err(Error::DuplicateId {
                    field: field.to_string(),
                    id: id.to_string(),
                });
            }
            ids.push(id);
        }
        Ok(ids)
    }
}
