// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tile URL attribution.
//!
//! Attaches storage URLs of derived products (surface models, point cloud
//! files) to tile polygons by matching tile file names against a table of
//! paths. Independent of the building pipeline.

use std::path::Path;
use std::time::Instant;

use footprint_tiler_core::{FeatureCollection, FieldType, FieldValue};
use rayon::prelude::*;

use crate::capability::{ensure_available, CapabilityProvider};
use crate::error::{Error, Result};

/// Name of the capability an attribution run requires.
pub const ATTRIBUTION_CAPABILITY: &str = "ImageAnalyst";

/// Default path column in the path table.
pub const DEFAULT_PATH_COLUMN: &str = "full_path";

/// Ordered list of file paths or URLs. Later rows take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTable {
    rows: Vec<String>,
}

impl PathTable {
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse JSON rows of the form `[{"full_path": "..."}, ...]`.
    ///
    /// Rows whose column is missing or null are skipped; any other
    /// non-string value is rejected.
    pub fn from_json(json: &str, column: &str) -> Result<Self> {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(json).map_err(footprint_tiler_core::Error::from)?;

        let mut paths = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match row.get(column) {
                None | Some(serde_json::Value::Null) => {
                    tracing::debug!(row = index, column, "Skipping path row without a value");
                }
                Some(serde_json::Value::String(path)) => paths.push(path.clone()),
                Some(other) => {
                    return Err(Error::PathTable(format!(
                        "row {} column '{}' is not a string: {}",
                        index, column, other
                    )))
                }
            }
        }
        Ok(Self { rows: paths })
    }

    pub fn read_json(path: impl AsRef<Path>, column: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(footprint_tiler_core::Error::from)?;
        Self::from_json(&json, column)
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Last row whose stem starts with `prefix` and contains `tile_stem`.
    pub fn latest_product(&self, prefix: &str, tile_stem: &str) -> Option<&str> {
        self.rows
            .iter()
            .rev()
            .map(String::as_str)
            .find(|row| {
                let stem = path_stem(row);
                stem.starts_with(prefix) && stem.contains(tile_stem)
            })
    }

    /// Last row whose base name equals `file_name`.
    pub fn latest_exact(&self, file_name: &str) -> Option<&str> {
        self.rows
            .iter()
            .rev()
            .map(String::as_str)
            .find(|row| base_name(row) == file_name)
    }
}

/// What to attribute and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionConfig {
    /// Tile attribute holding the tile's file name.
    pub tile_name_field: String,
    /// Product prefixes; each becomes a text field of the same name.
    pub products: Vec<String>,
    /// Field for the exact file-name match, e.g. `zlas`.
    pub source_format: Option<String>,
}

impl AttributionConfig {
    pub fn new(products: Vec<String>) -> Self {
        Self {
            tile_name_field: "FileName".to_string(),
            products,
            source_format: None,
        }
    }

    pub fn with_source_format(mut self, field: impl Into<String>) -> Self {
        self.source_format = Some(field.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.products.is_empty() && self.source_format.is_none() {
            return Err(Error::Config("no product or source format fields given".to_string()));
        }
        let empty = self
            .products
            .iter()
            .chain(self.source_format.iter())
            .any(|name| name.trim().is_empty());
        if empty {
            return Err(Error::Config("attribution field names may not be empty".to_string()));
        }
        Ok(())
    }
}

/// Split a `;` separated product list, dropping empty entries.
pub fn parse_product_list(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Return a copy of `tiles` with product URL fields filled in.
///
/// Each product field receives the latest matching row, or keeps its
/// previous value when nothing matches. Tiles without a text file name are
/// left as they are. An existing product field that is not text is replaced
/// by an empty text field, so its old values are dropped.
pub fn attribute_tiles(
    tiles: &FeatureCollection,
    table: &PathTable,
    config: &AttributionConfig,
    capability: &dyn CapabilityProvider,
) -> Result<FeatureCollection> {
    let start = Instant::now();
    ensure_available(capability)?;
    config.validate()?;
    tiles.require_field(&config.tile_name_field)?;

    let mut output = tiles.clone();
    for field in config.products.iter().chain(config.source_format.iter()) {
        match output.field(field).map(|def| def.field_type) {
            Some(found) if found != FieldType::Text => {
                tracing::warn!(field = %field, ?found, "Replacing non-text product field");
                output.replace_field(field, FieldType::Text);
            }
            _ => {
                output.add_field(field, FieldType::Text)?;
            }
        }
    }

    let matches: Vec<Vec<(&str, &str)>> = tiles
        .features()
        .par_iter()
        .map(|feature| {
            let Some(name) = feature.get(&config.tile_name_field).as_str() else {
                return Vec::new();
            };
            let stem = path_stem(name);
            if stem.is_empty() {
                return Vec::new();
            }

            let mut found = Vec::new();
            for product in &config.products {
                if let Some(url) = table.latest_product(product, stem) {
                    found.push((product.as_str(), url));
                }
            }
            if let Some(field) = &config.source_format {
                if let Some(url) = table.latest_exact(name) {
                    found.push((field.as_str(), url));
                }
            }
            found
        })
        .collect();

    let mut attributed = 0;
    for (index, found) in matches.into_iter().enumerate() {
        if !found.is_empty() {
            attributed += 1;
        }
        for (field, url) in found {
            output.set_value(index, field, FieldValue::Text(url.to_string()))?;
        }
    }

    tracing::info!(
        tiles = tiles.len(),
        attributed,
        rows = table.len(),
        products = config.products.len(),
        time_ms = start.elapsed().as_millis(),
        "Tile attribution complete"
    );
    Ok(output)
}

/// Last path component; both `/` and `\` separate.
fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

/// Base name without its final extension. Leading-dot names keep the dot.
fn path_stem(path: &str) -> &str {
    let name = base_name(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::StaticCapability;
    use footprint_tiler_core::{Feature, FieldDef, Geometry};
    use footprint_tiler_geometry::Polygon2D;

    fn tiles(names: &[Option<&str>]) -> FeatureCollection {
        let mut fc = FeatureCollection::new(
            "tiles",
            vec![FieldDef::new("FileName", FieldType::Text)],
        );
        for name in names {
            let value = name.map_or(FieldValue::Null, |n| FieldValue::Text(n.into()));
            fc.push(
                Feature::new(Geometry::Polygon(
                    Polygon2D::rectangle(0.0, 0.0, 1.0, 1.0).into(),
                ))
                .with("FileName", value),
            )
            .unwrap();
        }
        fc
    }

    fn table() -> PathTable {
        PathTable::from_rows([
            "s3://bucket/old/dsm_N100E200.tif",
            "s3://bucket/dtm/dtm_N100E200.tif",
            "s3://bucket/new/dsm_N100E200.tif",
            "s3://bucket/bdsm/building_dsm_N100E200.tif",
            "s3://bucket/laz/N100E200.zlas",
            "C:\\data\\dsm_N300E200.tif",
        ])
    }

    #[test]
    fn stems_and_base_names() {
        assert_eq!(base_name("s3://b/x/a.tif"), "a.tif");
        assert_eq!(base_name("C:\\x\\a.tif"), "a.tif");
        assert_eq!(base_name("a.tif"), "a.tif");
        assert_eq!(path_stem("dir/a.b.tif"), "a.b");
        assert_eq!(path_stem("dir/.hidden"), ".hidden");
        assert_eq!(path_stem("dir/noext/"), "noext");
    }

    #[test]
    fn product_list_splits_on_semicolons() {
        assert_eq!(parse_product_list("dsm;dtm; ndsm;"), vec!["dsm", "dtm", "ndsm"]);
        assert_eq!(parse_product_list("dsm"), vec!["dsm"]);
    }

    #[test]
    fn latest_matching_row_wins() {
        let t = table();
        assert_eq!(
            t.latest_product("dsm", "N100E200"),
            Some("s3://bucket/new/dsm_N100E200.tif")
        );
        assert_eq!(t.latest_product("ndsm", "N100E200"), None);
        assert_eq!(t.latest_exact("N100E200.zlas"), Some("s3://bucket/laz/N100E200.zlas"));
        assert_eq!(t.latest_exact("N100E200.las"), None);
    }

    #[test]
    fn attributes_copy_and_leaves_input_alone() {
        let input = tiles(&[Some("N100E200.zlas"), Some("N300E200.zlas"), None]);
        let config = AttributionConfig::new(parse_product_list("building_dsm;dsm;dtm"))
            .with_source_format("zlas");

        let out = attribute_tiles(&input, &table(), &config, &StaticCapability::available("ImageAnalyst"))
            .unwrap();

        assert!(!input.has_field("dsm"));
        for field in ["building_dsm", "dsm", "dtm", "zlas"] {
            assert_eq!(out.field(field).unwrap().field_type, FieldType::Text);
        }

        let first = &out.features()[0];
        assert_eq!(first.get("dsm").as_str(), Some("s3://bucket/new/dsm_N100E200.tif"));
        assert_eq!(
            first.get("building_dsm").as_str(),
            Some("s3://bucket/bdsm/building_dsm_N100E200.tif")
        );
        assert_eq!(first.get("dtm").as_str(), Some("s3://bucket/dtm/dtm_N100E200.tif"));
        assert_eq!(first.get("zlas").as_str(), Some("s3://bucket/laz/N100E200.zlas"));

        let second = &out.features()[1];
        assert_eq!(second.get("dsm").as_str(), Some("C:\\data\\dsm_N300E200.tif"));
        assert!(second.get("dtm").is_null());
        assert!(second.get("zlas").is_null());

        assert!(out.features()[2].get("dsm").is_null());
    }

    #[test]
    fn unavailable_capability_fails_first() {
        let input = tiles(&[Some("N100E200.zlas")]);
        let config = AttributionConfig::new(vec!["dsm".into()]);
        let err = attribute_tiles(&input, &table(), &config, &StaticCapability::unavailable("ImageAnalyst"))
            .unwrap_err();
        assert!(matches!(err, Error::CapabilityUnavailable { .. }));
    }

    #[test]
    fn path_table_from_json() {
        let json = r#"[{"full_path": "a/dsm_1.tif"}, {"full_path": null}, {"other": 1}, {"full_path": "b/dsm_1.tif"}]"#;
        let t = PathTable::from_json(json, DEFAULT_PATH_COLUMN).unwrap();
        assert_eq!(t.rows(), ["a/dsm_1.tif", "b/dsm_1.tif"]);

        let bad = r#"[{"full_path": 12}]"#;
        assert!(matches!(
            PathTable::from_json(bad, DEFAULT_PATH_COLUMN),
            Err(Error::PathTable(_))
        ));
    }

    #[test]
    fn non_text_product_field_is_replaced() {
        let mut input = FeatureCollection::new(
            "tiles",
            vec![
                FieldDef::new("FileName", FieldType::Text),
                FieldDef::new("dsm", FieldType::Integer),
                FieldDef::new("dtm", FieldType::Text),
            ],
        );
        for (name, dsm) in [("N100E200.zlas", 7), ("N500E500.zlas", 8)] {
            input
                .push(
                    Feature::new(Geometry::Polygon(
                        Polygon2D::rectangle(0.0, 0.0, 1.0, 1.0).into(),
                    ))
                    .with("FileName", FieldValue::Text(name.into()))
                    .with("dsm", FieldValue::Integer(dsm))
                    .with("dtm", FieldValue::Text("kept".into())),
                )
                .unwrap();
        }
        let config = AttributionConfig::new(parse_product_list("dsm;dtm"));

        let out = attribute_tiles(&input, &table(), &config, &StaticCapability::available("ImageAnalyst"))
            .unwrap();

        assert_eq!(out.field("dsm").unwrap().field_type, FieldType::Text);
        assert_eq!(out.features()[0].get("dsm").as_str(), Some("s3://bucket/new/dsm_N100E200.tif"));
        assert!(out.features()[1].get("dsm").is_null());
        // text fields keep their values when nothing matches
        assert_eq!(out.features()[1].get("dtm").as_str(), Some("kept"));
        assert_eq!(input.field("dsm").unwrap().field_type, FieldType::Integer);
    }
}
