//! CSV point-table loader
//!
//! Loads the ordered tag table from a CSV file with columns
//! `name,address,unit,scale,description`. Name uniqueness and address
//! validity are the configuration owner's responsibility; the loader only
//! rejects rows it cannot deserialize.

use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;

use crate::catalog::{TagCatalog, TagDefinition};

#[derive(Debug, Deserialize)]
struct TagCsvRow {
    name: String,
    address: String,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    scale: Option<f64>,
    #[serde(default)]
    description: String,
}

/// Load a tag catalog from a CSV point table.
pub fn load_point_table<P: AsRef<Path>>(path: P) -> Result<TagCatalog> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read point table: {}", path.display()))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut tags = Vec::new();
    for result in reader.deserialize::<TagCsvRow>() {
        let row =
            result.with_context(|| format!("Failed to parse row in {}", path.display()))?;
        tags.push(TagDefinition {
            name: row.name,
            address: row.address,
            unit: row.unit,
            scale: row.scale.unwrap_or(1.0),
            description: row.description,
        });
    }

    Ok(TagCatalog::new(tags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_point_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,address,unit,scale,description").unwrap();
        writeln!(file, "MotorSpeed,DB1.DBW0,rpm,0.1,Drive speed").unwrap();
        writeln!(file, "OilTemp,DB1.DBD2,degC,,Gearbox oil").unwrap();
        writeln!(file, "RunFlag,DB1.DBX6.0,,,").unwrap();

        let catalog = load_point_table(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);

        let speed = catalog.get(0).unwrap();
        assert_eq!(speed.name, "MotorSpeed");
        assert_eq!(speed.scale, 0.1);
        assert_eq!(speed.unit, "rpm");

        // Missing scale defaults to 1.0
        assert_eq!(catalog.get(1).unwrap().scale, 1.0);
        assert_eq!(catalog.get(2).unwrap().address, "DB1.DBX6.0");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_point_table("/nonexistent/points.csv").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/points.csv"));
    }
}
