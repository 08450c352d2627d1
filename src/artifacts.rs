//! CSV persistence for the two pipeline output tables: the classified
//! entity list and the long-format statement records.

use crate::core::model::{ClassificationResult, StatementRecord};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

fn write_rows<T: serde::Serialize>(path: &Path, rows: &[T], what: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Saved {} {what} to {}", rows.len(), path.display());
    Ok(())
}

fn read_rows<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to read {what} from {}", path.display()))?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .with_context(|| format!("Malformed {what} in {}", path.display()))?;
    Ok(rows)
}

pub fn write_classified(path: &Path, rows: &[ClassificationResult]) -> Result<()> {
    write_rows(path, rows, "classified entities")
}

pub fn read_classified(path: &Path) -> Result<Vec<ClassificationResult>> {
    read_rows(path, "classified entities")
}

pub fn write_statements(path: &Path, rows: &[StatementRecord]) -> Result<()> {
    write_rows(path, rows, "statement records")
}

pub fn read_statements(path: &Path) -> Result<Vec<StatementRecord>> {
    read_rows(path, "statement records")
}
