//! Per-area-path aggregation.
//!
//! Folds a [`ClassifiedReport`] into an [`AggregateTable`] and persists
//! it as CSV for the trend renderer.

use crate::models::{AggregateTable, AutomationStatus, ClassifiedReport};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// CSV header for the area-path key column.
pub const AREA_PATH_COLUMN: &str = "AreaPath";

/// Category columns, in header order.
pub const CATEGORY_COLUMNS: [&str; 3] = ["automated", "manual", "automatable"];

/// Fold a classified report into per-area-path counts.
pub fn aggregate_report(report: &ClassifiedReport) -> AggregateTable {
    let mut table = AggregateTable::default();

    for status in [
        AutomationStatus::Automated,
        AutomationStatus::Manual,
        AutomationStatus::Automatable,
    ] {
        for entry in report.entries(status) {
            table.tally(&entry.area_path, status);
        }
    }

    table
}

/// Write an aggregate table as CSV.
///
/// Header is `AreaPath,automated,manual,automatable`; one row per area
/// path, in sorted order. Overwrites any existing file.
pub fn write_csv(table: &AggregateTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([
        AREA_PATH_COLUMN,
        CATEGORY_COLUMNS[0],
        CATEGORY_COLUMNS[1],
        CATEGORY_COLUMNS[2],
    ])?;

    for (area_path, counts) in table.iter() {
        writer.write_record([
            area_path.clone(),
            counts.automated.to_string(),
            counts.manual.to_string(),
            counts.automatable.to_string(),
        ])?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Aggregate a report and persist the table in one step.
///
/// Returns the structured table for programmatic consumers in addition
/// to writing the file.
pub fn aggregate_to_file(report: &ClassifiedReport, path: &Path) -> Result<AggregateTable> {
    let table = aggregate_report(report);
    write_csv(&table, path)?;
    Ok(table)
}
