//! Tabular export of fetched records
//!
//! The orchestrator's output is handed to a [`RecordExporter`]. The shipped
//! implementation, [`CsvExporter`], writes one dated CSV file per run.

pub mod columns;
pub mod flatten;

pub use columns::HEADERS;
pub use flatten::{FlatRow, flatten};

use crate::error::Result;
use crate::types::FullRecord;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

/// Consumer of a batch of decorated records
///
/// Implementations persist the records somewhere under `dest` and return the
/// path they wrote.
pub trait RecordExporter {
    /// Persist `records` and return the written path
    fn export(&self, records: &[FullRecord], dest: &Path) -> Result<PathBuf>;
}

/// Writes `<dest>/<YYYY-MM-DD>-export_inies.csv`
#[derive(Clone, Debug, Default)]
pub struct CsvExporter {
    date: Option<NaiveDate>,
}

impl CsvExporter {
    /// Exporter stamping files with today's local date
    pub fn new() -> Self {
        Self::default()
    }

    /// Exporter stamping files with a fixed date
    pub fn with_date(date: NaiveDate) -> Self {
        Self { date: Some(date) }
    }

    /// File name used for a given date
    pub fn file_name(date: NaiveDate) -> String {
        format!("{}-export_inies.csv", date.format("%Y-%m-%d"))
    }
}

impl RecordExporter for CsvExporter {
    fn export(&self, records: &[FullRecord], dest: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dest)?;

        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        let path = dest.join(Self::file_name(date));

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(HEADERS)?;
        for row in flatten(records) {
            writer.write_record(row.cells())?;
        }
        writer.flush()?;

        tracing::info!(path = %path.display(), rows = records.len(), "export written");
        Ok(path)
    }
}
