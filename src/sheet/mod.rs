//! Remote tabular store adapter
//!
//! Translates between the in-memory record list and row ranges of a
//! spreadsheet tab. Every record is addressed by the 1-based sheet row it was
//! read from or written to; row 1 is the header, so data starts at
//! `HEADER_OFFSET`. Deleting clears a row in place, later rows never shift.

mod http;
mod memory;

pub use http::HttpSheetTransport;
pub use memory::MemorySheet;

use crate::config::{SheetConfig, col_to_letter};
use crate::error::{CmsError, Result};
use crate::record::{COLUMN_COUNT, Record};
use log::{debug, info};
use std::future::Future;
use std::sync::Arc;

/// First data row of the tab (1-based), directly under the header
pub const HEADER_OFFSET: usize = 2;

/// Raw access to a values range, `range` is A1 notation including the tab name
pub trait SheetTransport: Send + Sync {
    /// Rows of the range; trailing empty rows and cells may be omitted
    fn get_values(&self, range: &str) -> impl Future<Output = Result<Vec<Vec<String>>>> + Send;

    /// Overwrite the range with `values` (raw input, no formula parsing)
    fn put_values(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Blank every cell of the range without removing rows
    fn clear_values(&self, range: &str) -> impl Future<Output = Result<()>> + Send;
}

impl<S: SheetTransport> SheetTransport for Arc<S> {
    fn get_values(&self, range: &str) -> impl Future<Output = Result<Vec<Vec<String>>>> + Send {
        (**self).get_values(range)
    }

    fn put_values(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).put_values(range, values)
    }

    fn clear_values(&self, range: &str) -> impl Future<Output = Result<()>> + Send {
        (**self).clear_values(range)
    }
}

/// A named record and the sheet row it lives on
#[derive(Clone, Debug, PartialEq)]
pub struct SheetRecord {
    pub row: usize,
    pub record: Record,
}

/// Everything a full load learns about the tab
#[derive(Clone, Debug, PartialEq)]
pub struct SheetContents {
    /// Named records in sheet order
    pub records: Vec<SheetRecord>,

    /// Row after the last non-blank row of the range, where an append goes
    pub next_row: usize,
}

impl Default for SheetContents {
    fn default() -> Self {
        SheetContents {
            records: Vec::new(),
            next_row: HEADER_OFFSET,
        }
    }
}

fn utc_today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

pub struct SheetAdapter<T> {
    transport: T,
    config: SheetConfig,
    today: fn() -> String,
}

impl<T: SheetTransport> SheetAdapter<T> {
    pub fn new(transport: T, config: SheetConfig) -> Self {
        SheetAdapter {
            transport,
            config,
            today: utc_today,
        }
    }

    /// Replace the date source used for the last-updated column
    pub fn with_clock(mut self, today: fn() -> String) -> Self {
        self.today = today;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    fn data_range(&self) -> String {
        format!("{}!{}", self.config.sheet_name, self.config.sheet_range.trim())
    }

    /// A1 range covering the single sheet row `row`
    pub fn row_range(&self, row: usize) -> String {
        format!(
            "{}!A{}:{}{}",
            self.config.sheet_name,
            row,
            col_to_letter(COLUMN_COUNT),
            row
        )
    }

    /// Fetch every named record in sheet order, each with its row
    pub async fn load_all(&self) -> Result<SheetContents> {
        self.config.validate()?;
        let range = self.data_range();
        debug!("loading records from {}", range);

        let values = self.transport.get_values(&range).await?;
        if values.len() < 2 {
            info!("range {} has no data rows", range);
            return Ok(SheetContents::default());
        }

        let headers = &values[0];
        let records: Vec<SheetRecord> = values[1..]
            .iter()
            .enumerate()
            .map(|(index, row)| SheetRecord {
                row: index + HEADER_OFFSET,
                record: Record::from_header_row(headers, row),
            })
            .filter(|entry| entry.record.has_name())
            .collect();

        // blank rows still hold their place, only trailing ones are reusable
        let next_row = values
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map_or(HEADER_OFFSET, |last| last + 2);

        info!("loaded {} records from {}", records.len(), range);
        Ok(SheetContents { records, next_row })
    }

    /// Write `record` to the free row `row` past the last known one.
    /// Returns the record as stored (date stamped).
    pub async fn append(&self, row: usize, record: &Record) -> Result<Record> {
        self.write_row(row, record).await
    }

    /// Overwrite sheet row `row`. Returns the record as stored.
    pub async fn update(&self, row: usize, record: &Record) -> Result<Record> {
        self.write_row(row, record).await
    }

    fn check_row(row: usize) -> Result<()> {
        if row < HEADER_OFFSET {
            return Err(CmsError::InvalidState("the header row is not writable"));
        }
        Ok(())
    }

    async fn write_row(&self, row: usize, record: &Record) -> Result<Record> {
        self.config.validate()?;
        Self::check_row(row)?;
        let stored = record.stamped(&(self.today)());
        let range = self.row_range(row);
        debug!("writing record '{}' to {}", stored.name, range);

        self.transport.put_values(&range, vec![stored.to_row()]).await?;
        Ok(stored)
    }

    /// Blank sheet row `row`
    pub async fn clear(&self, row: usize) -> Result<()> {
        self.config.validate()?;
        Self::check_row(row)?;
        let range = self.row_range(row);
        debug!("clearing {}", range);

        self.transport.clear_values(&range).await
    }
}
