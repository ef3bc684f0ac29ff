use super::SheetTransport;
use crate::config::letter_to_col;
use crate::error::{CmsError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Mutex;

lazy_static! {
    static ref A1_RANGE_REGEX: Regex =
        Regex::new(r"^(?:.+!)?([A-Z]+)([0-9]+):([A-Z]+)([0-9]+)$").unwrap();
}

#[derive(Default)]
struct Grid {
    rows: Vec<Vec<String>>,
    calls: Vec<String>,
    fail_status: Option<u16>,
}

/// In-process stand-in for a spreadsheet tab
///
/// Behaves like the values API as far as the adapter can tell: trailing blank
/// cells and rows are not returned, writes overwrite, clears blank in place.
#[derive(Default)]
pub struct MemorySheet {
    grid: Mutex<Grid>,
}

struct A1Range {
    first_col: usize,
    first_row: usize,
    last_col: usize,
    last_row: usize,
}

fn parse_range(range: &str) -> Result<A1Range> {
    let caps = A1_RANGE_REGEX
        .captures(range)
        .ok_or_else(|| CmsError::Configuration(format!("unparseable range '{}'", range)))?;
    let number = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| CmsError::Configuration(format!("unparseable range '{}'", range)))
    };
    Ok(A1Range {
        first_col: letter_to_col(&caps[1]),
        first_row: number(&caps[2])?,
        last_col: letter_to_col(&caps[3]),
        last_row: number(&caps[4])?,
    })
}

fn trim_row(row: &[String]) -> Vec<String> {
    let len = row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
    row[..len].to_vec()
}

impl MemorySheet {
    /// Tab preloaded with `rows`, the first one landing on sheet row 1
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        MemorySheet {
            grid: Mutex::new(Grid {
                rows,
                ..Grid::default()
            }),
        }
    }

    /// Cells of 1-based sheet row `row`, empty when the row was never written
    pub fn row(&self, row: usize) -> Vec<String> {
        let grid = self.grid.lock().unwrap();
        row.checked_sub(1)
            .and_then(|i| grid.rows.get(i))
            .cloned()
            .unwrap_or_default()
    }

    /// Requests seen so far, as `"<METHOD> <range>"`
    pub fn calls(&self) -> Vec<String> {
        self.grid.lock().unwrap().calls.clone()
    }

    /// Make the next request fail with `status` and leave the grid untouched
    pub fn fail_next(&self, status: u16) {
        self.grid.lock().unwrap().fail_status = Some(status);
    }

    fn begin(&self, method: &str, operation: &'static str, range: &str) -> Result<()> {
        let mut grid = self.grid.lock().unwrap();
        grid.calls.push(format!("{} {}", method, range));
        match grid.fail_status.take() {
            Some(status) => Err(CmsError::Transport { operation, status }),
            None => Ok(()),
        }
    }
}

impl SheetTransport for MemorySheet {
    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        self.begin("GET", "load", range)?;
        let bounds = parse_range(range)?;
        let grid = self.grid.lock().unwrap();

        let mut values: Vec<Vec<String>> = grid
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| i + 1 >= bounds.first_row && i + 1 <= bounds.last_row)
            .map(|(_, row)| {
                let start = (bounds.first_col - 1).min(row.len());
                let end = bounds.last_col.min(row.len());
                trim_row(&row[start..end])
            })
            .collect();

        while values.last().is_some_and(|r| r.is_empty()) {
            values.pop();
        }
        Ok(values)
    }

    async fn put_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<()> {
        self.begin("PUT", "save", range)?;
        let bounds = parse_range(range)?;
        let mut grid = self.grid.lock().unwrap();

        for (offset, cells) in values.into_iter().enumerate() {
            let index = bounds.first_row - 1 + offset;
            if grid.rows.len() <= index {
                grid.rows.resize(index + 1, Vec::new());
            }
            let row = &mut grid.rows[index];
            if row.len() < bounds.last_col {
                row.resize(bounds.last_col, String::new());
            }
            for (col, value) in cells.into_iter().enumerate() {
                if let Some(slot) = row.get_mut(bounds.first_col - 1 + col) {
                    *slot = value;
                }
            }
        }
        Ok(())
    }

    async fn clear_values(&self, range: &str) -> Result<()> {
        self.begin("CLEAR", "delete", range)?;
        let bounds = parse_range(range)?;
        let mut grid = self.grid.lock().unwrap();

        let last = bounds.last_row.min(grid.rows.len());
        for index in (bounds.first_row - 1)..last {
            for col in (bounds.first_col - 1)..bounds.last_col {
                if let Some(cell) = grid.rows[index].get_mut(col) {
                    cell.clear();
                }
            }
        }
        Ok(())
    }
}
