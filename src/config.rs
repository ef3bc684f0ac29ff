use crate::error::{CmsError, Result};
use crate::record::COLUMN_COUNT;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref RANGE_REGEX: Regex = Regex::new(r"^([A-Z]+)([0-9]+):([A-Z]+)([0-9]+)$").unwrap();
}

pub const API_KEY_PLACEHOLDER: &str = "YOUR_GOOGLE_SHEETS_API_KEY_HERE";
pub const SHEET_ID_PLACEHOLDER: &str = "YOUR_GOOGLE_SHEET_ID_HERE";
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_SHEET_RANGE: &str = "A1:N1000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the component rows live and how to reach them
#[derive(Clone, Debug, PartialEq)]
pub struct SheetConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,

    /// Spreadsheet id (the long token in the sheet URL)
    pub sheet_id: String,

    /// Tab name inside the spreadsheet
    pub sheet_name: String,

    /// Cell range holding the header row and the data rows, e.g. `A1:N1000`
    pub sheet_range: String,

    /// Values endpoint root, overridable for tests and proxies
    pub base_url: String,

    /// Upper bound for a single HTTP request
    pub timeout: Duration,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            api_key: API_KEY_PLACEHOLDER.to_string(),
            sheet_id: SHEET_ID_PLACEHOLDER.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            sheet_range: DEFAULT_SHEET_RANGE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SheetConfig {
    /// Check that every store operation has what it needs
    pub fn validate(&self) -> Result<()> {
        if is_unset(&self.api_key, API_KEY_PLACEHOLDER) {
            return Err(CmsError::Configuration(
                "Google Sheets API key not configured".to_string(),
            ));
        }
        if is_unset(&self.sheet_id, SHEET_ID_PLACEHOLDER) {
            return Err(CmsError::Configuration(
                "Google Sheet ID not configured".to_string(),
            ));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(CmsError::Configuration(
                "sheet name must not be empty".to_string(),
            ));
        }
        self.range_bounds().map(|_| ())
    }

    /// Last column and last row of the configured range
    pub fn range_bounds(&self) -> Result<(usize, usize)> {
        let caps = RANGE_REGEX.captures(self.sheet_range.trim()).ok_or_else(|| {
            CmsError::Configuration(format!(
                "invalid sheet range '{}', expected e.g. A1:N1000",
                self.sheet_range
            ))
        })?;

        if &caps[1] != "A" || &caps[2] != "1" {
            return Err(CmsError::Configuration(format!(
                "sheet range '{}' must start at A1 (the header row)",
                self.sheet_range
            )));
        }

        let last_col = letter_to_col(&caps[3]);
        let last_row: usize = caps[4].parse().map_err(|_| {
            CmsError::Configuration(format!("invalid row bound in '{}'", self.sheet_range))
        })?;

        if last_col < COLUMN_COUNT {
            return Err(CmsError::Configuration(format!(
                "sheet range '{}' must span at least {} columns",
                self.sheet_range, COLUMN_COUNT
            )));
        }
        if last_row < 2 {
            return Err(CmsError::Configuration(format!(
                "sheet range '{}' has no room for data rows",
                self.sheet_range
            )));
        }

        Ok((last_col, last_row))
    }
}

fn is_unset(value: &str, placeholder: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == placeholder
}

/// Spreadsheet column letters to a 1-based index (A=1, Z=26, AA=27)
pub fn letter_to_col(letters: &str) -> usize {
    letters
        .chars()
        .fold(0, |acc, c| acc * 26 + (c as usize - 'A' as usize + 1))
}

/// 1-based column index to spreadsheet letters
pub fn col_to_letter(col: usize) -> String {
    let mut n = col;
    let mut name = String::new();
    while n > 0 {
        n -= 1;
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> SheetConfig {
        SheetConfig {
            api_key: "key-123".to_string(),
            sheet_id: "sheet-abc".to_string(),
            ..SheetConfig::default()
        }
    }

    #[test]
    fn placeholders_count_as_unset() {
        let err = SheetConfig::default().validate().unwrap_err();
        assert!(err.is_configuration());

        let mut cfg = configured();
        cfg.sheet_id = SHEET_ID_PLACEHOLDER.to_string();
        assert!(cfg.validate().unwrap_err().is_configuration());

        cfg.sheet_id = "  ".to_string();
        assert!(cfg.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn default_range_is_accepted() {
        let cfg = configured();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.range_bounds().unwrap(), (14, 1000));
    }

    #[test]
    fn narrow_or_offset_ranges_are_rejected() {
        let mut cfg = configured();
        cfg.sheet_range = "A1:M1000".to_string();
        assert!(cfg.validate().is_err());

        cfg.sheet_range = "B2:N1000".to_string();
        assert!(cfg.validate().is_err());

        cfg.sheet_range = "A1:N1".to_string();
        assert!(cfg.validate().is_err());

        cfg.sheet_range = "whatever".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn column_letters_round_trip() {
        assert_eq!(letter_to_col("A"), 1);
        assert_eq!(letter_to_col("N"), 14);
        assert_eq!(letter_to_col("AA"), 27);
        assert_eq!(col_to_letter(14), "N");
        assert_eq!(col_to_letter(52), "AZ");
    }
}
