//! Textual cell references used by templates
//!
//! A reference is written as `<column-letters><row-digits>`, e.g. `"B12"`.
//! The row is 1-based as written. The column letters are decoded with a
//! band scheme rather than the usual base-26 spreadsheet numbering:
//!
//! - one letter: `A` = 0, `B` = 1, ... `Z` = 25
//! - two letters: the first letter picks a 26-wide band (`A` = 26, `B` = 52,
//!   `C` = 78, `D` = 104) and the second letter is the offset inside it
//!
//! Only first letters `A` to `D` open a band. Any other first letter keeps its
//! single-letter value, so `"EA1"` addresses the same column as `"E1"`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A cell reference as written in a template (e.g., "B12", "AB3")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellReference {
    /// Row number (1-based, as written)
    row: u32,
    /// Column letters, decoded lazily by [`CellReference::column`]
    column: String,
}

impl CellReference {
    /// Create a reference from an already known row and column letters
    pub fn new<S: Into<String>>(row: u32, column: S) -> Self {
        Self {
            row,
            column: column.into(),
        }
    }

    /// Parse a reference such as `"B12"`
    ///
    /// The first decimal digit ends the column part. Everything after it is
    /// the row part and must be a base-10 number.
    ///
    /// # Examples
    /// ```
    /// use stencil_sheets_core::CellReference;
    ///
    /// let reference = CellReference::parse("AB3").unwrap();
    /// assert_eq!(reference.row(), 3);
    /// assert_eq!(reference.column().unwrap(), 27);
    ///
    /// assert!(CellReference::parse("B").is_err());
    /// ```
    pub fn parse(index: &str) -> Result<Self> {
        let split = index
            .char_indices()
            .find(|(_, c)| decimal_digit(*c).is_some())
            .map(|(i, _)| i)
            .unwrap_or(index.len());

        let (column, row) = index.split_at(split);
        let row = parse_row(row).ok_or_else(|| Error::InvalidRow(index.to_string()))?;

        Ok(Self {
            row,
            column: column.to_string(),
        })
    }

    /// Row number, 1-based, exactly as written
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Column letters, exactly as written
    pub fn column_letters(&self) -> &str {
        &self.column
    }

    /// Decode the column letters into a 0-based column index
    pub fn column(&self) -> Result<i32> {
        let mut chars = self.column.chars();
        let first = chars
            .next()
            .ok_or_else(|| Error::InvalidColumn(self.to_string()))?;
        let value = self.letter_value(first)?;

        // Bands only apply to exactly two letters
        let (Some(second), None) = (chars.next(), chars.next()) else {
            return Ok(value);
        };
        let offset = self.letter_value(second)?;

        Ok(match first {
            'A' => 26 + offset,
            'B' => 52 + offset,
            'C' => 78 + offset,
            'D' => 104 + offset,
            _ => value,
        })
    }

    /// 0-based `(row, column)` position used to address cell storage
    pub fn position(&self) -> Result<(u32, u16)> {
        if self.row == 0 || self.row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(self.row, MAX_ROWS));
        }

        let col = self.column()?;
        if col < 0 || col >= i32::from(MAX_COLS) {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }

        Ok((self.row - 1, col as u16))
    }

    fn letter_value(&self, c: char) -> Result<i32> {
        digit_value(c)
            .map(|v| v as i32 - 10)
            .ok_or_else(|| Error::InvalidColumn(self.to_string()))
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

impl FromStr for CellReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Numeric value of a character: digits are 0-9, letters continue from 10
///
/// Latin letters of either case map to 10-35, including their full-width
/// forms. Characters without a numeric value return `None`.
pub fn digit_value(c: char) -> Option<u32> {
    match c {
        '0'..='9' | 'a'..='z' | 'A'..='Z' => c.to_digit(36),
        '\u{FF10}'..='\u{FF19}' => Some(c as u32 - 0xFF10),
        '\u{FF21}'..='\u{FF3A}' => Some(c as u32 - 0xFF21 + 10),
        '\u{FF41}'..='\u{FF5A}' => Some(c as u32 - 0xFF41 + 10),
        _ => None,
    }
}

/// Zero of every run of ten Unicode decimal digits (general category Nd)
const DIGIT_ZEROS: [u32; 47] = [
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x11066, 0x110F0, 0x11136, 0x111D0, 0x1D7CE,
    0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6,
];

/// Value of any Unicode decimal digit, e.g. `7`, `７` or `٧`
fn decimal_digit(c: char) -> Option<u32> {
    let c = c as u32;
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&c))
        .map(|zero| c - zero)
}

fn parse_row(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }

    s.chars().try_fold(0u32, |acc, c| {
        let digit = decimal_digit(c)?;
        acc.checked_mul(10)?.checked_add(digit)
    })
}
