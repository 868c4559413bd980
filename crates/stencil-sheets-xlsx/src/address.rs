//! A1-style addresses as stored inside the package
//!
//! Inside the XML parts cells are addressed with ordinary base-26 column
//! letters (`A`..`XFD`), independent of the references templates are filled
//! with.

use stencil_sheets_core::{MAX_COLS, MAX_ROWS};

/// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
pub(crate) fn column_to_letters(col: u16) -> String {
    let mut result = String::new();
    let mut n = col as u32 + 1; // 1-based for calculation

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Format a 0-based position as an A1 string
pub(crate) fn to_a1(row: u32, col: u16) -> String {
    format!("{}{}", column_to_letters(col), row + 1)
}

/// Parse an A1 string into a 0-based `(row, col)` position
pub(crate) fn parse_a1(s: &str) -> Option<(u32, u16)> {
    let s = s.trim();
    let letters_end = s
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    let (letters, digits) = s.split_at(letters_end);
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if col > MAX_COLS as u32 {
            return None;
        }
    }

    let row: u32 = digits.parse().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }

    Some((row - 1, (col - 1) as u16))
}
