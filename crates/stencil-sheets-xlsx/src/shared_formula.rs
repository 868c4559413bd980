//! Shared formulas
//!
//! When a formula is filled down, Excel stores its text once on the master
//! cell (`<f t="shared" ref="B1:B9" si="0">A1*2</f>`) and leaves the other
//! cells of the range textless (`<f t="shared" si="0"/>`). Followers get
//! their own text here by moving the master's relative references.

use crate::address::{column_to_letters, parse_a1};
use stencil_sheets_core::{MAX_COLS, MAX_ROWS};

/// Master cell of a shared formula group
#[derive(Debug, Clone)]
pub(crate) struct SharedFormula {
    row: u32,
    col: u16,
    text: String,
}

impl SharedFormula {
    pub(crate) fn new(row: u32, col: u16, text: String) -> Self {
        Self { row, col, text }
    }

    /// Formula text as seen from another cell of the group
    pub(crate) fn text_at(&self, row: u32, col: u16) -> String {
        shift_references(
            &self.text,
            i64::from(row) - i64::from(self.row),
            i64::from(col) - i64::from(self.col),
        )
    }
}

/// Move every relative cell reference in `formula` by `rows` and `cols`
///
/// `$`-anchored parts stay put. String literals, quoted sheet names and
/// bracketed parts are copied untouched. A reference pushed off the sheet
/// becomes `#REF!`.
pub(crate) fn shift_references(formula: &str, rows: i64, cols: i64) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let end = match c {
            '"' | '\'' => quoted_end(&chars, i, c),
            '[' => chars[i..]
                .iter()
                .position(|&ch| ch == ']')
                .map_or(chars.len(), |p| i + p + 1),
            c if is_token_char(c) => {
                let end = chars[i..]
                    .iter()
                    .position(|&ch| !is_token_char(ch))
                    .map_or(chars.len(), |p| i + p);
                let token: String = chars[i..end].iter().collect();
                let is_call = chars.get(end) == Some(&'(');
                match CellRef::parse(&token).filter(|_| !is_call) {
                    Some(reference) => out.push_str(&reference.shifted(rows, cols)),
                    None => out.push_str(&token),
                }
                i = end;
                continue;
            }
            _ => i + 1,
        };
        out.extend(&chars[i..end]);
        i = end;
    }

    out
}

/// Index just past the closing quote; a doubled quote is an escaped one
fn quoted_end(chars: &[char], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '$' | '_' | '.' | '\\')
}

/// A single-cell reference such as `B$3`
struct CellRef {
    row: u32,
    col: u16,
    row_anchored: bool,
    col_anchored: bool,
}

impl CellRef {
    fn parse(token: &str) -> Option<Self> {
        let (col_anchored, rest) = match token.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let letters_end = rest.find(|c: char| !c.is_ascii_alphabetic())?;
        let (letters, rest) = rest.split_at(letters_end);
        let (row_anchored, digits) = match rest.strip_prefix('$') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let (row, col) = parse_a1(&format!("{}{}", letters, digits))?;
        Some(Self {
            row,
            col,
            row_anchored,
            col_anchored,
        })
    }

    fn shifted(&self, rows: i64, cols: i64) -> String {
        let row = i64::from(self.row) + if self.row_anchored { 0 } else { rows };
        let col = i64::from(self.col) + if self.col_anchored { 0 } else { cols };
        if !(0..i64::from(MAX_ROWS)).contains(&row) || !(0..i64::from(MAX_COLS)).contains(&col) {
            return "#REF!".to_string();
        }

        format!(
            "{}{}{}{}",
            if self.col_anchored { "$" } else { "" },
            column_to_letters(col as u16),
            if self.row_anchored { "$" } else { "" },
            row + 1
        )
    }
}
