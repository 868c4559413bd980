//! Cell value types

use std::fmt;

/// Content of a single cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Nothing written
    Empty,

    Boolean(bool),

    /// Numeric value (integers are stored as f64 too)
    Number(f64),

    String(String),

    /// Error literal carried from a template (e.g., "#N/A")
    Error(String),

    /// Formula carried from a template, never evaluated
    Formula {
        /// Formula text without the leading '='
        text: String,
        /// Value cached by the application that last saved the file
        cached: Option<Box<CellValue>>,
    },
}

impl CellValue {
    /// Text value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Create a new formula value; a leading '=' is dropped
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let text = match text.strip_prefix('=') {
            Some(stripped) => stripped.to_string(),
            None => text,
        };
        CellValue::Formula { text, cached: None }
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the value is a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula { .. })
    }

    /// Get as number, if numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Formula {
                cached: Some(v), ..
            } => v.as_number(),
            _ => None,
        }
    }

    /// Get as boolean, if boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Formula {
                cached: Some(v), ..
            } => v.as_bool(),
            _ => None,
        }
    }

    /// Get as string slice, if the cell holds string content
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            CellValue::Formula {
                cached: Some(v), ..
            } => v.as_string(),
            _ => None,
        }
    }

    /// Get the type name (for error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::String(_) => "string",
            CellValue::Error(_) => "error",
            CellValue::Formula { .. } => "formula",
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Error(e) => write!(f, "{}", e),
            CellValue::Formula { text, .. } => write!(f, "={}", text),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&String> for CellValue {
    fn from(s: &String) -> Self {
        CellValue::string(s.as_str())
    }
}

/// A cell: its value and the template style index it carries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// The cell's value
    pub value: CellValue,
    /// Index into the workbook's cell formats (0 = default style)
    pub style: u32,
}

impl Cell {
    /// Cell with the default style
    pub fn new(value: CellValue) -> Self {
        Self { value, style: 0 }
    }

    pub fn with_style(value: CellValue, style: u32) -> Self {
        Self { value, style }
    }

    /// No value and no style: nothing worth storing
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style == 0
    }
}
