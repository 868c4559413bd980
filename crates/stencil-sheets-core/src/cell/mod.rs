//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellReference`] - A textual cell location (e.g., "B12") and its decoding
//! - [`CellValue`] - The value stored in a cell
//! - [`Cell`] - Value plus the template style it carries

mod reference;
mod value;

pub use reference::{digit_value, CellReference};
pub use value::{Cell, CellValue};
