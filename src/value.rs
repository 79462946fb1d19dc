//! The public value a cell reports through `GetValue`, as distinct from the
//! internal numeric resolver used while one formula evaluates another cell.

use std::fmt;

use crate::error::FormulaError;

/// What `GetValue` returns for a cell: a displayed number, text, or a
/// propagated formula error. A cell's raw formula source is reached through
/// `GetText` instead, so there's no `Formula` variant here, and this grammar
/// has no boolean literal, so there's no `Boolean` variant either.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// A formula's evaluated result, or a plain numeric text value.
    Number(f64),
    /// Literal (non-numeric) text, escape-prefix already stripped.
    Text(String),
    /// An evaluation failure: propagated to any dependent that consumes it.
    Error(FormulaError),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}
