//! The consumer-facing surface: `CellInterface` over a single cell,
//! `SheetInterface` over a whole sheet, and the `ParseFormula` factory.

use std::fmt;

use crate::ast::Formula;
use crate::error::EngineError;
use crate::parser;
use crate::position::{Position, Size};
use crate::sheet::Sheet;
use crate::value::CellValue;

/// Read-only view of a single cell's observable state. `Sheet` mediates
/// every call that needs cross-cell evaluation, so this is implemented on
/// `(&Sheet, Position)` / `(&mut Sheet, Position)` pairs rather than on
/// `Cell` alone, which never has enough context to resolve a formula by
/// itself.
pub trait CellInterface {
    fn get_value(&mut self) -> Result<CellValue, EngineError>;
    fn get_text(&self) -> Result<String, EngineError>;
    fn get_referenced_cells(&self) -> Result<Vec<Position>, EngineError>;
}

/// A `(Sheet, Position)` handle implementing [`CellInterface`] by delegating
/// back into the sheet, which owns the evaluation context.
pub struct CellHandle<'a> {
    sheet: &'a mut Sheet,
    pos: Position,
}

impl<'a> CellHandle<'a> {
    pub fn new(sheet: &'a mut Sheet, pos: Position) -> Self {
        CellHandle { sheet, pos }
    }
}

impl CellInterface for CellHandle<'_> {
    fn get_value(&mut self) -> Result<CellValue, EngineError> {
        self.sheet.get_value(self.pos)
    }

    fn get_text(&self) -> Result<String, EngineError> {
        self.sheet.get_text(self.pos)
    }

    fn get_referenced_cells(&self) -> Result<Vec<Position>, EngineError> {
        self.sheet.get_referenced_cells(self.pos)
    }
}

/// The sheet-level surface named by the external interfaces: edits, lookups,
/// and printing. Implemented directly on [`Sheet`] so callers can use either
/// `Sheet`'s inherent methods or this trait interchangeably.
pub trait SheetInterface {
    fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), EngineError>;

    /// A handle on the cell at `pos`, capable of answering every
    /// `CellInterface` query (including `GetValue`, which needs sheet-wide
    /// evaluation context) — `None` if `pos` is unallocated.
    fn get_cell(&mut self, pos: Position) -> Result<Option<CellHandle<'_>>, EngineError>;
    fn clear_cell(&mut self, pos: Position) -> Result<(), EngineError>;
    fn get_printable_size(&self) -> Size;
    fn print_values<W: fmt::Write>(&mut self, out: &mut W) -> fmt::Result;
    fn print_texts<W: fmt::Write>(&self, out: &mut W) -> fmt::Result;
}

impl SheetInterface for Sheet {
    fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), EngineError> {
        Sheet::set_cell(self, pos, text)
    }

    fn get_cell(&mut self, pos: Position) -> Result<Option<CellHandle<'_>>, EngineError> {
        if Sheet::get_cell(self, pos)?.is_some() {
            Ok(Some(CellHandle::new(self, pos)))
        } else {
            Ok(None)
        }
    }

    fn clear_cell(&mut self, pos: Position) -> Result<(), EngineError> {
        Sheet::clear_cell(self, pos)
    }

    fn get_printable_size(&self) -> Size {
        Sheet::get_printable_size(self)
    }

    fn print_values<W: fmt::Write>(&mut self, out: &mut W) -> fmt::Result {
        Sheet::print_values(self, out)
    }

    fn print_texts<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        Sheet::print_texts(self, out)
    }
}

/// Parse a formula body (without the leading `=`) into a [`Formula`],
/// raising `FormulaException` if it's syntactically invalid.
pub fn parse_formula(src: &str) -> Result<Formula, EngineError> {
    parser::parse_formula(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_handle_delegates_to_sheet() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::from_address("A1"), "=1+1").unwrap();
        let mut handle = CellHandle::new(&mut sheet, Position::from_address("A1"));
        assert_eq!(handle.get_value().unwrap(), CellValue::Number(2.0));
        assert_eq!(handle.get_text().unwrap(), "=1+1");
    }

    /// A caller coded only against `SheetInterface`/`CellInterface` (no
    /// concrete `Sheet` in scope) can still evaluate a cell fetched through
    /// `get_cell` and print the sheet.
    fn exercise<S: SheetInterface>(sheet: &mut S) -> (CellValue, String) {
        let mut out = String::new();
        sheet.print_values(&mut out).unwrap();
        let value = sheet
            .get_cell(Position::from_address("A1"))
            .unwrap()
            .unwrap()
            .get_value()
            .unwrap();
        (value, out)
    }

    #[test]
    fn sheet_interface_get_cell_and_printing_are_usable_through_the_trait() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::from_address("A1"), "=1+1").unwrap();
        let (value, printed) = exercise(&mut sheet);
        assert_eq!(value, CellValue::Number(2.0));
        assert_eq!(printed, "2\n");
    }

    #[test]
    fn sheet_interface_get_cell_is_none_for_unallocated_position() {
        let mut sheet = Sheet::new();
        assert!(SheetInterface::get_cell(&mut sheet, Position::from_address("A1"))
            .unwrap()
            .is_none());
    }
}
