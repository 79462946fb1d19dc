//! Per-cell content, value cache, and local dependency edges.
//!
//! Cells do not own each other: a [`Cell`] only holds its own content and
//! the two edge sets describing its place in the dependency graph. The
//! [`crate::sheet::Sheet`] owns every cell and is the only thing that
//! mediates lookups between them, rather than cells reaching into each
//! other directly.

use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::Formula;
use crate::error::FormulaError;
use crate::position::Position;

/// The escape prefix: a leading `'` on text content is stripped from the
/// displayed value but kept verbatim in the stored text form.
pub const ESCAPE_SIGN: char = '\'';
/// The leading character that marks a cell's content as a formula.
pub const FORMULA_SIGN: char = '=';

/// A cell's content, classified the way `Cell::Set` classifies raw text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellContent {
    #[default]
    Empty,
    /// Non-empty literal text. Never starts with `=`.
    Text(String),
    /// A formula cell: its parsed expression plus the last memoized
    /// evaluation (`None` means the cache is invalid).
    Formula(Rc<Formula>, Option<Result<f64, FormulaError>>),
}

impl CellContent {
    /// The text form `GetText` reports: the source exactly as stored,
    /// `'=' + canonical expression` for formulas.
    pub fn text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Formula(f, _) => format!("{FORMULA_SIGN}{}", f.get_expression()),
        }
    }

    /// The positions this content's formula references, deduplicated and
    /// ascending. Empty for non-formula content.
    pub fn referenced_cells(&self) -> Vec<Position> {
        match self {
            CellContent::Formula(f, _) => f.referenced_cells(),
            _ => Vec::new(),
        }
    }
}

/// An addressable cell: its content plus the edges it participates in.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    content: CellContent,
    /// Cells this cell references (drives cycle detection).
    pub(crate) out_refs: HashSet<Position>,
    /// Cells that reference this cell (drives cache invalidation).
    pub(crate) in_refs: HashSet<Position>,
}

impl Cell {
    pub fn new() -> Self {
        Cell::default()
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub(crate) fn set_content(&mut self, content: CellContent) {
        self.content = content;
    }

    /// Value displayed for `Text`/`Empty` content: the escape-stripped
    /// string. Returns `None` for formula content (callers evaluate that
    /// separately, through the Sheet's resolver).
    pub fn text_value(&self) -> Option<String> {
        match self.content() {
            CellContent::Empty => Some(String::new()),
            CellContent::Text(s) => {
                if s.starts_with(ESCAPE_SIGN) {
                    Some(s[ESCAPE_SIGN.len_utf8()..].to_string())
                } else {
                    Some(s.clone())
                }
            }
            CellContent::Formula(..) => None,
        }
    }

    pub fn get_text(&self) -> String {
        self.content().text()
    }

    pub fn referenced_cells(&self) -> Vec<Position> {
        self.content().referenced_cells()
    }

    pub fn is_referenced(&self) -> bool {
        !self.in_refs.is_empty()
    }

    pub(crate) fn set_cache(&mut self, value: Result<f64, FormulaError>) {
        if let CellContent::Formula(f, _) = &self.content {
            let f = Rc::clone(f);
            self.content = CellContent::Formula(f, Some(value));
        }
    }

    /// Invalidate this cell's cache. Returns `true` if it had been valid
    /// (the caller should keep walking into `in_refs`), `false` if it was
    /// already invalid or isn't a formula cell (the walk should stop here).
    pub(crate) fn invalidate_cache(&mut self) -> bool {
        match &self.content {
            CellContent::Formula(f, Some(_)) => {
                let f = Rc::clone(f);
                self.content = CellContent::Formula(f, None);
                true
            }
            _ => false,
        }
    }

}

/// Classify raw `SetCell` text into content, without yet parsing formulas.
pub(crate) enum Classified {
    Empty,
    Text(String),
    FormulaSource(String),
}

pub(crate) fn classify(text: &str) -> Classified {
    if text.is_empty() {
        Classified::Empty
    } else if text.len() >= 2 && text.starts_with(FORMULA_SIGN) {
        Classified::FormulaSource(text[FORMULA_SIGN.len_utf8()..].to_string())
    } else {
        Classified::Text(text.to_string())
    }
}
