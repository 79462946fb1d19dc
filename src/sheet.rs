//! Sparse 2-D cell storage, edit operations, cycle detection, and printing.
//!
//! A single map owns every cell; edges between cells are represented by
//! `Position` keys rather than pointers, since the map itself is the only
//! stable identity cells need.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::ast::Formula;
use crate::cell::{self, Cell, CellContent, Classified, ESCAPE_SIGN};
use crate::error::{EngineError, FormulaError};
use crate::parser;
use crate::position::{Position, Size};
use crate::value::CellValue;

/// A sheet of cells, addressed by [`Position`].
#[derive(Debug, Default)]
pub struct Sheet {
    cells: HashMap<Position, Cell>,
}

impl Sheet {
    pub fn new() -> Self {
        Sheet::default()
    }

    /// Set `pos`'s content from raw text, classifying it, parsing a formula
    /// if needed, rejecting it on a would-be cycle, and otherwise committing
    /// it with edges rebuilt and caches invalidated along `in_refs*`.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition);
        }
        // Allocate eagerly so a self-referencing formula sees its own
        // position as an existing identity during the cycle check below.
        // Tracked so every error path below can undo this speculative
        // allocation for a position that wasn't already there.
        let preexisted = self.cells.contains_key(&pos);
        self.cells.entry(pos).or_insert_with(Cell::new);

        let current_text = self.cells[&pos].get_text();
        if current_text == text {
            return Ok(());
        }

        let new_content = match cell::classify(text) {
            Classified::Empty => CellContent::Empty,
            Classified::Text(s) => CellContent::Text(s),
            Classified::FormulaSource(src) => match parser::parse_formula(&src) {
                Ok(formula) => CellContent::Formula(Rc::new(formula), None),
                Err(e) => {
                    if !preexisted {
                        self.cells.remove(&pos);
                    }
                    return Err(e);
                }
            },
        };

        let tentative_refs = new_content.referenced_cells();
        let targets: HashSet<Position> = tentative_refs
            .iter()
            .copied()
            .filter(|p| self.cells.contains_key(p))
            .collect();

        if self.has_cycle(pos, &targets) {
            log::warn!("rejecting edit at {pos}: would create a circular dependency");
            if !preexisted {
                self.cells.remove(&pos);
            }
            return Err(EngineError::CircularDependency(pos.to_string()));
        }

        let old_out_refs: Vec<Position> = self.cells[&pos].out_refs.iter().copied().collect();
        for v in &old_out_refs {
            if let Some(vc) = self.cells.get_mut(v) {
                vc.in_refs.remove(&pos);
            }
        }

        let mut new_out_refs = HashSet::with_capacity(tentative_refs.len());
        for p in &tentative_refs {
            self.cells.entry(*p).or_insert_with(Cell::new);
            self.cells.get_mut(p).unwrap().in_refs.insert(pos);
            new_out_refs.insert(*p);
        }

        let entry = self.cells.get_mut(&pos).unwrap();
        entry.set_content(new_content);
        entry.out_refs = new_out_refs;

        log::debug!("set {pos} = {text:?}");
        self.invalidate_ancestors(pos);

        Ok(())
    }

    /// `Clear(pos)`: equivalent to `SetCell(pos, "")`.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition);
        }
        if !self.cells.contains_key(&pos) {
            return Ok(());
        }
        self.set_cell(pos, "")?;
        if let Some(cell) = self.cells.get(&pos) {
            if !cell.is_referenced() {
                self.cells.remove(&pos);
                log::trace!("deallocated unreferenced empty cell {pos}");
            }
        }
        Ok(())
    }

    /// Borrow the cell at `pos`, or `None` if the slot is unallocated.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition);
        }
        Ok(self.cells.get(&pos))
    }

    /// `pos`'s text form: `""` for an unallocated or empty slot, the literal
    /// text for a text cell, `'=' + canonical expression` for a formula.
    pub fn get_text(&self, pos: Position) -> Result<String, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition);
        }
        Ok(self.cells.get(&pos).map(Cell::get_text).unwrap_or_default())
    }

    /// Deduplicated ascending positions `pos`'s formula references; empty
    /// for non-formula content or an unallocated slot.
    pub fn get_referenced_cells(&self, pos: Position) -> Result<Vec<Position>, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition);
        }
        Ok(self.cells.get(&pos).map(Cell::referenced_cells).unwrap_or_default())
    }

    /// `pos`'s displayed value: the cell's text for `Empty`/`Text` content,
    /// or a formula's evaluation (cached if valid, freshly computed and
    /// memoized otherwise).
    pub fn get_value(&mut self, pos: Position) -> Result<CellValue, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition);
        }
        let cell = match self.cells.get(&pos) {
            None => return Ok(CellValue::Text(String::new())),
            Some(c) => c,
        };
        match cell.text_value() {
            Some(display) => Ok(CellValue::Text(display)),
            None => match self.value_at(pos) {
                Ok(n) => Ok(CellValue::Number(n)),
                Err(e) => Ok(CellValue::Error(e)),
            },
        }
    }

    /// `(maxRow+1, maxCol+1)` over cells with non-empty text; `(0,0)` if none.
    pub fn get_printable_size(&self) -> Size {
        let mut max_row: i64 = -1;
        let mut max_col: i64 = -1;
        for (pos, c) in &self.cells {
            if !c.get_text().is_empty() {
                max_row = max_row.max(pos.row);
                max_col = max_col.max(pos.col);
            }
        }
        if max_row < 0 {
            Size::new(0, 0)
        } else {
            Size::new(max_row + 1, max_col + 1)
        }
    }

    /// Emit the printable region's values, tab-separated per row with a
    /// trailing newline per row.
    pub fn print_values<W: fmt::Write>(&mut self, out: &mut W) -> fmt::Result {
        let size = self.get_printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    out.write_char('\t')?;
                }
                let pos = Position::new(row, col);
                if self.cells.contains_key(&pos) {
                    let value = self.get_value(pos).expect("position inside the printable size is always valid");
                    write!(out, "{value}")?;
                }
            }
            out.write_char('\n')?;
        }
        Ok(())
    }

    /// Emit the printable region's texts, same layout as [`Sheet::print_values`].
    pub fn print_texts<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let size = self.get_printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    out.write_char('\t')?;
                }
                let pos = Position::new(row, col);
                if let Some(c) = self.cells.get(&pos) {
                    write!(out, "{}", c.get_text())?;
                }
            }
            out.write_char('\n')?;
        }
        Ok(())
    }

    /// The resolver passed to a formula's AST: reads another cell's value as
    /// a number, coercing text and propagating errors, per §4.6.
    fn value_at(&mut self, pos: Position) -> Result<f64, FormulaError> {
        if !pos.is_valid() {
            return Err(FormulaError::Ref);
        }

        enum Dispatch {
            Zero,
            Text(String),
            Cached(Result<f64, FormulaError>),
            Uncached(Rc<Formula>),
        }

        let dispatch = match self.cells.get(&pos) {
            None => Dispatch::Zero,
            Some(c) => match c.content() {
                CellContent::Empty => Dispatch::Zero,
                CellContent::Text(s) => Dispatch::Text(s.clone()),
                CellContent::Formula(_, Some(cached)) => Dispatch::Cached(*cached),
                CellContent::Formula(f, None) => Dispatch::Uncached(Rc::clone(f)),
            },
        };

        match dispatch {
            Dispatch::Zero => Ok(0.0),
            Dispatch::Text(s) => {
                let display = s.strip_prefix(ESCAPE_SIGN).unwrap_or(&s);
                if display.is_empty() {
                    Ok(0.0)
                } else {
                    parse_strict_decimal(display).ok_or(FormulaError::Value)
                }
            }
            Dispatch::Cached(v) => v,
            Dispatch::Uncached(formula) => {
                log::trace!("evaluating formula at {pos}");
                let result = formula.evaluate(&mut |rp| self.value_at(rp));
                if let Some(c) = self.cells.get_mut(&pos) {
                    c.set_cache(result);
                }
                result
            }
        }
    }

    /// A cycle exists iff `u` itself is among `targets` (a direct
    /// self-reference), or some member of `targets` can reach `u` over the
    /// *current* graph.
    ///
    /// This walks forward from each target rather than forward from `u`:
    /// searching from `u` would have to traverse `u`'s own current
    /// out-edges, which are exactly the edges this edit is about to
    /// replace, and following them produces false positives whenever the
    /// new formula retains a previously-referenced cell (harmless, common
    /// edits would be rejected as circular). Searching from the tentative
    /// targets only ever crosses edges this edit leaves alone.
    fn has_cycle(&self, u: Position, targets: &HashSet<Position>) -> bool {
        if targets.contains(&u) {
            return true;
        }
        let mut visited = HashSet::new();
        let mut stack: Vec<Position> = targets.iter().copied().collect();
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            if node == u {
                return true;
            }
            if let Some(cell) = self.cells.get(&node) {
                for &next in &cell.out_refs {
                    if !visited.contains(&next) {
                        stack.push(next);
                    }
                }
            }
        }
        false
    }

    /// Walk `in_refs` from `start`, invalidating each formula cell's cache.
    /// Stops descending into a branch once a cell is found already invalid
    /// (or not a formula cell), keeping the walk bounded by the ancestor
    /// closure rather than revisiting settled subgraphs.
    fn invalidate_ancestors(&mut self, start: Position) {
        let mut stack: Vec<Position> = self
            .cells
            .get(&start)
            .map(|c| c.in_refs.iter().copied().collect())
            .unwrap_or_default();
        let mut visited = HashSet::new();
        while let Some(p) = stack.pop() {
            if !visited.insert(p) {
                continue;
            }
            if let Some(cell) = self.cells.get_mut(&p) {
                if cell.invalidate_cache() {
                    log::trace!("invalidated cache at {p}");
                    stack.extend(cell.in_refs.iter().copied());
                }
            }
        }
    }
}

/// Parse `s` as a decimal number, requiring the entire string to match and
/// the result to be finite.
fn parse_strict_decimal(s: &str) -> Option<f64> {
    let v: f64 = s.parse().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}
