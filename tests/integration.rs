//! Black-box scenarios against the public API: arithmetic, reference chains
//! and cache invalidation, text/number coercion, materializing cells
//! referenced before they're set, cycle rejection, error propagation,
//! printing, and a handful of edit-boundary edge cases (no-op re-edits,
//! self-references, clearing unallocated cells, the escape sign, and
//! out-of-range references).

use cellgraph::{CellValue, EngineError, FormulaError, Position, Sheet};

fn pos(addr: &str) -> Position {
    Position::from_address(addr)
}

#[test]
fn arithmetic() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=1+2*3").unwrap();
    assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Number(7.0));
    assert_eq!(sheet.get_text(pos("A1")).unwrap(), "=1+2*3");
}

#[test]
fn reference_chain_propagates_edits() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=B1+1").unwrap();
    sheet.set_cell(pos("B1"), "=C1*2").unwrap();
    sheet.set_cell(pos("C1"), "3").unwrap();
    assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Number(7.0));

    sheet.set_cell(pos("C1"), "10").unwrap();
    assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Number(21.0));
}

#[test]
fn text_as_number_and_escape_sign() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "3.5").unwrap();
    sheet.set_cell(pos("A2"), "=A1*2").unwrap();
    assert_eq!(sheet.get_value(pos("A2")).unwrap(), CellValue::Number(7.0));

    sheet.set_cell(pos("A1"), "'3.5").unwrap();
    assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Text("3.5".to_string()));
    assert_eq!(sheet.get_value(pos("A2")).unwrap(), CellValue::Error(FormulaError::Value));
}

#[test]
fn referencing_an_unset_cell_materializes_it_as_empty() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=Z9+5").unwrap();
    assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Number(5.0));

    let z9 = sheet.get_cell(pos("Z9")).unwrap().unwrap();
    assert!(z9.is_referenced());

    sheet.clear_cell(pos("Z9")).unwrap();
    assert!(sheet.get_cell(pos("Z9")).unwrap().is_some());
    assert_eq!(sheet.get_value(pos("Z9")).unwrap(), CellValue::Text(String::new()));
}

#[test]
fn cycle_is_rejected_and_state_is_unchanged() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=B1").unwrap();
    sheet.set_cell(pos("B1"), "=C1").unwrap();

    let before_text = sheet.get_text(pos("C1")).unwrap();
    let before_refs = sheet.get_referenced_cells(pos("C1")).unwrap();

    let err = sheet.set_cell(pos("C1"), "=A1").unwrap_err();
    assert!(matches!(err, EngineError::CircularDependency(_)));

    assert_eq!(sheet.get_text(pos("C1")).unwrap(), before_text);
    assert_eq!(sheet.get_referenced_cells(pos("C1")).unwrap(), before_refs);
}

#[test]
fn division_by_zero_propagates_as_arithmetic_error() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=1/0").unwrap();
    assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Error(FormulaError::Arithmetic));

    sheet.set_cell(pos("A2"), "=A1+1").unwrap();
    assert_eq!(sheet.get_value(pos("A2")).unwrap(), CellValue::Error(FormulaError::Arithmetic));
}

#[test]
fn print_values_layout() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "meow").unwrap();
    sheet.set_cell(pos("B2"), "=2+2").unwrap();

    let mut out = String::new();
    sheet.print_values(&mut out).unwrap();
    assert_eq!(out, "meow\t\n\t4\n");

    let size = sheet.get_printable_size();
    assert_eq!((size.rows, size.cols), (2, 2));
}

#[test]
fn print_texts_layout() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "meow").unwrap();
    sheet.set_cell(pos("B2"), "=2+2").unwrap();

    let mut out = String::new();
    sheet.print_texts(&mut out).unwrap();
    assert_eq!(out, "meow\t\n\t=2+2\n");
}

#[test]
fn retaining_a_reference_across_an_edit_is_not_a_cycle() {
    // A formula that keeps a previously-referenced cell while dropping
    // another must never be rejected as circular.
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=B1+C1").unwrap();
    sheet.set_cell(pos("A1"), "=C1").unwrap();
    assert_eq!(sheet.get_text(pos("A1")).unwrap(), "=C1");
}

#[test]
fn self_reference_is_rejected_as_a_single_node_cycle() {
    let mut sheet = Sheet::new();
    let err = sheet.set_cell(pos("A1"), "=A1+1").unwrap_err();
    assert!(matches!(err, EngineError::CircularDependency(_)));
    assert_eq!(sheet.get_text(pos("A1")).unwrap(), "");
}

#[test]
fn reset_with_identical_text_is_a_no_op() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=B1+1").unwrap();
    sheet.set_cell(pos("B1"), "5").unwrap();
    assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Number(6.0));

    sheet.set_cell(pos("A1"), "=B1+1").unwrap();
    assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Number(6.0));
}

#[test]
fn clear_on_unallocated_cell_is_a_no_op() {
    let mut sheet = Sheet::new();
    sheet.clear_cell(pos("A1")).unwrap();
    assert!(sheet.get_cell(pos("A1")).unwrap().is_none());
}

#[test]
fn double_escape_sign_strips_only_the_first_character() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "''foo").unwrap();
    assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Text("'foo".to_string()));
    assert_eq!(sheet.get_text(pos("A1")).unwrap(), "''foo");
}

#[test]
fn out_of_range_cell_ref_in_formula_is_a_parse_error() {
    let mut sheet = Sheet::new();
    let err = sheet.set_cell(pos("A1"), "=ZZZZ1+1").unwrap_err();
    assert!(matches!(err, EngineError::FormulaException(_)));
    assert!(sheet.get_cell(pos("A1")).unwrap().is_none());
}

#[test]
fn rejected_self_reference_on_a_fresh_position_leaves_no_phantom_cell() {
    let mut sheet = Sheet::new();
    let err = sheet.set_cell(pos("A1"), "=A1+1").unwrap_err();
    assert!(matches!(err, EngineError::CircularDependency(_)));
    assert!(sheet.get_cell(pos("A1")).unwrap().is_none());
}

#[test]
fn invalid_position_is_rejected_on_every_entry_point() {
    let bad = Position::NONE;
    let mut sheet = Sheet::new();
    assert_eq!(sheet.set_cell(bad, "1").unwrap_err(), EngineError::InvalidPosition);
    assert_eq!(sheet.get_cell(bad).unwrap_err(), EngineError::InvalidPosition);
    assert_eq!(sheet.get_value(bad).unwrap_err(), EngineError::InvalidPosition);
    assert_eq!(sheet.get_text(bad).unwrap_err(), EngineError::InvalidPosition);
    assert_eq!(sheet.clear_cell(bad).unwrap_err(), EngineError::InvalidPosition);
}
