//! Error taxonomy: value-level [`FormulaError`] vs. API-level [`EngineError`].

use thiserror::Error;

/// A value-time evaluation failure, absorbed into a cell's value.
///
/// Never thrown across the public API: a formula cell whose evaluation
/// fails returns a `FormulaError` from `GetValue`, and any dependent that
/// consumes that value arithmetically sees the same error propagated.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaError {
    /// A syntactically invalid or out-of-range cell reference.
    #[error("#REF!")]
    Ref,
    /// A non-numeric text cell was used arithmetically.
    #[error("#VALUE!")]
    Value,
    /// Division by zero, or any other non-finite arithmetic result.
    #[error("#ARITHM!")]
    Arithmetic,
}

/// An API-level fault: the caller did something the engine cannot honor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("position out of range")]
    InvalidPosition,

    #[error("formula syntax error: {0}")]
    FormulaException(String),

    #[error("circular dependency detected at {0}")]
    CircularDependency(String),
}
