//! The formula AST: arithmetic with cell references, evaluated against a
//! resolver callback and canonically pretty-printed.

use crate::error::FormulaError;
use crate::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }

    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// A parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Ref(Position),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate against a resolver that maps a referenced position to its
    /// numeric value, or raises the error the caller observed there.
    pub fn evaluate(
        &self,
        resolve: &mut dyn FnMut(Position) -> Result<f64, FormulaError>,
    ) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Ref(p) => resolve(*p),
            Expr::Neg(inner) => Ok(-inner.evaluate(resolve)?),
            Expr::Binary(op, left, right) => {
                let l = left.evaluate(resolve)?;
                let r = right.evaluate(resolve)?;
                let result = match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r == 0.0 {
                            return Err(FormulaError::Arithmetic);
                        }
                        l / r
                    }
                };
                if !result.is_finite() {
                    return Err(FormulaError::Arithmetic);
                }
                Ok(result)
            }
        }
    }

    /// Canonical textual form: no whitespace, minimal parentheses.
    pub fn to_canonical(&self) -> String {
        match self {
            Expr::Number(n) => format_number(*n),
            Expr::Ref(p) => p.to_address(),
            Expr::Neg(inner) => {
                let wrap = matches!(inner.as_ref(), Expr::Binary(BinaryOp::Add, ..) | Expr::Binary(BinaryOp::Sub, ..));
                if wrap {
                    format!("-({})", inner.to_canonical())
                } else {
                    format!("-{}", inner.to_canonical())
                }
            }
            Expr::Binary(op, left, right) => {
                let lp = op.precedence();

                let left_wrap = matches!(left.as_ref(), Expr::Binary(lop, ..) if lop.precedence() < lp);
                let left_str = wrap_if(left.to_canonical(), left_wrap);

                let right_wrap = match right.as_ref() {
                    Expr::Binary(rop, ..) => match op {
                        BinaryOp::Add => false,
                        BinaryOp::Sub => matches!(rop, BinaryOp::Add | BinaryOp::Sub),
                        BinaryOp::Mul => rop.precedence() < lp,
                        BinaryOp::Div => true,
                    },
                    _ => false,
                };
                let right_str = wrap_if(right.to_canonical(), right_wrap);

                format!("{}{}{}", left_str, op.symbol(), right_str)
            }
        }
    }

    /// Collect every cell position referenced syntactically, left-to-right
    /// source order, duplicates included.
    pub fn collect_refs(&self, out: &mut Vec<Position>) {
        match self {
            Expr::Number(_) => {}
            Expr::Ref(p) => out.push(*p),
            Expr::Neg(inner) => inner.collect_refs(out),
            Expr::Binary(_, left, right) => {
                left.collect_refs(out);
                right.collect_refs(out);
            }
        }
    }
}

fn wrap_if(s: String, wrap: bool) -> String {
    if wrap {
        format!("({})", s)
    } else {
        s
    }
}

fn format_number(n: f64) -> String {
    format!("{}", n)
}

/// A parsed formula: its expression tree plus the ordered (with duplicates)
/// list of positions referenced in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
    refs: Vec<Position>,
}

impl Formula {
    pub fn new(expr: Expr) -> Self {
        let mut refs = Vec::new();
        expr.collect_refs(&mut refs);
        Formula { expr, refs }
    }

    pub fn evaluate(
        &self,
        resolve: &mut dyn FnMut(Position) -> Result<f64, FormulaError>,
    ) -> Result<f64, FormulaError> {
        self.expr.evaluate(resolve)
    }

    /// Canonical source form, without the leading `=`.
    pub fn get_expression(&self) -> String {
        self.expr.to_canonical()
    }

    /// Deduplicated, ascending-sorted, valid positions referenced anywhere
    /// in this formula.
    pub fn referenced_cells(&self) -> Vec<Position> {
        let mut valid: Vec<Position> = self.refs.iter().copied().filter(|p| p.is_valid()).collect();
        valid.sort();
        valid.dedup();
        valid
    }

    /// Raw reference list in source order, duplicates included, as opposed
    /// to the deduplicated/sorted view `referenced_cells` exposes.
    pub fn raw_refs(&self) -> &[Position] {
        &self.refs
    }
}
