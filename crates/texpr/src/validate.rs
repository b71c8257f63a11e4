use thiserror::Error;

use crate::expr::{PointwiseOp, TensorExpr};

/// Errors surfaced while checking expression-tree well-formedness.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("pointwise op {op:?} expects {expected} operands, found {found}")]
    PointwiseArity {
        op: PointwiseOp,
        expected: usize,
        found: usize,
    },
}

/// Walks the tree once and rejects structurally malformed nodes.
///
/// Shape dispatch itself is total, so the only checkable failure is an
/// operand list that disagrees with its op's arity.
pub fn validate(expr: &TensorExpr) -> Result<(), ExprError> {
    if let TensorExpr::Pointwise { op, operands } = expr {
        if operands.len() != op.arity() {
            return Err(ExprError::PointwiseArity {
                op: *op,
                expected: op.arity(),
                found: operands.len(),
            });
        }
    }
    for child in expr.children() {
        validate(child)?;
    }
    Ok(())
}
