//! Counts the placeholder-bearing leaves of an expression tree.
//!
//! The rule is not "count every terminal reference" but "count every node the
//! kernel generator must expose as a separately bound placeholder". Nodes
//! whose operands are consumed by an opaque device routine (forced-eval
//! temporaries, reductions, contractions, convolutions) collapse to one leaf
//! because a single buffer is bound for the whole subcomputation, and
//! pass-through view ops contribute nothing of their own.

use crate::expr::TensorExpr;

/// Sums [`node_leaf_count`] over an ordered child sequence, left to right.
///
/// Returns 0 for an empty sequence. The sum is order-independent; the fold
/// order only fixes how the recursion composes.
pub fn children_leaf_count<'a>(children: impl IntoIterator<Item = &'a TensorExpr>) -> usize {
    children
        .into_iter()
        .fold(0, |acc, child| acc + node_leaf_count(child))
}

/// Leaf count contributed by `expr` and its subtree, dispatched on shape.
///
/// Total over the closed shape set: a taxonomy variant without an arm here is
/// rejected at compile time.
pub fn node_leaf_count(expr: &TensorExpr) -> usize {
    match expr {
        TensorExpr::Ref(_) => 1,
        TensorExpr::Pointwise { operands, .. } => children_leaf_count(operands),
        TensorExpr::Select {
            cond,
            if_true,
            if_false,
        } => children_leaf_count([cond.as_ref(), if_true.as_ref(), if_false.as_ref()]),
        TensorExpr::Assign { dst, src } => children_leaf_count([dst.as_ref(), src.as_ref()]),
        // The materialized temporary is an opaque bound buffer; the operand's
        // internal structure never surfaces as placeholders.
        TensorExpr::ForcedEval { .. } => 1,
        // EvalTo is both a bound destination and a transparent wrapper around
        // further leaves; the two contributions are summed.
        TensorExpr::EvalTo { expr, .. } => 1 + children_leaf_count([expr.as_ref()]),
        TensorExpr::Reduce { .. } | TensorExpr::Contract { .. } | TensorExpr::Convolve { .. } => 1,
        TensorExpr::Slice { input, .. }
        | TensorExpr::Chip { input, .. }
        | TensorExpr::StridedSlice { input, .. } => children_leaf_count([input.as_ref()]),
    }
}

/// Number of placeholder slots the subtree rooted at `root` consumes.
///
/// A pre-order placeholder numbering uses this to skip past already-numbered
/// subtrees without a second traversal pass per node.
///
/// # Example
/// ```
/// use texpr::count_leaves;
/// use texpr::expr::{BufferId, DType, PointwiseOp, Shape, TensorExpr, TensorSpec};
///
/// let spec = TensorSpec::new(DType::F32, Shape::new(vec![8]));
/// let a = TensorExpr::buffer(BufferId(0), spec.clone());
/// let b = TensorExpr::buffer(BufferId(1), spec);
/// let sum = TensorExpr::pointwise(PointwiseOp::Add, vec![a, b]);
/// assert_eq!(count_leaves(&sum), 2);
/// ```
pub fn count_leaves(root: &TensorExpr) -> usize {
    node_leaf_count(root)
}
