//! Assigns dense placeholder indices to the counted leaves of a tree.
//!
//! The walk is pre-order: a node binding itself takes the next free index,
//! and each sibling subtree starts at the previous sibling's start plus its
//! leaf count, so indices stay collision-free across arbitrarily deep trees
//! without a second traversal pass.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::expr::TensorExpr;
use crate::leaf_count::{count_leaves, node_leaf_count};

/// Dense index of a bound kernel argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceholderId(pub u32);

/// Why a node was bound as a kernel placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafKind {
    /// A plain tensor reference.
    Buffer,
    /// The temporary a `ForcedEval` materializes into.
    Materialized,
    /// The destination buffer of an `EvalTo`.
    Destination,
    /// The result buffer of an opaque reduction/contraction/convolution routine.
    DeviceRoutine,
}

/// One bound kernel argument slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderBinding {
    pub id: PlaceholderId,
    pub kind: LeafKind,
    pub label: String,
}

/// Binds every counted leaf of `root` to a placeholder, in pre-order.
///
/// The returned bindings carry ids `0..count_leaves(root)` in increasing
/// order. An `EvalTo` destination is numbered before the leaves of its
/// operand subtree.
pub fn assign_placeholders(root: &TensorExpr) -> Vec<PlaceholderBinding> {
    let mut bindings = Vec::with_capacity(count_leaves(root));
    bind(root, 0, &mut bindings);
    bindings
}

fn push(bindings: &mut Vec<PlaceholderBinding>, next: u32, kind: LeafKind, label: String) {
    bindings.push(PlaceholderBinding {
        id: PlaceholderId(next),
        kind,
        label,
    });
}

fn bind(expr: &TensorExpr, next: u32, bindings: &mut Vec<PlaceholderBinding>) {
    match expr {
        TensorExpr::Ref(tensor) => {
            push(bindings, next, LeafKind::Buffer, format!("%{}", tensor.id.0));
        }
        TensorExpr::ForcedEval { .. } => {
            push(bindings, next, LeafKind::Materialized, "forced_eval".into());
        }
        TensorExpr::EvalTo { dst, expr } => {
            push(bindings, next, LeafKind::Destination, format!("%{}", dst.0));
            bind(expr, next + 1, bindings);
        }
        TensorExpr::Reduce { .. } => {
            push(bindings, next, LeafKind::DeviceRoutine, "reduce".into());
        }
        TensorExpr::Contract { .. } => {
            push(bindings, next, LeafKind::DeviceRoutine, "contract".into());
        }
        TensorExpr::Convolve { .. } => {
            push(bindings, next, LeafKind::DeviceRoutine, "convolve".into());
        }
        TensorExpr::Pointwise { .. }
        | TensorExpr::Select { .. }
        | TensorExpr::Assign { .. }
        | TensorExpr::Slice { .. }
        | TensorExpr::Chip { .. }
        | TensorExpr::StridedSlice { .. } => {
            let mut offset = next;
            for child in expr.children() {
                bind(child, offset, bindings);
                offset += node_leaf_count(child) as u32;
            }
        }
    }
}

/// Renders the f32 kernel argument declaration list for the bound slots.
///
/// Destination placeholders are the only ones the kernel writes through.
pub fn kernel_params(bindings: &[PlaceholderBinding]) -> String {
    let mut out = String::new();
    for binding in bindings {
        if !out.is_empty() {
            out.push_str(", ");
        }
        let qualifier = match binding.kind {
            LeafKind::Destination => "float*",
            _ => "const float*",
        };
        let _ = write!(out, "{qualifier} ph{}", binding.id.0);
    }
    out
}
