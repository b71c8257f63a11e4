//! Structural analysis of tensor expression trees for device-kernel generation.
//!
//! The central metric is the *leaf count*: the number of nodes in an
//! expression tree that a generated kernel must expose as individually bound
//! buffer placeholders. [`count_leaves`] derives it, and
//! [`placeholder::assign_placeholders`] consumes it to number placeholder
//! slots in a single pre-order pass.

pub mod expr;
pub mod leaf_count;
pub mod placeholder;
pub mod validate;

pub use expr::TensorExpr;
pub use leaf_count::count_leaves;
