use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// Identifies a device buffer bound to a leaf of the expression tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferId(pub u32);

/// Scalar element types carried by expression nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    I1,
    Si32,
    Si64,
    F16,
    F32,
    F64,
}

/// Logical tensor shape as an ordered list of static extents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self { dims: dims.into() }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
}

/// Tensor metadata coupling dtype and shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorSpec {
    pub dtype: DType,
    pub shape: Shape,
}

impl TensorSpec {
    pub fn new(dtype: DType, shape: Shape) -> Self {
        Self { dtype, shape }
    }
}

/// A bound tensor reference, the plain leaf of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorRef {
    pub id: BufferId,
    pub spec: TensorSpec,
}

/// Pointwise ops covering nullary through ternary arities plus broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointwiseOp {
    Fill,
    Neg,
    Abs,
    Exp,
    Sqrt,
    Broadcast,
    Add,
    Sub,
    Mul,
    Div,
    Maximum,
    Minimum,
    Greater,
    Less,
    Clamp,
}

impl PointwiseOp {
    /// Number of operands the op consumes.
    pub fn arity(self) -> usize {
        match self {
            PointwiseOp::Fill => 0,
            PointwiseOp::Neg
            | PointwiseOp::Abs
            | PointwiseOp::Exp
            | PointwiseOp::Sqrt
            | PointwiseOp::Broadcast => 1,
            PointwiseOp::Add
            | PointwiseOp::Sub
            | PointwiseOp::Mul
            | PointwiseOp::Div
            | PointwiseOp::Maximum
            | PointwiseOp::Minimum
            | PointwiseOp::Greater
            | PointwiseOp::Less => 2,
            PointwiseOp::Clamp => 3,
        }
    }
}

/// Reduction families dispatched to a specialized device routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReduceKind {
    Sum,
    Max,
    Min,
}

/// Attribute payload for `Reduce`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceSpec {
    pub kind: ReduceKind,
    pub axes: Vec<usize>,
}

/// Contracted axis pairs for `Contract`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractionSpec {
    pub contract_lhs: Vec<usize>,
    pub contract_rhs: Vec<usize>,
}

/// Convolved axes for `Convolve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvolutionSpec {
    pub dims: Vec<usize>,
}

/// Attribute payload for `Slice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceSpec {
    pub starts: Vec<usize>,
    pub sizes: Vec<usize>,
}

/// Attribute payload for `Chip` (fixing one dimension at an offset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipSpec {
    pub dim: usize,
    pub offset: usize,
}

/// Attribute payload for `StridedSlice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StridedSliceSpec {
    pub starts: Vec<usize>,
    pub stops: Vec<usize>,
    pub strides: Vec<usize>,
}

/// One node of an immutable tensor computation tree.
///
/// The set of shapes is closed: every shape the expression-building layer can
/// produce is a variant here, and every consumer that dispatches on shape
/// does so through an exhaustive `match`, so extending the taxonomy without
/// updating each counting/binding rule fails to compile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TensorExpr {
    /// A bound tensor reference.
    Ref(TensorRef),
    /// Pointwise op over an ordered operand list, broadcast included.
    Pointwise {
        op: PointwiseOp,
        operands: Vec<TensorExpr>,
    },
    /// Conditional pick between two branches by a predicate.
    Select {
        cond: Box<TensorExpr>,
        if_true: Box<TensorExpr>,
        if_false: Box<TensorExpr>,
    },
    /// Binds a source expression's result into a destination expression.
    Assign {
        dst: Box<TensorExpr>,
        src: Box<TensorExpr>,
    },
    /// Forces materialization of the operand into a temporary before use.
    ForcedEval { expr: Box<TensorExpr> },
    /// Writes the operand's result into a destination buffer as a side effect.
    EvalTo {
        dst: BufferId,
        expr: Box<TensorExpr>,
    },
    /// Algebraic reduction along the given axes.
    Reduce {
        spec: ReduceSpec,
        input: Box<TensorExpr>,
    },
    /// Tensor contraction of two operands.
    Contract {
        spec: ContractionSpec,
        lhs: Box<TensorExpr>,
        rhs: Box<TensorExpr>,
    },
    /// Convolution of an input with a kernel.
    Convolve {
        spec: ConvolutionSpec,
        input: Box<TensorExpr>,
        kernel: Box<TensorExpr>,
    },
    /// View of a sub-block of the operand.
    Slice {
        spec: SliceSpec,
        input: Box<TensorExpr>,
    },
    /// View with one dimension fixed at an offset.
    Chip {
        spec: ChipSpec,
        input: Box<TensorExpr>,
    },
    /// View selected by start/stop/stride triples.
    StridedSlice {
        spec: StridedSliceSpec,
        input: Box<TensorExpr>,
    },
}

impl TensorExpr {
    pub fn buffer(id: BufferId, spec: TensorSpec) -> Self {
        TensorExpr::Ref(TensorRef { id, spec })
    }

    pub fn pointwise(op: PointwiseOp, operands: Vec<TensorExpr>) -> Self {
        TensorExpr::Pointwise { op, operands }
    }

    pub fn select(cond: TensorExpr, if_true: TensorExpr, if_false: TensorExpr) -> Self {
        TensorExpr::Select {
            cond: Box::new(cond),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    pub fn assign(dst: TensorExpr, src: TensorExpr) -> Self {
        TensorExpr::Assign {
            dst: Box::new(dst),
            src: Box::new(src),
        }
    }

    pub fn forced_eval(expr: TensorExpr) -> Self {
        TensorExpr::ForcedEval {
            expr: Box::new(expr),
        }
    }

    pub fn eval_to(dst: BufferId, expr: TensorExpr) -> Self {
        TensorExpr::EvalTo {
            dst,
            expr: Box::new(expr),
        }
    }

    pub fn reduce(spec: ReduceSpec, input: TensorExpr) -> Self {
        TensorExpr::Reduce {
            spec,
            input: Box::new(input),
        }
    }

    pub fn contract(spec: ContractionSpec, lhs: TensorExpr, rhs: TensorExpr) -> Self {
        TensorExpr::Contract {
            spec,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn convolve(spec: ConvolutionSpec, input: TensorExpr, kernel: TensorExpr) -> Self {
        TensorExpr::Convolve {
            spec,
            input: Box::new(input),
            kernel: Box::new(kernel),
        }
    }

    pub fn slice(spec: SliceSpec, input: TensorExpr) -> Self {
        TensorExpr::Slice {
            spec,
            input: Box::new(input),
        }
    }

    pub fn chip(spec: ChipSpec, input: TensorExpr) -> Self {
        TensorExpr::Chip {
            spec,
            input: Box::new(input),
        }
    }

    pub fn strided_slice(spec: StridedSliceSpec, input: TensorExpr) -> Self {
        TensorExpr::StridedSlice {
            spec,
            input: Box::new(input),
        }
    }

    /// Ordered child sub-expressions of this node.
    pub fn children(&self) -> SmallVec<[&TensorExpr; 3]> {
        match self {
            TensorExpr::Ref(_) => smallvec![],
            TensorExpr::Pointwise { operands, .. } => operands.iter().collect(),
            TensorExpr::Select {
                cond,
                if_true,
                if_false,
            } => smallvec![cond.as_ref(), if_true.as_ref(), if_false.as_ref()],
            TensorExpr::Assign { dst, src } => smallvec![dst.as_ref(), src.as_ref()],
            TensorExpr::ForcedEval { expr } | TensorExpr::EvalTo { expr, .. } => {
                smallvec![expr.as_ref()]
            }
            TensorExpr::Reduce { input, .. } => smallvec![input.as_ref()],
            TensorExpr::Contract { lhs, rhs, .. } => smallvec![lhs.as_ref(), rhs.as_ref()],
            TensorExpr::Convolve { input, kernel, .. } => {
                smallvec![input.as_ref(), kernel.as_ref()]
            }
            TensorExpr::Slice { input, .. }
            | TensorExpr::Chip { input, .. }
            | TensorExpr::StridedSlice { input, .. } => smallvec![input.as_ref()],
        }
    }
}

fn fmt_call(
    f: &mut fmt::Formatter<'_>,
    head: impl fmt::Display,
    children: &[&TensorExpr],
) -> fmt::Result {
    write!(f, "{head}(")?;
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

impl fmt::Display for TensorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorExpr::Ref(tensor) => write!(f, "%{}", tensor.id.0),
            TensorExpr::Pointwise { op, .. } => {
                fmt_call(f, format_args!("{op:?}"), &self.children())
            }
            TensorExpr::Select { .. } => fmt_call(f, "Select", &self.children()),
            TensorExpr::Assign { .. } => fmt_call(f, "Assign", &self.children()),
            TensorExpr::ForcedEval { .. } => fmt_call(f, "ForcedEval", &self.children()),
            TensorExpr::EvalTo { dst, expr } => write!(f, "EvalTo(%{}, {expr})", dst.0),
            TensorExpr::Reduce { spec, .. } => {
                fmt_call(f, format_args!("Reduce{:?}", spec.kind), &self.children())
            }
            TensorExpr::Contract { .. } => fmt_call(f, "Contract", &self.children()),
            TensorExpr::Convolve { .. } => fmt_call(f, "Convolve", &self.children()),
            TensorExpr::Slice { .. } => fmt_call(f, "Slice", &self.children()),
            TensorExpr::Chip { .. } => fmt_call(f, "Chip", &self.children()),
            TensorExpr::StridedSlice { .. } => fmt_call(f, "StridedSlice", &self.children()),
        }
    }
}
