use texpr::count_leaves;
use texpr::expr::{
    BufferId, ContractionSpec, DType, PointwiseOp, ReduceKind, ReduceSpec, Shape, SliceSpec,
    TensorExpr, TensorSpec,
};
use texpr::placeholder::{assign_placeholders, kernel_params, LeafKind, PlaceholderId};

fn leaf(id: u32) -> TensorExpr {
    TensorExpr::buffer(BufferId(id), TensorSpec::new(DType::F32, Shape::new(vec![8])))
}

fn add(lhs: TensorExpr, rhs: TensorExpr) -> TensorExpr {
    TensorExpr::pointwise(PointwiseOp::Add, vec![lhs, rhs])
}

fn assert_dense_preorder(root: &TensorExpr) {
    let bindings = assign_placeholders(root);
    assert_eq!(
        bindings.len(),
        count_leaves(root),
        "binding count must match the leaf count for {root}"
    );
    for (index, binding) in bindings.iter().enumerate() {
        assert_eq!(
            binding.id,
            PlaceholderId(index as u32),
            "ids must be dense and pre-ordered for {root}"
        );
    }
}

#[test]
fn single_leaf_binds_slot_zero() {
    let root = leaf(3);
    let bindings = assign_placeholders(&root);
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].id, PlaceholderId(0));
    assert_eq!(bindings[0].kind, LeafKind::Buffer);
    assert_eq!(bindings[0].label, "%3");
}

#[test]
fn sibling_subtrees_get_disjoint_ranges() {
    // Left subtree consumes slots 0..2, right subtree continues at 2.
    let root = add(add(leaf(0), leaf(1)), add(leaf(2), leaf(3)));
    assert_dense_preorder(&root);

    let bindings = assign_placeholders(&root);
    let labels: Vec<&str> = bindings.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, ["%0", "%1", "%2", "%3"]);
}

#[test]
fn eval_to_binds_destination_before_operand_leaves() {
    let root = TensorExpr::eval_to(BufferId(9), add(leaf(0), leaf(1)));
    assert_dense_preorder(&root);

    let bindings = assign_placeholders(&root);
    assert_eq!(bindings[0].kind, LeafKind::Destination);
    assert_eq!(bindings[0].label, "%9");
    assert_eq!(bindings[1].kind, LeafKind::Buffer);
    assert_eq!(bindings[2].kind, LeafKind::Buffer);
}

#[test]
fn opaque_nodes_bind_one_slot_and_hide_their_operands() {
    let contraction = TensorExpr::contract(
        ContractionSpec {
            contract_lhs: vec![1],
            contract_rhs: vec![0],
        },
        add(leaf(0), leaf(1)),
        leaf(2),
    );
    let reduction = TensorExpr::reduce(
        ReduceSpec {
            kind: ReduceKind::Max,
            axes: vec![0],
        },
        add(leaf(3), leaf(4)),
    );
    let root = add(contraction, reduction);
    assert_dense_preorder(&root);

    let bindings = assign_placeholders(&root);
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].kind, LeafKind::DeviceRoutine);
    assert_eq!(bindings[0].label, "contract");
    assert_eq!(bindings[1].kind, LeafKind::DeviceRoutine);
    assert_eq!(bindings[1].label, "reduce");
}

#[test]
fn forced_eval_binds_a_materialized_temporary() {
    let root = add(TensorExpr::forced_eval(add(leaf(0), leaf(1))), leaf(2));
    assert_dense_preorder(&root);

    let bindings = assign_placeholders(&root);
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].kind, LeafKind::Materialized);
    assert_eq!(bindings[1].label, "%2");
}

#[test]
fn pass_through_views_do_not_consume_slots() {
    let root = TensorExpr::slice(
        SliceSpec {
            starts: vec![0],
            sizes: vec![4],
        },
        add(leaf(0), leaf(1)),
    );
    assert_dense_preorder(&root);
    assert_eq!(assign_placeholders(&root).len(), 2);
}

#[test]
fn deep_mixed_tree_stays_dense() {
    let root = TensorExpr::eval_to(
        BufferId(7),
        TensorExpr::select(
            TensorExpr::pointwise(PointwiseOp::Greater, vec![leaf(0), leaf(1)]),
            TensorExpr::forced_eval(add(leaf(2), leaf(3))),
            add(leaf(4), leaf(5)),
        ),
    );
    assert_dense_preorder(&root);

    let bindings = assign_placeholders(&root);
    let kinds: Vec<LeafKind> = bindings.iter().map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        [
            LeafKind::Destination,
            LeafKind::Buffer,
            LeafKind::Buffer,
            LeafKind::Materialized,
            LeafKind::Buffer,
            LeafKind::Buffer,
        ]
    );
}

#[test]
fn kernel_params_marks_destinations_writable() {
    let root = TensorExpr::eval_to(BufferId(9), add(leaf(0), leaf(1)));
    let rendered = kernel_params(&assign_placeholders(&root));
    assert_eq!(rendered, "float* ph0, const float* ph1, const float* ph2");
}
