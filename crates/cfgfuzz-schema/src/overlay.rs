use cfgfuzz_config::PathConstraint;
use cfgfuzz_core::{GeneratedValue, SchemaKind, SchemaNode};

/// Dotted path of a property below `parent`.
pub(crate) fn property_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Path of the items of the array at `parent`.
pub(crate) fn items_path(parent: &str) -> String {
    format!("{parent}[]")
}

/// Build a node straight from an override, keeping the example value as the
/// default. The kind falls back to the example's kind when the override has
/// no usable `type`.
pub(crate) fn node_from_constraint(
    constraint: &PathConstraint,
    example: &GeneratedValue,
) -> SchemaNode {
    let kind = constraint.schema_kind().unwrap_or_else(|| example.kind());
    let mut node = SchemaNode::new(kind);
    node.default = Some(example.clone());
    apply_constraint(&mut node, constraint);
    node
}

/// Overwrite the fields of `node` that the override sets.
pub(crate) fn apply_constraint(node: &mut SchemaNode, constraint: &PathConstraint) {
    if let Some(kind) = constraint.schema_kind() {
        node.kind = kind;
    }
    if let Some(min) = constraint.min {
        node.minimum = Some(min);
        if node.kind == SchemaKind::String {
            node.min_length = Some(length_bound(min.ceil()));
        }
    }
    if let Some(max) = constraint.max {
        node.maximum = Some(max);
        if node.kind == SchemaKind::String {
            node.max_length = Some(length_bound(max.floor()));
        }
    }
    if let Some(pattern) = &constraint.pattern {
        node.pattern = Some(pattern.clone());
    }
    if !constraint.enum_values.is_empty() {
        node.enum_values = constraint.enum_values.clone();
    }
}

fn length_bound(value: f64) -> usize {
    if value.is_finite() && value > 0.0 {
        value as usize
    } else {
        0
    }
}
