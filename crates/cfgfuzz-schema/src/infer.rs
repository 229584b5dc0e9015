use cfgfuzz_core::{GeneratedValue, SchemaKind, SchemaNode};

use crate::engine::SchemaEngine;
use crate::overlay::{items_path, node_from_constraint, property_path};

impl SchemaEngine<'_> {
    pub(crate) fn infer_schema(&self, value: &GeneratedValue, path: &str, depth: usize) -> SchemaNode {
        if depth > self.max_depth() {
            return SchemaNode::any();
        }

        if !path.is_empty() {
            if self.config.is_ignored(path) {
                return SchemaNode::frozen(value.clone());
            }
            if let Some(constraint) = self.config.constraint(path) {
                return node_from_constraint(constraint, value);
            }
        }

        match value {
            GeneratedValue::Map(map) => {
                let mut node = SchemaNode::new(SchemaKind::Object);
                for (key, child) in map {
                    let child_path = property_path(path, key);
                    // Inferred keys stay optional so generation can omit them;
                    // only an explicit `required` override changes that.
                    if self.is_required_by_overlay(&child_path) {
                        node.required.insert(key.clone());
                    }
                    node.properties
                        .insert(key.clone(), self.infer_schema(child, &child_path, depth + 1));
                }
                node
            }
            GeneratedValue::List(items) => {
                // Only the first element is inspected; an empty list assumes
                // string items.
                let items = match items.first() {
                    Some(first) => self.infer_schema(first, &items_path(path), depth + 1),
                    None => SchemaNode::new(SchemaKind::String),
                };
                SchemaNode::new(SchemaKind::Array).with_items(items)
            }
            primitive => SchemaNode::new(primitive.kind()).with_default(primitive.clone()),
        }
    }

    pub(crate) fn is_required_by_overlay(&self, path: &str) -> bool {
        !self.config.is_ignored(path)
            && self
                .config
                .constraint(path)
                .is_some_and(|constraint| constraint.required)
    }
}
