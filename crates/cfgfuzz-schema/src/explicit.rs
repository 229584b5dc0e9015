use cfgfuzz_core::{GeneratedValue, SchemaKind, SchemaNode};
use serde_json::{Map, Value};

use crate::engine::SchemaEngine;
use crate::overlay::{apply_constraint, items_path, property_path};

impl SchemaEngine<'_> {
    /// Convert one JSON Schema node. Keywords outside the supported subset
    /// are ignored; boolean schemas and non-object items become `Any`.
    pub(crate) fn convert_json_schema(&self, js: &Value, path: &str, depth: usize) -> SchemaNode {
        if depth > self.max_depth() {
            return SchemaNode::any();
        }
        let Some(js) = js.as_object() else {
            return SchemaNode::any();
        };

        let mut node = SchemaNode::new(type_keyword(js.get("type")));

        if let Some(values) = js.get("enum").and_then(Value::as_array) {
            node.enum_values = values.iter().map(GeneratedValue::from_json).collect();
        }
        node.pattern = js.get("pattern").and_then(Value::as_str).map(str::to_string);
        node.min_length = js.get("minLength").and_then(as_length);
        node.max_length = js.get("maxLength").and_then(as_length);
        node.minimum = js.get("minimum").and_then(Value::as_f64);
        node.maximum = js.get("maximum").and_then(Value::as_f64);
        node.default = js.get("default").map(GeneratedValue::from_json);
        node.description = js
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match node.kind {
            SchemaKind::Object => self.convert_properties(js, path, depth, &mut node),
            SchemaKind::Array => {
                node.items = Some(Box::new(self.convert_items(js.get("items"), path, depth)));
            }
            _ => {}
        }

        node
    }

    /// Item schema of the array at `path`, with the `path[]` overlay applied.
    /// An ignored item schema without a default is kept as declared, since
    /// arrays cannot drop their items.
    fn convert_items(&self, items: Option<&Value>, path: &str, depth: usize) -> SchemaNode {
        let items_path = items_path(path);
        let declared = items.filter(|items| items.is_object());

        if self.config.is_ignored(&items_path) {
            if let Some(default) = declared.and_then(|items| items.get("default")) {
                return SchemaNode::frozen(GeneratedValue::from_json(default));
            }
        }

        let mut node = match declared {
            Some(items) => self.convert_json_schema(items, &items_path, depth + 1),
            None => SchemaNode::any(),
        };
        if let Some(constraint) = self.config.constraint(&items_path) {
            apply_constraint(&mut node, constraint);
        }
        node
    }

    fn convert_properties(
        &self,
        js: &Map<String, Value>,
        path: &str,
        depth: usize,
        node: &mut SchemaNode,
    ) {
        if let Some(properties) = js.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                let property_path = property_path(path, name);

                if self.config.is_ignored(&property_path) {
                    // Ignored properties keep their declared default, or
                    // disappear when there is none.
                    if let Some(default) = property.get("default") {
                        node.properties.insert(
                            name.clone(),
                            SchemaNode::frozen(GeneratedValue::from_json(default)),
                        );
                    }
                    continue;
                }

                let mut child = self.convert_json_schema(property, &property_path, depth + 1);
                if let Some(constraint) = self.config.constraint(&property_path) {
                    apply_constraint(&mut child, constraint);
                    if constraint.required {
                        node.required.insert(name.clone());
                    }
                }
                node.properties.insert(name.clone(), child);
            }
        }

        if let Some(required) = js.get("required").and_then(Value::as_array) {
            node.required
                .extend(required.iter().filter_map(Value::as_str).map(str::to_string));
        }
    }
}

/// Map the `type` keyword. A list of types picks its first non-null entry.
fn type_keyword(keyword: Option<&Value>) -> SchemaKind {
    match keyword {
        Some(Value::String(name)) => SchemaKind::from_keyword(name).unwrap_or_default(),
        Some(Value::Array(names)) => {
            let names = names.iter().filter_map(Value::as_str).collect::<Vec<_>>();
            match names.iter().find(|name| **name != "null") {
                Some(name) => SchemaKind::from_keyword(name).unwrap_or_default(),
                None if !names.is_empty() => SchemaKind::Null,
                None => SchemaKind::Any,
            }
        }
        _ => SchemaKind::Any,
    }
}

fn as_length(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|length| usize::try_from(length).ok())
}
