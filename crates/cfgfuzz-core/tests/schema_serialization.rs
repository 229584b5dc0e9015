use cfgfuzz_core::{GeneratedValue, SchemaKind, SchemaNode};

#[test]
fn serializes_schema_node_deterministically() {
    let node = SchemaNode::new(SchemaKind::Object)
        .with_property(
            "replicaCount",
            SchemaNode::new(SchemaKind::Integer).with_range(Some(0.0), Some(10.0)),
        )
        .with_property(
            "image",
            SchemaNode::new(SchemaKind::String)
                .with_enum(vec![GeneratedValue::from("nginx"), GeneratedValue::from("redis")]),
        )
        .with_required("replicaCount");

    let json = serde_json::to_string_pretty(&node).expect("serialize schema node");
    let expected = r#"{
  "kind": "object",
  "properties": {
    "image": {
      "kind": "string",
      "enum": [
        "nginx",
        "redis"
      ]
    },
    "replicaCount": {
      "kind": "integer",
      "minimum": 0.0,
      "maximum": 10.0
    }
  },
  "required": [
    "replicaCount"
  ]
}"#;
    assert_eq!(json, expected);
}

#[test]
fn deserializes_camel_case_constraints() {
    let json = r#"{"kind":"string","minLength":2,"maxLength":4,"pattern":"^[a-z]+$"}"#;
    let node: SchemaNode = serde_json::from_str(json).expect("parse schema node");
    assert_eq!(node.kind, SchemaKind::String);
    assert_eq!(node.min_length, Some(2));
    assert_eq!(node.max_length, Some(4));
    assert_eq!(node.pattern.as_deref(), Some("^[a-z]+$"));
}
