use std::collections::BTreeMap;

use cfgfuzz_core::{GeneratedValue, SchemaKind, SchemaNode};
use tracing::debug;

use crate::draw::Draw;

const DEFAULT_STRING_MIN: usize = 0;
const DEFAULT_STRING_MAX: usize = 100;
const DEFAULT_INT_MIN: i64 = -1000;
const DEFAULT_INT_MAX: i64 = 1000;
const DEFAULT_FLOAT_MIN: f64 = -1000.0;
const DEFAULT_FLOAT_MAX: f64 = 1000.0;
const ARRAY_MAX_LEN: i64 = 10;
/// Upper bound applied to a declared `maxLength` so one node cannot allocate
/// an unbounded string. A larger `minLength` still wins.
const STRING_LENGTH_CAP: usize = 4096;

/// Produces random values shaped by a schema tree.
#[derive(Debug, Clone, Copy)]
pub struct ValueGenerator {
    max_depth: usize,
}

impl ValueGenerator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Generate one value for `schema`. Unsatisfiable constraints degrade to
    /// the nearest valid value; this never fails.
    pub fn generate<D: Draw + ?Sized>(&self, schema: &SchemaNode, draw: &mut D) -> GeneratedValue {
        self.generate_at(schema, draw, 0)
    }

    fn generate_at<D: Draw + ?Sized>(
        &self,
        node: &SchemaNode,
        draw: &mut D,
        depth: usize,
    ) -> GeneratedValue {
        if depth >= self.max_depth {
            return node
                .default
                .clone()
                .unwrap_or_else(|| node.kind.zero_value());
        }

        if let Some(default) = &node.default {
            if draw.draw_bool() {
                return default.clone();
            }
        }

        if !node.enum_values.is_empty() {
            let index = draw.draw_index(node.enum_values.len());
            return node.enum_values[index].clone();
        }

        match node.kind {
            SchemaKind::String => GeneratedValue::String(generate_string(node, draw)),
            SchemaKind::Integer => GeneratedValue::Integer(generate_integer(node, draw)),
            SchemaKind::Number => GeneratedValue::Float(generate_number(node, draw)),
            SchemaKind::Boolean => GeneratedValue::Bool(draw.draw_bool()),
            SchemaKind::Null => GeneratedValue::Null,
            SchemaKind::Any => generate_any(draw),
            SchemaKind::Object => self.generate_object(node, draw, depth),
            SchemaKind::Array => self.generate_array(node, draw, depth),
        }
    }

    fn generate_object<D: Draw + ?Sized>(
        &self,
        node: &SchemaNode,
        draw: &mut D,
        depth: usize,
    ) -> GeneratedValue {
        let mut map = BTreeMap::new();
        for (name, property) in &node.properties {
            // Omitted optional keys are absent, never null.
            if !node.is_required(name) && draw.draw_bool() {
                continue;
            }
            map.insert(name.clone(), self.generate_at(property, draw, depth + 1));
        }
        GeneratedValue::Map(map)
    }

    fn generate_array<D: Draw + ?Sized>(
        &self,
        node: &SchemaNode,
        draw: &mut D,
        depth: usize,
    ) -> GeneratedValue {
        let len = usize::try_from(draw.draw_int(0, ARRAY_MAX_LEN)).unwrap_or(0);
        let items = (0..len)
            .map(|_| match node.items.as_deref() {
                Some(items) => self.generate_at(items, draw, depth + 1),
                None => GeneratedValue::String(String::new()),
            })
            .collect();
        GeneratedValue::List(items)
    }
}

fn generate_string<D: Draw + ?Sized>(node: &SchemaNode, draw: &mut D) -> String {
    if let Some(pattern) = node.pattern.as_deref() {
        match draw.draw_matching(pattern) {
            Ok(value) if !value.is_empty() => return value,
            Ok(_) => {}
            Err(err) => debug!(event = "pattern_fallback", pattern, error = %err),
        }
    }

    let max_len = node.max_length.unwrap_or(DEFAULT_STRING_MAX);
    let mut min_len = node.min_length.unwrap_or(DEFAULT_STRING_MIN);
    if min_len > max_len {
        min_len = max_len;
    }
    let max_len = max_len.min(min_len.max(STRING_LENGTH_CAP));

    let len = draw.draw_int(to_i64(min_len), to_i64(max_len));
    draw.draw_string(usize::try_from(len).unwrap_or(min_len))
}

fn generate_integer<D: Draw + ?Sized>(node: &SchemaNode, draw: &mut D) -> i64 {
    let mut min = finite(node.minimum)
        .map(|min| min.ceil() as i64)
        .unwrap_or(DEFAULT_INT_MIN);
    let max = finite(node.maximum)
        .map(|max| max.floor() as i64)
        .unwrap_or(DEFAULT_INT_MAX);
    if min > max {
        min = max;
    }
    draw.draw_int(min, max)
}

fn generate_number<D: Draw + ?Sized>(node: &SchemaNode, draw: &mut D) -> f64 {
    let mut min = finite(node.minimum).unwrap_or(DEFAULT_FLOAT_MIN);
    let max = finite(node.maximum).unwrap_or(DEFAULT_FLOAT_MAX);
    if min > max {
        min = max;
    }
    draw.draw_float(min, max)
}

fn generate_any<D: Draw + ?Sized>(draw: &mut D) -> GeneratedValue {
    match draw.draw_index(5) {
        0 => {
            let len = draw.draw_int(to_i64(DEFAULT_STRING_MIN), to_i64(DEFAULT_STRING_MAX));
            GeneratedValue::String(draw.draw_string(usize::try_from(len).unwrap_or(0)))
        }
        1 => GeneratedValue::Integer(draw.draw_int(DEFAULT_INT_MIN, DEFAULT_INT_MAX)),
        2 => GeneratedValue::Bool(draw.draw_bool()),
        3 => GeneratedValue::Float(draw.draw_float(DEFAULT_FLOAT_MIN, DEFAULT_FLOAT_MAX)),
        _ => GeneratedValue::Null,
    }
}

fn finite(bound: Option<f64>) -> Option<f64> {
    bound.filter(|value| value.is_finite())
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DrawError;

    /// Replays a fixed script of decisions.
    struct Scripted {
        bools: Vec<bool>,
        ints: Vec<i64>,
    }

    impl Draw for Scripted {
        fn draw_bool(&mut self) -> bool {
            if self.bools.is_empty() { false } else { self.bools.remove(0) }
        }

        fn draw_int(&mut self, min: i64, max: i64) -> i64 {
            let value = if self.ints.is_empty() { min } else { self.ints.remove(0) };
            value.clamp(min, max.max(min))
        }

        fn draw_float(&mut self, min: f64, _max: f64) -> f64 {
            min
        }

        fn draw_string(&mut self, len: usize) -> String {
            "s".repeat(len)
        }

        fn draw_matching(&mut self, pattern: &str) -> Result<String, DrawError> {
            Err(DrawError::Pattern {
                pattern: pattern.to_string(),
                reason: "scripted".to_string(),
            })
        }
    }

    fn scripted(bools: &[bool], ints: &[i64]) -> Scripted {
        Scripted {
            bools: bools.to_vec(),
            ints: ints.to_vec(),
        }
    }

    #[test]
    fn depth_limit_returns_default_or_zero_value() {
        let generator = ValueGenerator::new(0);
        let mut draw = scripted(&[], &[]);

        let object = SchemaNode::new(SchemaKind::Object)
            .with_property("a", SchemaNode::new(SchemaKind::String));
        assert_eq!(generator.generate(&object, &mut draw), GeneratedValue::empty_map());
        assert_eq!(
            generator.generate(&SchemaNode::new(SchemaKind::Array), &mut draw),
            GeneratedValue::List(Vec::new())
        );
        let with_default =
            SchemaNode::new(SchemaKind::Integer).with_default(GeneratedValue::Integer(3));
        assert_eq!(
            generator.generate(&with_default, &mut draw),
            GeneratedValue::Integer(3)
        );
        assert_eq!(
            generator.generate(&SchemaNode::any(), &mut draw),
            GeneratedValue::Null
        );
    }

    #[test]
    fn default_is_used_on_a_true_draw() {
        let generator = ValueGenerator::new(5);
        let node = SchemaNode::new(SchemaKind::Integer)
            .with_range(Some(10.0), Some(20.0))
            .with_default(GeneratedValue::Integer(99));

        let mut draw = scripted(&[true], &[]);
        assert_eq!(generator.generate(&node, &mut draw), GeneratedValue::Integer(99));

        let mut draw = scripted(&[false], &[15]);
        assert_eq!(generator.generate(&node, &mut draw), GeneratedValue::Integer(15));
    }

    #[test]
    fn failed_pattern_falls_back_to_length_bounds() {
        let generator = ValueGenerator::new(5);
        let node = SchemaNode::new(SchemaKind::String)
            .with_pattern("(")
            .with_length(Some(4), Some(6));
        let mut draw = scripted(&[], &[5]);
        assert_eq!(
            generator.generate(&node, &mut draw),
            GeneratedValue::from("sssss")
        );
    }

    #[test]
    fn inverted_bounds_collapse_to_max() {
        let generator = ValueGenerator::new(5);
        let mut draw = scripted(&[], &[]);

        let string = SchemaNode::new(SchemaKind::String).with_length(Some(8), Some(2));
        assert_eq!(generator.generate(&string, &mut draw), GeneratedValue::from("ss"));

        let integer = SchemaNode::new(SchemaKind::Integer).with_range(Some(9.0), Some(3.0));
        assert_eq!(generator.generate(&integer, &mut draw), GeneratedValue::Integer(3));

        let number = SchemaNode::new(SchemaKind::Number).with_range(Some(9.5), Some(3.5));
        assert_eq!(generator.generate(&number, &mut draw), GeneratedValue::Float(3.5));
    }

    #[test]
    fn integer_bounds_round_inward_and_ignore_non_finite() {
        let generator = ValueGenerator::new(5);
        let mut draw = scripted(&[], &[]);

        let node = SchemaNode::new(SchemaKind::Integer).with_range(Some(0.5), Some(9.5));
        assert_eq!(generator.generate(&node, &mut draw), GeneratedValue::Integer(1));

        let node = SchemaNode::new(SchemaKind::Integer).with_range(Some(f64::NAN), None);
        assert_eq!(
            generator.generate(&node, &mut draw),
            GeneratedValue::Integer(DEFAULT_INT_MIN)
        );
    }

    #[test]
    fn optional_properties_are_omitted_not_nulled() {
        let generator = ValueGenerator::new(5);
        let node = SchemaNode::new(SchemaKind::Object)
            .with_property("a", SchemaNode::new(SchemaKind::Boolean))
            .with_property("b", SchemaNode::new(SchemaKind::Boolean))
            .with_required("b");

        // a: omit draw true. b: required, value draw true.
        let mut draw = scripted(&[true, true], &[]);
        let value = generator.generate(&node, &mut draw);
        let map = value.as_map().expect("map");
        assert!(!map.contains_key("a"));
        assert_eq!(map.get("b"), Some(&GeneratedValue::Bool(true)));
    }

    #[test]
    fn arrays_without_items_hold_empty_strings() {
        let generator = ValueGenerator::new(5);
        let node = SchemaNode::new(SchemaKind::Array);
        let mut draw = scripted(&[], &[3]);
        assert_eq!(
            generator.generate(&node, &mut draw),
            GeneratedValue::List(vec![GeneratedValue::from(""); 3])
        );
    }
}
