use cfgfuzz_core::{GeneratedValue, SchemaKind, SchemaNode};

pub const DEFAULT_MAX_ATTEMPTS: usize = 200;

/// Result of shrinking a crashing input.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimized {
    pub value: GeneratedValue,
    /// Candidates tried.
    pub attempts: usize,
    /// Candidates that kept the crash and were adopted.
    pub accepted: usize,
}

/// Greedy shrinker: repeatedly adopts the first simpler candidate that still
/// reproduces the crash, until no candidate does or the budget runs out.
///
/// Candidates stay inside the schema: required keys are kept, enum nodes
/// only move to their first member and scalars shrink towards the nearest
/// value their bounds allow.
#[derive(Debug, Clone, Copy)]
pub struct Minimizer {
    max_attempts: usize,
}

impl Default for Minimizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl Minimizer {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    pub fn minimize<F>(
        &self,
        schema: &SchemaNode,
        value: GeneratedValue,
        mut still_fails: F,
    ) -> Minimized
    where
        F: FnMut(&GeneratedValue) -> bool,
    {
        let mut current = value;
        let mut attempts = 0;
        let mut accepted = 0;

        'outer: while attempts < self.max_attempts {
            // Never plan more edits than the budget can try.
            let edits = plan_edits(schema, &current, self.max_attempts - attempts);
            for edit in &edits {
                let Some(candidate) = edit.apply(&current) else {
                    continue;
                };
                attempts += 1;
                if still_fails(&candidate) {
                    current = candidate;
                    accepted += 1;
                    continue 'outer;
                }
                if attempts >= self.max_attempts {
                    break 'outer;
                }
            }
            break;
        }

        Minimized {
            value: current,
            attempts,
            accepted,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Change {
    RemoveKey(String),
    RemoveIndex(usize),
    Replace(GeneratedValue),
}

/// One simplification, addressed by its path from the root.
#[derive(Debug, Clone, PartialEq)]
struct Edit {
    path: Vec<Step>,
    change: Change,
}

impl Edit {
    fn apply(&self, value: &GeneratedValue) -> Option<GeneratedValue> {
        let mut candidate = value.clone();
        let mut node = &mut candidate;
        for step in &self.path {
            node = match (step, node) {
                (Step::Key(key), GeneratedValue::Map(map)) => map.get_mut(key)?,
                (Step::Index(index), GeneratedValue::List(items)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        match (&self.change, node) {
            (Change::RemoveKey(key), GeneratedValue::Map(map)) => {
                map.remove(key)?;
            }
            (Change::RemoveIndex(index), GeneratedValue::List(items)) if *index < items.len() => {
                items.remove(*index);
            }
            (Change::Replace(replacement), node) => *node = replacement.clone(),
            _ => return None,
        }
        Some(candidate)
    }
}

/// Up to `limit` one-step edits of `value`, structural removals of a node
/// before edits inside its children.
fn plan_edits(schema: &SchemaNode, value: &GeneratedValue, limit: usize) -> Vec<Edit> {
    let mut edits = Vec::new();
    collect_edits(Some(schema), value, &mut Vec::new(), &mut edits, limit);
    edits
}

fn collect_edits(
    schema: Option<&SchemaNode>,
    value: &GeneratedValue,
    path: &mut Vec<Step>,
    edits: &mut Vec<Edit>,
    limit: usize,
) {
    if edits.len() >= limit {
        return;
    }

    if let Some(first) = schema.and_then(|schema| schema.enum_values.first()) {
        if first != value {
            edits.push(Edit {
                path: path.clone(),
                change: Change::Replace(first.clone()),
            });
        }
        return;
    }

    match value {
        GeneratedValue::Map(map) => {
            for key in map.keys() {
                if schema.is_some_and(|schema| schema.is_required(key)) {
                    continue;
                }
                if edits.len() >= limit {
                    return;
                }
                edits.push(Edit {
                    path: path.clone(),
                    change: Change::RemoveKey(key.clone()),
                });
            }
            for (key, child) in map {
                path.push(Step::Key(key.clone()));
                let child_schema = schema.and_then(|schema| schema.properties.get(key));
                collect_edits(child_schema, child, path, edits, limit);
                path.pop();
            }
        }
        GeneratedValue::List(items) => {
            for index in 0..items.len() {
                if edits.len() >= limit {
                    return;
                }
                edits.push(Edit {
                    path: path.clone(),
                    change: Change::RemoveIndex(index),
                });
            }
            let item_schema = schema.and_then(|schema| schema.items.as_deref());
            for (index, child) in items.iter().enumerate() {
                path.push(Step::Index(index));
                collect_edits(item_schema, child, path, edits, limit);
                path.pop();
            }
        }
        scalar => {
            if let Some(simpler) = simplest_scalar(schema, scalar).filter(|simpler| simpler != scalar)
            {
                edits.push(Edit {
                    path: path.clone(),
                    change: Change::Replace(simpler),
                });
            }
        }
    }
}

/// Simplest value the node admits. Pattern-constrained strings are left
/// alone; unknown nodes fall back to the zero value of the current kind.
fn simplest_scalar(schema: Option<&SchemaNode>, value: &GeneratedValue) -> Option<GeneratedValue> {
    let Some(schema) = schema.filter(|schema| schema.kind != SchemaKind::Any) else {
        return Some(value.kind().zero_value());
    };

    match schema.kind {
        SchemaKind::String if schema.pattern.is_none() => {
            let min = schema.min_length.unwrap_or(0);
            let len = schema.max_length.map_or(min, |max| min.min(max));
            Some(GeneratedValue::String("a".repeat(len)))
        }
        SchemaKind::Integer => {
            let bounded = nearest_to_zero(schema.minimum.map(f64::ceil), schema.maximum.map(f64::floor));
            Some(GeneratedValue::Integer(bounded as i64))
        }
        SchemaKind::Number => Some(GeneratedValue::Float(nearest_to_zero(
            schema.minimum,
            schema.maximum,
        ))),
        SchemaKind::Boolean => Some(GeneratedValue::Bool(false)),
        _ => None,
    }
}

fn nearest_to_zero(min: Option<f64>, max: Option<f64>) -> f64 {
    let mut value: f64 = 0.0;
    if let Some(min) = min.filter(|min| min.is_finite()) {
        value = value.max(min);
    }
    if let Some(max) = max.filter(|max| max.is_finite()) {
        value = value.min(max);
    }
    value
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn map(entries: Vec<(&str, GeneratedValue)>) -> GeneratedValue {
        GeneratedValue::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn loose() -> SchemaNode {
        SchemaNode::any()
    }

    #[test]
    fn shrinks_to_the_triggering_key() {
        let value = map(vec![
            ("name", GeneratedValue::from("web server")),
            ("port", GeneratedValue::Integer(-7)),
            ("tags", GeneratedValue::List(vec![GeneratedValue::from("a"); 4])),
        ]);
        let fails = |candidate: &GeneratedValue| {
            candidate
                .as_map()
                .and_then(|map| map.get("port"))
                .and_then(GeneratedValue::as_i64)
                .is_some_and(|port| port < 0)
        };

        let minimized = Minimizer::default().minimize(&loose(), value, fails);
        assert_eq!(minimized.value, map(vec![("port", GeneratedValue::Integer(-7))]));
        assert!(minimized.accepted >= 2);
    }

    #[test]
    fn respects_the_attempt_budget() {
        let value = GeneratedValue::List(vec![GeneratedValue::Integer(1); 10]);
        let minimized = Minimizer::new(3).minimize(&loose(), value.clone(), |_| false);
        assert_eq!(minimized.attempts, 3);
        assert_eq!(minimized.accepted, 0);
        assert_eq!(minimized.value, value);
    }

    #[test]
    fn keeps_input_when_nothing_simpler_fails() {
        let value = map(vec![("a", GeneratedValue::Bool(true))]);
        let minimized =
            Minimizer::default().minimize(&loose(), value.clone(), |candidate| candidate == &value);
        assert_eq!(minimized.value, value);
        assert_eq!(minimized.accepted, 0);
    }

    #[test]
    fn stays_inside_the_schema() {
        let schema = SchemaNode::new(SchemaKind::Object)
            .with_property(
                "replicaCount",
                SchemaNode::new(SchemaKind::Integer).with_range(Some(1.0), Some(10.0)),
            )
            .with_property(
                "pullPolicy",
                SchemaNode::new(SchemaKind::String).with_enum(vec![
                    GeneratedValue::from("Always"),
                    GeneratedValue::from("Never"),
                ]),
            )
            .with_property(
                "name",
                SchemaNode::new(SchemaKind::String).with_length(Some(3), Some(8)),
            )
            .with_property("ratio", SchemaNode::new(SchemaKind::Number).with_range(Some(-2.5), Some(-0.5)))
            .with_property("debug", SchemaNode::new(SchemaKind::Boolean))
            .with_required("replicaCount")
            .with_required("pullPolicy")
            .with_required("name")
            .with_required("ratio");
        let value = map(vec![
            ("replicaCount", GeneratedValue::Integer(7)),
            ("pullPolicy", GeneratedValue::from("Never")),
            ("name", GeneratedValue::from("frontend")),
            ("ratio", GeneratedValue::Float(-2.0)),
            ("debug", GeneratedValue::Bool(true)),
        ]);

        let minimized = Minimizer::default().minimize(&schema, value, |_| true);
        assert_eq!(
            minimized.value,
            map(vec![
                ("replicaCount", GeneratedValue::Integer(1)),
                ("pullPolicy", GeneratedValue::from("Always")),
                ("name", GeneratedValue::from("aaa")),
                ("ratio", GeneratedValue::Float(-0.5)),
            ])
        );
    }

    #[test]
    fn pattern_strings_are_not_rewritten() {
        let schema = SchemaNode::new(SchemaKind::String).with_pattern("^[a-z]{3}-[0-9]$");
        let value = GeneratedValue::from("abc-1");
        let minimized = Minimizer::default().minimize(&schema, value.clone(), |_| true);
        assert_eq!(minimized.value, value);
        assert_eq!(minimized.attempts, 0);
    }

    #[test]
    fn deep_nested_lists_stay_within_the_budget() {
        let mut schema = SchemaNode::new(SchemaKind::String).with_length(Some(50), Some(100));
        let mut value = GeneratedValue::from("x".repeat(80));
        for _ in 0..5 {
            schema = SchemaNode::new(SchemaKind::Array).with_items(schema);
            value = GeneratedValue::List(vec![value; 8]);
        }

        assert_eq!(plan_edits(&schema, &value, 50).len(), 50);

        let minimized = Minimizer::default().minimize(&schema, value.clone(), |_| false);
        assert_eq!(minimized.attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(minimized.value, value);
    }

    #[test]
    fn edits_are_addressed_by_path() {
        let value = map(vec![(
            "hosts",
            GeneratedValue::List(vec![GeneratedValue::from("a"), GeneratedValue::from("b")]),
        )]);
        let edits = plan_edits(&loose(), &value, usize::MAX);
        assert_eq!(
            edits[0],
            Edit {
                path: Vec::new(),
                change: Change::RemoveKey("hosts".to_string()),
            }
        );
        let replaced = Edit {
            path: vec![Step::Key("hosts".to_string()), Step::Index(1)],
            change: Change::Replace(GeneratedValue::from("")),
        };
        assert!(edits.contains(&replaced));
        assert_eq!(
            replaced.apply(&value),
            Some(map(vec![(
                "hosts",
                GeneratedValue::List(vec![GeneratedValue::from("a"), GeneratedValue::from("")]),
            )]))
        );
    }
}
