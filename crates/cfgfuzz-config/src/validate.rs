use std::collections::HashSet;

use jsonschema::JSONSchema;
use regex::Regex;
use serde_json::Value;

use crate::errors::{ConfigError, IssueSeverity, ValidationIssue, ValidationReport};
use crate::model::FuzzConfig;
use crate::schema::config_json_schema;

/// Validated configuration with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub config: FuzzConfig,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a configuration document against the configuration JSON Schema.
pub fn validate_config_json(
    config_json: &Value,
    config_schema: &Value,
) -> Result<ValidationReport, ConfigError> {
    let compiled =
        JSONSchema::compile(config_schema).map_err(|err| ConfigError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(config_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Check a parsed configuration for contradictions the JSON Schema cannot
/// express.
pub fn validate_config_semantics(config: &FuzzConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_ignore(config, &mut report);
    validate_constraints(config, &mut report);
    validate_error_patterns(config, &mut report);

    report
}

/// Validate the configuration end-to-end, returning structured issues on
/// failure. Zero-valued limits are normalised to their defaults.
pub fn validate_config(config_json: &Value) -> Result<ValidatedConfig, ValidationReport> {
    let schema_json = match serde_json::to_value(config_json_schema()) {
        Ok(value) => value,
        Err(err) => return Err(single_error("config_schema_error", err.to_string())),
    };

    let structural = match validate_config_json(config_json, &schema_json) {
        Ok(report) => report,
        Err(err) => return Err(single_error("config_schema_error", err.to_string())),
    };
    if !structural.is_ok() {
        return Err(structural);
    }

    let mut config: FuzzConfig = match serde_json::from_value(config_json.clone()) {
        Ok(config) => config,
        Err(err) => return Err(single_error("invalid_config", err.to_string())),
    };
    config.normalize();

    let semantic = validate_config_semantics(&config);
    if !semantic.is_ok() {
        return Err(semantic);
    }

    Ok(ValidatedConfig {
        config,
        warnings: semantic.warnings,
    })
}

fn validate_ignore(config: &FuzzConfig, report: &mut ValidationReport) {
    for (idx, path) in config.ignore.iter().enumerate() {
        if path.trim().is_empty() {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "empty_ignore_path",
                format!("/ignore/{idx}"),
                "ignore entry is empty and matches nothing".to_string(),
                Some("remove the entry".to_string()),
            ));
        }
    }
}

fn validate_constraints(config: &FuzzConfig, report: &mut ValidationReport) {
    let mut seen = HashSet::new();

    for (idx, constraint) in config.constraints.iter().enumerate() {
        let base_path = format!("/constraints/{idx}");

        if constraint.path.trim().is_empty() {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "empty_path",
                format!("{base_path}/path"),
                "constraint path must not be empty".to_string(),
                Some("use a dotted path such as service.port".to_string()),
            ));
            continue;
        }

        if !seen.insert(constraint.path.as_str()) {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "duplicate_constraint",
                format!("{base_path}/path"),
                format!(
                    "constraint for '{}' is declared more than once; the first one applies",
                    constraint.path
                ),
                None,
            ));
        }

        if config.is_ignored(&constraint.path) {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "ignored_constraint",
                format!("{base_path}/path"),
                format!(
                    "'{}' is also listed in ignore; the ignore rule applies",
                    constraint.path
                ),
                None,
            ));
        }

        if let Some(kind) = &constraint.kind {
            if constraint.schema_kind().is_none() {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "unknown_type",
                    format!("{base_path}/type"),
                    format!("unknown type '{kind}'; the detected type is kept"),
                    Some(
                        "use string, integer, number, boolean, object, array, null or any"
                            .to_string(),
                    ),
                ));
            }
        }

        if let (Some(min), Some(max)) = (constraint.min, constraint.max) {
            if min > max {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "inverted_bounds",
                    base_path.clone(),
                    format!("min {min} is greater than max {max}; generation clamps min to max"),
                    None,
                ));
            }
        }

        if let Some(pattern) = &constraint.pattern {
            if let Err(err) = Regex::new(pattern) {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "invalid_pattern",
                    format!("{base_path}/pattern"),
                    format!("pattern does not compile ({err}); unconstrained strings are used"),
                    None,
                ));
            }
        }
    }
}

fn validate_error_patterns(config: &FuzzConfig, report: &mut ValidationReport) {
    for (idx, pattern) in config.ignore_errors.iter().enumerate() {
        if pattern.is_empty() {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "empty_ignore_error",
                format!("/ignoreErrors/{idx}"),
                "an empty pattern matches every error, so no error is reported as a crash"
                    .to_string(),
                None,
            ));
        }
    }

    if let Some(patterns) = &config.uninteresting_patterns {
        if patterns.is_empty() {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "uninteresting_patterns_empty",
                "/uninterestingPatterns",
                "the default uninteresting patterns are replaced by an empty list".to_string(),
                Some("omit the key to keep the defaults".to_string()),
            ));
        }
    }
}

fn single_error(code: &str, message: String) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.push_error(ValidationIssue::new(
        IssueSeverity::Error,
        code,
        "/",
        message,
        None,
    ));
    report
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rejects_wrong_field_types() {
        let report = validate_config(&json!({"maxDepth": "deep"})).expect_err("invalid");
        assert!(!report.is_ok());
        assert_eq!(report.errors[0].code, "schema_violation");
        assert_eq!(report.errors[0].path, "/maxDepth");
    }

    #[test]
    fn rejects_empty_constraint_path() {
        let report =
            validate_config(&json!({"constraints": [{"path": " "}]})).expect_err("invalid");
        assert_eq!(report.errors[0].code, "empty_path");
    }

    #[test]
    fn warns_about_recoverable_constraint_problems() {
        let validated = validate_config(&json!({
            "ignore": ["db.password"],
            "constraints": [
                {"path": "db.password", "type": "string"},
                {"path": "service.port", "type": "port", "min": 10, "max": 1},
                {"path": "service.port", "pattern": "(["}
            ]
        }))
        .expect("valid config");

        let codes = validated
            .warnings
            .iter()
            .map(|issue| issue.code.as_str())
            .collect::<Vec<_>>();
        assert!(codes.contains(&"ignored_constraint"));
        assert!(codes.contains(&"unknown_type"));
        assert!(codes.contains(&"inverted_bounds"));
        assert!(codes.contains(&"duplicate_constraint"));
        assert!(codes.contains(&"invalid_pattern"));
    }

    #[test]
    fn applies_defaults_for_missing_and_zero_limits() {
        let validated = validate_config(&json!({"maxDepth": 0})).expect("valid config");
        assert_eq!(validated.config.max_depth, crate::DEFAULT_MAX_DEPTH);
        assert_eq!(validated.config.iterations, crate::DEFAULT_ITERATIONS);
        assert!(validated.warnings.is_empty());
    }
}
