use cfgfuzz_config::FuzzConfig;

use crate::render::RenderResponse;

/// Error substrings that mark a crash as expected input rejection.
pub const DEFAULT_UNINTERESTING_PATTERNS: &[&str] = &[
    "validation failed",
    "required value",
    "missing required field",
];

/// Classifies render responses as crash or not, and interesting or not.
#[derive(Debug, Clone)]
pub struct Oracle {
    ignore_errors: Vec<String>,
    uninteresting_patterns: Vec<String>,
}

impl Default for Oracle {
    fn default() -> Self {
        Self {
            ignore_errors: Vec::new(),
            uninteresting_patterns: DEFAULT_UNINTERESTING_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
        }
    }
}

impl Oracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle tuned by the user configuration.
    pub fn from_config(config: &FuzzConfig) -> Self {
        let oracle = Self::default().with_ignore_errors(config.ignore_errors.iter().cloned());
        match &config.uninteresting_patterns {
            Some(patterns) => oracle.with_uninteresting_patterns(patterns.iter().cloned()),
            None => oracle,
        }
    }

    /// Add error substrings that are not crashes. Extends the current list.
    pub fn with_ignore_errors(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.ignore_errors.extend(patterns);
        self
    }

    /// Replace the uninteresting pattern list, defaults included.
    pub fn with_uninteresting_patterns(
        mut self,
        patterns: impl IntoIterator<Item = String>,
    ) -> Self {
        self.uninteresting_patterns = patterns.into_iter().collect();
        self
    }

    pub fn ignore_errors(&self) -> &[String] {
        &self.ignore_errors
    }

    pub fn is_crash(&self, response: &RenderResponse) -> bool {
        if response.success {
            return false;
        }
        if response.fault.is_some() {
            return true;
        }
        match &response.error_text {
            Some(text) => !contains_any(text, &self.ignore_errors),
            None => false,
        }
    }

    /// Whether an error was dropped by the ignore list.
    pub fn is_ignored(&self, response: &RenderResponse) -> bool {
        !response.success
            && response.fault.is_none()
            && response
                .error_text
                .as_deref()
                .is_some_and(|text| contains_any(text, &self.ignore_errors))
    }

    pub fn describe_reason(&self, response: &RenderResponse) -> String {
        if let Some(fault) = &response.fault {
            return format!("Panic: {fault}");
        }
        match &response.error_text {
            Some(text) => format!("Error: {text}"),
            None => "Unknown failure".to_string(),
        }
    }

    pub fn is_interesting(&self, response: &RenderResponse) -> bool {
        if !self.is_crash(response) {
            return false;
        }
        match &response.error_text {
            Some(text) => !contains_any(text, &self.uninteresting_patterns),
            None => true,
        }
    }
}

fn contains_any(text: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| text.contains(pattern.as_str()))
}
