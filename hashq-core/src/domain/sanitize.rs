//! Parameter sanitization
//!
//! Job parameters may carry raw hash lists, uploaded file contents and custom
//! rule files. Anything leaving the queue's trusted boundary (logs, telemetry,
//! lower-privilege viewers) must go through this module first.
//!
//! Keys are matched exactly and denylisted entries are dropped, not masked.

use std::collections::{BTreeSet, HashMap};

use crate::domain::job::Job;

/// Parameter keys that never reach logs or low-trust sinks
pub const LOGGING_DENYLIST: [&str; 5] = [
    "hashes_multiline",
    "hashes_file_upload",
    "dict_use_custom_prepend",
    "dict_rules_use_custom",
    "dict_rules_custom_file",
];

/// Returns the parameters of `job` that are safe to log
///
/// The result is a fresh map; `job` is not modified.
pub fn sanitize_for_logging(job: &Job) -> HashMap<String, String> {
    sanitize_params(&job.parameters, |key| LOGGING_DENYLIST.contains(&key))
}

/// Denylist-based sanitizer that can be extended with deployment-specific keys
///
/// The default denylist is always included.
#[derive(Debug, Clone)]
pub struct ParameterSanitizer {
    extra_keys: BTreeSet<String>,
}

impl ParameterSanitizer {
    /// Sanitizer with only the default denylist
    pub fn new() -> Self {
        Self {
            extra_keys: BTreeSet::new(),
        }
    }

    /// Adds keys to the denylist
    pub fn with_extra_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_keys.extend(
            keys.into_iter()
                .map(Into::into)
                .filter(|key: &String| !key.is_empty()),
        );
        self
    }

    /// Returns true if `key` must be dropped
    pub fn is_sensitive(&self, key: &str) -> bool {
        LOGGING_DENYLIST.contains(&key) || self.extra_keys.contains(key)
    }

    /// All denylisted keys, default ones first
    pub fn denylist(&self) -> Vec<&str> {
        LOGGING_DENYLIST
            .iter()
            .copied()
            .chain(
                self.extra_keys
                    .iter()
                    .map(String::as_str)
                    .filter(|key| !LOGGING_DENYLIST.contains(key)),
            )
            .collect()
    }

    pub fn sanitize(&self, job: &Job) -> HashMap<String, String> {
        self.sanitize_map(&job.parameters)
    }

    pub fn sanitize_map(&self, parameters: &HashMap<String, String>) -> HashMap<String, String> {
        sanitize_params(parameters, |key| self.is_sensitive(key))
    }
}

impl Default for ParameterSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects extra keys on top of the default denylist
impl<S: Into<String>> FromIterator<S> for ParameterSanitizer {
    fn from_iter<I: IntoIterator<Item = S>>(keys: I) -> Self {
        Self::new().with_extra_keys(keys)
    }
}

fn sanitize_params(
    parameters: &HashMap<String, String>,
    is_sensitive: impl Fn(&str) -> bool,
) -> HashMap<String, String> {
    parameters
        .iter()
        .filter(|(key, _)| !is_sensitive(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
