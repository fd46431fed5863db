//! Configuration module
//!
//! Settings shared by all CLI commands.

use hashq_core::domain::sanitize::ParameterSanitizer;

/// CLI configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parameter keys hidden in addition to the default denylist
    pub extra_sensitive_params: Vec<String>,
}

impl Config {
    /// Sanitizer covering the default denylist plus `--sensitive-param` keys
    pub fn sanitizer(&self) -> ParameterSanitizer {
        self.extra_sensitive_params.iter().map(String::as_str).collect()
    }
}
