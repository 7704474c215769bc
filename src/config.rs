//! Options controlling a single traversal session

use clap::ValueEnum;

/// Which scalars get captured while normalizing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ClassificationPolicy {
    /// Only numbers are inserted for top-level scalars, and nested numbers
    /// are dropped. Text and booleans are captured only below the top level.
    ///
    /// Nested booleans are always captured. Readers with a separate binary
    /// scalar type only capture that type at this point, so nested booleans
    /// are where this policy differs from them.
    #[default]
    Reference,
    /// Every non-null scalar is captured at both levels
    Uniform,
}

impl ClassificationPolicy {
    // Covers booleans as well as text
    pub(crate) fn keeps_top_level_text(self) -> bool {
        self == ClassificationPolicy::Uniform
    }

    pub(crate) fn keeps_nested_numbers(self) -> bool {
        self == ClassificationPolicy::Uniform
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Record flattened object and array fields in the result mapping.
    /// Without it those fields are still traversed, but only their
    /// effect on the reader position remains.
    pub diagnostic_mode: bool,
    pub policy: ClassificationPolicy,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diagnostic_mode(mut self, enabled: bool) -> Self {
        self.diagnostic_mode = enabled;
        self
    }

    pub fn with_policy(mut self, policy: ClassificationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_to_reference_without_diagnostics() {
        let config = Config::default();

        assert!(!config.diagnostic_mode);
        assert_eq!(config.policy, ClassificationPolicy::Reference);
    }

    #[test]
    fn it_builds_config() {
        let config = Config::new()
            .with_diagnostic_mode(true)
            .with_policy(ClassificationPolicy::Uniform);

        assert!(config.diagnostic_mode);
        assert!(config.policy.keeps_nested_numbers());
        assert!(config.policy.keeps_top_level_text());
    }
}
