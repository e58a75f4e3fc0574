//! Per-conversion options.

use crate::registry::{FormatGates, DEFAULT_GATES};

/// What happens when an optional dependency cannot be found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DependencyPolicy {
    /// Log a warning and continue with defaults.
    #[default]
    Lenient,
    /// Fail the conversion with `MissingDependency`.
    Strict,
}

/// Options for a single conversion request.
///
/// There is no global configuration: every call carries its own options.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Stem of generated output names (`{stem}.{ext}`)
    pub output_stem: String,
    /// Treatment of optional dependencies that cannot be found
    pub dependency_policy: DependencyPolicy,
    /// Disabled formats and format extensions
    pub gates: &'static FormatGates,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::eager()
    }
}

impl ConvertOptions {
    /// Defaults for a fully staged file set.
    pub fn eager() -> Self {
        Self {
            output_stem: "result".to_string(),
            dependency_policy: DependencyPolicy::Lenient,
            gates: &DEFAULT_GATES,
        }
    }

    /// Defaults for callback-driven loading.
    pub fn delayed() -> Self {
        Self {
            dependency_policy: DependencyPolicy::Strict,
            ..Self::eager()
        }
    }

    /// Start a builder from the eager defaults.
    pub fn builder() -> ConvertOptionsBuilder {
        ConvertOptionsBuilder::new()
    }
}

/// Builder for [`ConvertOptions`].
///
/// # Example
///
/// ```
/// use stagehand_core::{ConvertOptions, DependencyPolicy};
///
/// let options = ConvertOptions::builder()
///     .output_stem("cube")
///     .dependency_policy(DependencyPolicy::Strict)
///     .build();
///
/// assert_eq!(options.output_stem, "cube");
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConvertOptionsBuilder {
    options: ConvertOptions,
}

impl ConvertOptionsBuilder {
    /// Create a builder with the eager defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the delayed-mode defaults instead.
    pub fn delayed(mut self) -> Self {
        self.options.dependency_policy = DependencyPolicy::Strict;
        self
    }

    /// Set the output name stem. An empty stem falls back to `result`.
    pub fn output_stem(mut self, stem: impl Into<String>) -> Self {
        let stem = stem.into();
        if !stem.is_empty() {
            self.options.output_stem = stem;
        }
        self
    }

    /// Set the dependency policy.
    pub fn dependency_policy(mut self, policy: DependencyPolicy) -> Self {
        self.options.dependency_policy = policy;
        self
    }

    /// Use a different gate table.
    pub fn gates(mut self, gates: &'static FormatGates) -> Self {
        self.options.gates = gates;
        self
    }

    /// Finish building.
    pub fn build(self) -> ConvertOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults() {
        assert_eq!(ConvertOptions::eager().dependency_policy, DependencyPolicy::Lenient);
        assert_eq!(ConvertOptions::delayed().dependency_policy, DependencyPolicy::Strict);
        assert_eq!(ConvertOptions::default().output_stem, "result");
    }

    #[test]
    fn test_builder() {
        static NONE: FormatGates = FormatGates::new(&[]);
        let options = ConvertOptions::builder()
            .delayed()
            .output_stem("")
            .gates(&NONE)
            .build();

        assert_eq!(options.output_stem, "result");
        assert_eq!(options.dependency_policy, DependencyPolicy::Strict);
        assert!(options.gates.is_empty());
    }
}
