//! Differentiation engine configuration
//!
//! Environment overrides:
//! - `KEFORM_GRAD_MEMOIZE=0`: disable the (node, gradient) result cache
//! - `KEFORM_GRAD_PRUNE=0`: always recurse, even into subtrees without the target
//! - `KEFORM_GRAD_MAX_DEPTH=<n>`: recursion limit

use typed_builder::TypedBuilder;

/// Default recursion limit of the differentiation engine; fits in a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Settings for [`Differentiator`](crate::grad::Differentiator).
///
/// # Example
///
/// ```
/// use keform::GradConfig;
///
/// let config = GradConfig::builder().memoize(false).build();
/// assert!(!config.memoize);
/// assert!(config.prune);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct GradConfig {
    /// Cache results per (node, upstream gradient) pair so shared sub-formulas
    /// are differentiated once and stay shared in the result.
    #[builder(default = true)]
    pub memoize: bool,
    /// Return the zero formula directly for subtrees that do not contain the target.
    #[builder(default = true)]
    pub prune: bool,
    /// Maximum recursion depth.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

impl Default for GradConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GradConfig {
    /// Defaults, overridden by `KEFORM_GRAD_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(flag) = env_flag("KEFORM_GRAD_MEMOIZE") {
            config.memoize = flag;
        }
        if let Some(flag) = env_flag("KEFORM_GRAD_PRUNE") {
            config.prune = flag;
        }
        if let Ok(value) = std::env::var("KEFORM_GRAD_MAX_DEPTH") {
            match value.trim().parse() {
                Ok(depth) => config.max_depth = depth,
                Err(_) => log::warn!("Ignoring invalid KEFORM_GRAD_MAX_DEPTH={value:?}"),
            }
        }
        config
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    parse_flag(&value)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GradConfig::default();
        assert!(config.memoize);
        assert!(config.prune);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_builder_overrides() {
        let config = GradConfig::builder().prune(false).max_depth(8).build();
        assert!(config.memoize);
        assert!(!config.prune);
        assert_eq!(config.max_depth, 8);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }
}
