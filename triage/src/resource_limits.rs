/// Resource limits applied when loading and evaluating rule sets
///
/// These limits protect against malicious inputs while being generous enough
/// for all legitimate use cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum rule source size in bytes
    /// Real usage: ~40KB, Limit: 5MB
    pub max_file_size_bytes: usize,

    /// Maximum condition nesting depth
    /// Real usage: ~3 levels, Limit: 32
    pub max_condition_depth: usize,

    /// Maximum forward-chaining iterations per evaluation, unless the
    /// rule set overrides it
    pub max_iterations: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 5 * 1024 * 1024, // 5 MB
            max_condition_depth: 32,
            max_iterations: 10,
        }
    }
}

impl ResourceLimits {
    /// Create a new ResourceLimits with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}
