use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 16;

/// Resolver settings, loadable from TOML.
///
/// ```toml
/// max_delegation_depth = 8
/// trace_decisions = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Longest chain of delegated checks allowed below a top-level call
    pub max_delegation_depth: usize,

    /// Emit a tracing span and decision events for every authorization
    pub trace_decisions: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
            trace_decisions: true,
        }
    }
}

impl ResolverConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate().map_err(PolicyError::Config)?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_delegation_depth == 0 {
            return Err("max_delegation_depth must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    pub fn with_trace_decisions(mut self, enabled: bool) -> Self {
        self.trace_decisions = enabled;
        self
    }
}
