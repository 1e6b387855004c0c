//! Profiler configuration.
//!
//! The profiler is configured through the environment of the profiled process:
//!
//! - `DD_INTEGRATIONS` - rule files to load, separated by `;`
//! - `DD_DISABLED_INTEGRATIONS` - names of integrations to skip, separated by `;`
//!
//! Surrounding whitespace is trimmed from every entry and empty entries are dropped. A variable
//! that is not set is an empty list.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

/// Environment variable listing the rule files
pub const INTEGRATIONS_PATH_VAR: &str = "DD_INTEGRATIONS";

/// Environment variable listing the disabled integrations
pub const DISABLED_INTEGRATIONS_VAR: &str = "DD_DISABLED_INTEGRATIONS";

/// Separator of list-valued environment variables
pub const LIST_SEPARATOR: char = ';';

/// Where to load integrations from and which of them to skip
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfilerConfig {
    integration_paths: Vec<PathBuf>,
    disabled_integrations: HashSet<String>,
}

impl ProfilerConfig {
    /// Reads the configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let integration_paths = lookup(INTEGRATIONS_PATH_VAR)
            .map(|value| split_list(&value).map(PathBuf::from).collect())
            .unwrap_or_default();

        let disabled_integrations = lookup(DISABLED_INTEGRATIONS_VAR)
            .map(|value| split_list(&value).map(str::to_string).collect())
            .unwrap_or_default();

        ProfilerConfig {
            integration_paths,
            disabled_integrations,
        }
    }

    /// Appends a rule file
    #[must_use]
    pub fn with_integration_path(mut self, path: impl AsRef<Path>) -> Self {
        self.integration_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Disables an integration by name
    #[must_use]
    pub fn with_disabled_integration(mut self, name: impl Into<String>) -> Self {
        self.disabled_integrations.insert(name.into());
        self
    }

    /// The rule files, in load order
    #[must_use]
    pub fn integration_paths(&self) -> &[PathBuf] {
        &self.integration_paths
    }

    /// The names of the disabled integrations
    #[must_use]
    pub fn disabled_integrations(&self) -> &HashSet<String> {
        &self.disabled_integrations
    }

    /// Returns true if the integration called `name` is disabled
    #[must_use]
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled_integrations.contains(name)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}
