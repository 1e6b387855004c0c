//! Per-module state shared across profiler callbacks.
//!
//! The runtime reports module loads, unloads and method compilations on its own threads,
//! concurrently for different modules. [`ModuleRegistry`] keeps the filtered integrations of
//! every instrumented module in a sharded concurrent map so those callbacks never contend on a
//! single lock.
//!
//! # Examples
//!
//! ```rust,ignore
//! use dotprobe::{config::ProfilerConfig, integrations, registry::ModuleRegistry};
//!
//! let config = ProfilerConfig::from_env();
//! let registry = ModuleRegistry::from_config(&config);
//!
//! // ModuleLoadFinished
//! registry.on_module_loaded(&host, module_id);
//!
//! // JITCompilationStarted
//! if let Some(metadata) = registry.get(module_id) {
//!     let accessor = MetadataAccessor::new(&host, module_id);
//!     if let Some(function) = accessor.resolve_function(method_token) {
//!         for replacement in metadata.replacements_for(&function) {
//!             // hand over to the rewriter
//!         }
//!     }
//! }
//! ```

use std::{collections::HashSet, sync::Arc};

use dashmap::DashMap;
use log::{debug, info};

use crate::{
    config::ProfilerConfig,
    host::{MetadataHost, ModuleId},
    integrations::{filter_for_module, load_integrations_from_config, Integration, MethodReplacement},
    metadata::{
        accessor::MetadataAccessor,
        info::{FunctionInfo, ModuleInfo},
    },
};

/// What the profiler knows about one instrumented module
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleMetadata {
    /// The module
    pub module: ModuleInfo,
    /// Name of the assembly described by the module's metadata
    pub assembly_name: String,
    /// The integrations applicable to this module, never empty
    pub integrations: Vec<Integration>,
}

impl ModuleMetadata {
    /// Selects the replacements whose caller may be `function`.
    ///
    /// A replacement is selected when its caller's type and method constraints are empty or
    /// equal to the function's declaring type and name. A function whose declaring type is
    /// unknown only matches callers without a type constraint.
    #[must_use]
    pub fn replacements_for(&self, function: &FunctionInfo) -> Vec<&MethodReplacement> {
        let type_name = function.type_info.as_ref().map(|t| t.name.as_str());

        self.integrations
            .iter()
            .flat_map(Integration::method_replacements)
            .filter(|replacement| {
                let caller = replacement.caller();
                let type_matches = match type_name {
                    Some(name) => caller.matches_type(name),
                    None => caller.type_name().is_empty(),
                };
                type_matches && caller.matches_method(&function.name)
            })
            .collect()
    }
}

/// Concurrent map from module id to the metadata of instrumented modules
pub struct ModuleRegistry {
    integrations: Arc<[Integration]>,
    disabled: HashSet<String>,
    modules: DashMap<ModuleId, Arc<ModuleMetadata>>,
}

impl ModuleRegistry {
    /// Creates an empty registry over a loaded integration set
    ///
    /// ## Arguments
    /// * 'integrations' - Every integration loaded at startup
    /// * 'disabled' - Names of integrations never applied
    pub fn new(integrations: impl Into<Arc<[Integration]>>, disabled: HashSet<String>) -> Self {
        ModuleRegistry {
            integrations: integrations.into(),
            disabled,
            modules: DashMap::new(),
        }
    }

    /// Loads the integrations named by `config` and creates an empty registry over them
    #[must_use]
    pub fn from_config(config: &ProfilerConfig) -> Self {
        let integrations = load_integrations_from_config(config);
        info!("Loaded {} integrations in total", integrations.len());
        Self::new(integrations, config.disabled_integrations().clone())
    }

    /// The integrations loaded at startup
    #[must_use]
    pub fn integrations(&self) -> &[Integration] {
        &self.integrations
    }

    /// Resolves a freshly loaded module and records it if any integration applies to it.
    ///
    /// Windows Runtime modules, modules that cannot be resolved and modules without applicable
    /// integrations are skipped and return `None`.
    pub fn on_module_loaded<H>(&self, host: &H, module: ModuleId) -> Option<Arc<ModuleMetadata>>
    where
        H: MetadataHost + ?Sized,
    {
        let accessor = MetadataAccessor::new(host, module);
        let module_info = accessor.resolve_module(module)?;

        if module_info.is_windows_runtime() {
            debug!(
                "Skipping Windows Runtime module {} ({})",
                module, module_info.path
            );
            return None;
        }

        let assembly_name = accessor.assembly_name()?;
        let integrations = filter_for_module(&self.integrations, &self.disabled, &accessor)?;
        if integrations.is_empty() {
            debug!(
                "No integrations apply to module {} of assembly {}",
                module, assembly_name
            );
            return None;
        }

        info!(
            "Instrumenting module {} of assembly {} with {} integrations",
            module,
            assembly_name,
            integrations.len()
        );

        let metadata = Arc::new(ModuleMetadata {
            module: module_info,
            assembly_name,
            integrations,
        });
        self.modules.insert(module, metadata.clone());
        Some(metadata)
    }

    /// Forgets an unloaded module, returning its metadata if it was instrumented
    pub fn on_module_unloaded(&self, module: ModuleId) -> Option<Arc<ModuleMetadata>> {
        self.modules.remove(&module).map(|(_, metadata)| metadata)
    }

    /// The metadata of an instrumented module
    #[must_use]
    pub fn get(&self, module: ModuleId) -> Option<Arc<ModuleMetadata>> {
        self.modules.get(&module).map(|entry| entry.value().clone())
    }

    /// Number of instrumented modules
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if no module is instrumented
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
