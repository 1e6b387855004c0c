//! # dotprobe Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotprobe library. Import this module to get quick access to everything a profiler
//! callback needs to select and instantiate method replacements.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotprobe operations
pub use crate::Error;

/// The result type used throughout dotprobe
pub use crate::Result;

/// Environment based configuration
pub use crate::config::ProfilerConfig;

// ================================================================================================
// Host Boundary
// ================================================================================================

/// The capability trait implemented on top of the runtime
pub use crate::host::{HostError, HostResult, MetadataHost};

/// Runtime handles and enumeration primitives
pub use crate::host::{AssemblyId, EnumHandle, ModuleId, PageFill};

/// Lazy adapter over paged host enumerations
pub use crate::host::enumerator::{PagedEnum, ENUM_PAGE_SIZE};

// ================================================================================================
// Metadata
// ================================================================================================

/// Metadata tokens
pub use crate::metadata::token::{Token, TokenKind};

/// Resolved metadata records
pub use crate::metadata::info::{AssemblyInfo, FunctionInfo, ModuleFlags, ModuleInfo, TypeInfo};

/// Per-module metadata access
pub use crate::metadata::accessor::MetadataAccessor;

// ================================================================================================
// Integrations
// ================================================================================================

/// The rule model
pub use crate::integrations::{Integration, MethodReference, MethodReplacement, SignatureBlob};

/// Rule file loading
pub use crate::integrations::{
    load_integrations_from_config, load_integrations_from_file, load_integrations_from_files,
    load_integrations_from_reader, load_integrations_from_str,
};

/// Filter passes
pub use crate::integrations::{
    filter_by_caller, filter_by_name, filter_by_target, filter_for_module, AssemblyReferences,
};

// ================================================================================================
// Module State
// ================================================================================================

/// Concurrent per-module state
pub use crate::registry::{ModuleMetadata, ModuleRegistry};
