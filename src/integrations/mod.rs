//! Instrumentation rules and their selection.
//!
//! An [`Integration`] is a named bundle of [`MethodReplacement`]s, each describing one
//! call-site substitution: calls to a *target* method made from a *caller* are redirected to
//! a *wrapper*. Integrations are loaded once at startup from JSON rule files (see [`loader`])
//! and narrowed per loaded module by the passes in [`filter`].
//!
//! # Key Components
//!
//! - [`Integration`], [`MethodReplacement`], [`MethodReference`] - The immutable rule model
//! - [`SignatureBlob`] - Opaque signature bytes, including the lenient hex decoder
//! - [`loader`] - Fault tolerant rule file parsing
//! - [`filter`] - The name, caller and target passes
//!
//! # Examples
//!
//! ```rust
//! use std::collections::HashSet;
//! use dotprobe::integrations::{filter_by_caller, filter_by_name, load_integrations_from_str};
//!
//! let integrations = load_integrations_from_str(r#"[
//!     { "name": "A", "method_replacements": [ { "caller": { "assembly": "App" } } ] },
//!     { "name": "B", "method_replacements": [ {} ] }
//! ]"#)?;
//!
//! let enabled = filter_by_name(&integrations, &HashSet::new());
//! let applicable = filter_by_caller(&enabled, "Other");
//! assert_eq!(applicable.len(), 1);
//! assert_eq!(applicable[0].name(), "B");
//! # Ok::<(), dotprobe::Error>(())
//! ```

pub mod filter;
pub mod loader;
mod model;
mod signature;

pub use filter::{
    filter_by_caller, filter_by_name, filter_by_target, filter_for_module, AssemblyReferences,
};
pub use loader::{
    load_integrations_from_config, load_integrations_from_file, load_integrations_from_files,
    load_integrations_from_reader, load_integrations_from_str,
};
pub use model::{Integration, MethodReference, MethodReplacement};
pub use signature::SignatureBlob;
