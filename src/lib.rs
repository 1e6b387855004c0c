// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dotprobe
//!
//! Rule-driven selection of .NET methods for call-site rewriting by a CLR profiler.
//!
//! A tracing profiler attached to the CLR learns about every module the runtime loads and
//! every method it is about to compile. `dotprobe` decides which of those methods should have
//! their bodies rewritten, based on declarative *integrations* loaded from JSON rule files.
//! It does not rewrite IL itself: it hands the selected replacements to the rewriter and mints
//! the `MethodSpec` tokens the rewriter needs for generic targets.
//!
//! ## Architecture
//!
//! - [`host`] - The narrow capability boundary to the runtime, and a lazy adapter over its
//!   paged enumerations
//! - [`metadata`] - Tokens, resolved metadata records and the per-module accessor
//! - [`integrations`] - The rule model, the rule file loader and the filter passes
//! - [`config`] - Environment based configuration
//! - [`registry`] - Concurrent per-module state for profiler callbacks
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashSet;
//! use dotprobe::integrations::{
//!     filter_by_caller, filter_by_name, filter_by_target, load_integrations_from_str,
//! };
//!
//! let integrations = load_integrations_from_str(r#"[
//!     {
//!         "name": "HttpClient",
//!         "method_replacements": [{
//!             "target": { "assembly": "System.Net.Http", "method": "SendAsync" },
//!             "wrapper": { "assembly": "Datadog.Trace.ClrProfiler.Managed", "method": "SendAsync" }
//!         }]
//!     }
//! ]"#)?;
//!
//! let references: HashSet<String> = ["mscorlib", "System.Net.Http"]
//!     .iter()
//!     .map(|name| name.to_string())
//!     .collect();
//!
//! let enabled = filter_by_name(&integrations, &HashSet::new());
//! let callable = filter_by_caller(&enabled, "MyApp");
//! let applicable = filter_by_target(&callable, &references, "MyApp");
//! assert_eq!(applicable.len(), 1);
//! # Ok::<(), dotprobe::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Configuration and lookup faults never abort the host process. Rule files are loaded with
//! file and entry granularity fault isolation, metadata resolvers return `None` for anything
//! they cannot resolve, and every skipped item is logged through the [`log`] facade. Callers
//! that need the precise failure use the `try_*` resolvers, which return [`Result`].
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotprobe::prelude::*;
///
/// let integrations = load_integrations_from_str("[]")?;
/// assert!(integrations.is_empty());
/// # Ok::<(), dotprobe::Error>(())
/// ```
pub mod prelude;

pub mod config;
pub mod host;
pub mod integrations;
pub mod metadata;
pub mod registry;

/// `dotprobe` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotprobe` Error type
///
/// The main error type for all fallible operations in this crate.
pub use error::Error;
