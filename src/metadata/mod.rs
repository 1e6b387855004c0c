//! Typed access to the metadata of loaded modules.
//!
//! # Key Components
//!
//! - [`token`] - Metadata table row references used throughout .NET
//! - [`info`] - Resolved assembly, module, type and function records
//! - [`accessor`] - Token resolution and enumeration for one module
//! - [`methodspec`] - Minting generic method instantiations

/// Resolution of tokens into records, and lazy token enumerations
pub mod accessor;
/// Resolved metadata records
pub mod info;
/// Definition of `MethodSpec` tokens for generic call targets
pub mod methodspec;
/// Commonly used metadata token type
pub mod token;
