//! Shared functionality which is used in unit tests
//!
//! - [`FakeHost`] - An in-memory [`crate::host::MetadataHost`] with failure injection and
//!   enumeration bookkeeping
//! - factories for small rule sets

mod host;

pub use factories::*;
pub use host::FakeHost;
