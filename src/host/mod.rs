//! The boundary to the managed runtime hosting the profiler.
//!
//! Everything this crate knows about a loaded module it learns through [`MetadataHost`], a
//! narrow capability trait modelled after the profiling and metadata-import interfaces of the
//! CLR. Production code implements it on top of the runtime's COM interfaces; tests implement it
//! in memory.
//!
//! # Key Components
//!
//! - [`MetadataHost`] - Enumeration, resolution and emission primitives
//! - [`enumerator::PagedEnum`] - Lazy iterator over the runtime's paged enumeration style
//! - [`AssemblyId`] / [`ModuleId`] - Runtime handles of loaded assemblies and modules
//! - [`HostError`] - A failure status reported by the runtime
//!
//! # Paged Enumeration
//!
//! All `enum_*` methods follow the same contract. The host receives an opaque [`EnumHandle`],
//! null on the first call, which it may replace to track its position. It fills as many
//! elements of `out` as it can and reports how many via [`PageFill::Items`], or
//! [`PageFill::Done`] once nothing is left. [`MetadataHost::close_enum`] releases the handle.

pub mod enumerator;

use std::fmt;

use widestring::{U16Str, U16String};

use crate::{metadata::info::ModuleFlags, metadata::token::Token};

/// Result type of all host primitives
pub type HostResult<T> = std::result::Result<T, HostError>;

/// A failure status reported by the host runtime.
///
/// `status` is the raw `HRESULT` returned by the runtime, `operation` names the primitive
/// that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Host call {operation} failed with status 0x{status:08x}")]
pub struct HostError {
    /// The raw status code
    pub status: i32,
    /// The name of the failing host operation
    pub operation: &'static str,
}

impl HostError {
    /// `E_FAIL`, the runtime's generic failure status
    pub const E_FAIL: i32 = 0x8000_4005_u32 as i32;
    /// `CLDB_E_RECORD_NOTFOUND`, returned when a token does not name an existing row
    pub const RECORD_NOT_FOUND: i32 = 0x8013_1130_u32 as i32;
    /// `E_INVALIDARG`
    pub const INVALID_ARG: i32 = 0x8007_0057_u32 as i32;

    /// Creates a new host error
    #[must_use]
    pub fn new(operation: &'static str, status: i32) -> Self {
        HostError { status, operation }
    }
}

/// Runtime handle of a loaded assembly.
///
/// Unlike a [`Token`], which is scoped to one module's metadata, this is assigned by the
/// runtime and is pointer sized. `0` never names a loaded assembly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AssemblyId(pub u64);

/// Runtime handle of a loaded module. `0` never names a loaded module.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ModuleId(pub u64);

macro_rules! impl_runtime_id {
    ($id:ident) => {
        impl $id {
            /// Returns true if this is the null handle
            #[must_use]
            pub fn is_null(&self) -> bool {
                self.0 == 0
            }
        }

        impl From<u64> for $id {
            fn from(value: u64) -> Self {
                $id(value)
            }
        }

        impl fmt::Debug for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($id), "(0x{:x})"), self.0)
            }
        }

        impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:x}", self.0)
            }
        }
    };
}

impl_runtime_id!(AssemblyId);
impl_runtime_id!(ModuleId);

/// Opaque cursor owned by the host during a paged enumeration.
///
/// The adapter starts with the null handle and passes it back unchanged on every refill.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct EnumHandle(pub usize);

impl EnumHandle {
    /// Returns true if the host never assigned this handle
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// Outcome of one page fill.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PageFill {
    /// `count` elements at the start of the buffer are valid
    Items(usize),
    /// The enumeration has no more data
    Done,
}

/// Properties of a loaded assembly
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyProps {
    /// Simple name of the assembly
    pub name: U16String,
}

/// Properties of a loaded module
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleProps {
    /// File path the module was loaded from; empty for dynamic modules
    pub path: U16String,
    /// Runtime handle of the owning assembly
    pub assembly: AssemblyId,
    /// Raw module flags
    pub flags: ModuleFlags,
}

/// Properties of a `MethodDef` or `MemberRef`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberProps {
    /// Declaring type (`TypeDef`, `TypeRef` or `TypeSpec`)
    pub parent: Token,
    /// Simple name of the member
    pub name: U16String,
    /// Raw signature blob
    pub signature: Vec<u8>,
}

/// Properties of a `MethodSpec`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSpecProps {
    /// The generic method being instantiated (`MethodDef` or `MemberRef`)
    pub method: Token,
    /// Raw instantiation signature blob
    pub instantiation: Vec<u8>,
}

/// The introspection and emission capability of the host runtime.
///
/// The trait is object safe. Every method is a synchronous query against the runtime; none of
/// them may block for long. Implementations report failures as [`HostError`], never by
/// panicking.
pub trait MetadataHost {
    /// Pages through the `TypeDef` tokens of `module`
    ///
    /// # Errors
    /// Returns the host status if the enumeration fails
    fn enum_type_defs(
        &self,
        module: ModuleId,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill>;

    /// Pages through the `TypeRef` tokens of `module`
    ///
    /// # Errors
    /// Returns the host status if the enumeration fails
    fn enum_type_refs(
        &self,
        module: ModuleId,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill>;

    /// Pages through the `MethodDef` tokens declared by `parent`
    ///
    /// # Errors
    /// Returns the host status if the enumeration fails
    fn enum_methods(
        &self,
        module: ModuleId,
        parent: Token,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill>;

    /// Pages through the `MemberRef` tokens whose parent is `parent`
    ///
    /// # Errors
    /// Returns the host status if the enumeration fails
    fn enum_member_refs(
        &self,
        module: ModuleId,
        parent: Token,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill>;

    /// Pages through the `ModuleRef` tokens of `module`
    ///
    /// # Errors
    /// Returns the host status if the enumeration fails
    fn enum_module_refs(
        &self,
        module: ModuleId,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill>;

    /// Pages through the `AssemblyRef` tokens of `module`
    ///
    /// # Errors
    /// Returns the host status if the enumeration fails
    fn enum_assembly_refs(
        &self,
        module: ModuleId,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill>;

    /// Releases an enumeration handle. Called exactly once per enumeration, also for a null
    /// handle.
    fn close_enum(&self, module: ModuleId, handle: EnumHandle);

    /// Resolves a loaded assembly
    ///
    /// # Errors
    /// Returns the host status if the assembly is unknown
    fn assembly_props(&self, assembly: AssemblyId) -> HostResult<AssemblyProps>;

    /// Resolves a loaded module
    ///
    /// # Errors
    /// Returns the host status if the module is unknown
    fn module_props(&self, module: ModuleId) -> HostResult<ModuleProps>;

    /// Name of the assembly described by the `Assembly` row of `module`'s metadata
    ///
    /// # Errors
    /// Returns the host status if the module has no assembly manifest
    fn module_assembly_name(&self, module: ModuleId) -> HostResult<U16String>;

    /// Name of the assembly referenced by an `AssemblyRef` token
    ///
    /// # Errors
    /// Returns the host status if the token does not name an existing row
    fn assembly_ref_props(&self, module: ModuleId, token: Token) -> HostResult<U16String>;

    /// Name of a `TypeDef` or `TypeRef`
    ///
    /// # Errors
    /// Returns the host status if the token does not name an existing row
    fn type_props(&self, module: ModuleId, token: Token) -> HostResult<U16String>;

    /// Properties of a `MethodDef` or `MemberRef`
    ///
    /// # Errors
    /// Returns the host status if the token does not name an existing row
    fn member_props(&self, module: ModuleId, token: Token) -> HostResult<MemberProps>;

    /// Properties of a `MethodSpec`
    ///
    /// # Errors
    /// Returns the host status if the token does not name an existing row
    fn method_spec_props(&self, module: ModuleId, token: Token) -> HostResult<MethodSpecProps>;

    /// Emits a new `MethodSpec` row instantiating `method` with `instantiation`
    ///
    /// # Errors
    /// Returns the host status if the runtime rejects the emission
    fn define_method_spec(
        &self,
        module: ModuleId,
        method: Token,
        instantiation: &[u8],
    ) -> HostResult<Token>;
}

/// Decodes a name handed out by the host.
///
/// Hosts fill fixed-size UTF-16 buffers; everything from the first NUL on is padding.
pub(crate) fn decode_name(name: &U16String) -> String {
    let units = name.as_slice();
    let end = units.iter().position(|&c| c == 0).unwrap_or(units.len());
    U16Str::from_slice(&units[..end]).to_string_lossy()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_name() {
        assert_eq!(decode_name(&U16String::from_str("System.Net.Http")), "System.Net.Http");
        assert_eq!(decode_name(&U16String::new()), "");

        let mut padded = U16String::from_str("mscorlib");
        padded.push_slice([0, 0, b'x' as u16]);
        assert_eq!(decode_name(&padded), "mscorlib");
    }

    #[test]
    fn test_host_error_display() {
        let err = HostError::new("GetAssemblyInfo", HostError::E_FAIL);
        assert_eq!(
            err.to_string(),
            "Host call GetAssemblyInfo failed with status 0x80004005"
        );
    }

    #[test]
    fn test_runtime_ids() {
        assert!(ModuleId(0).is_null());
        assert!(!AssemblyId(0x7ff0_1234).is_null());
        assert_eq!(format!("{}", ModuleId(0xabc)), "0xabc");
        assert_eq!(format!("{:?}", AssemblyId(0x10)), "AssemblyId(0x10)");
    }
}
