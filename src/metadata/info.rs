//! Resolved metadata records.
//!
//! These records are produced by [`crate::metadata::accessor::MetadataAccessor`] on demand and
//! are plain values: they own their strings, carry no reference to the host and have no
//! identity beyond the query that produced them. A record always describes a resolved entity;
//! failed resolutions are reported as `None` by the accessor instead.

use bitflags::bitflags;

use crate::{
    host::{AssemblyId, ModuleId},
    integrations::SignatureBlob,
    metadata::token::Token,
};

bitflags! {
    /// Flags the runtime reports for a loaded module (`COR_PRF_MODULE_FLAGS`)
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct ModuleFlags: u32 {
        /// The module was loaded from disk
        const ON_DISK = 0x0000_0001;
        /// The module is a native image
        const NGEN = 0x0000_0002;
        /// The module was created via reflection emit
        const DYNAMIC = 0x0000_0004;
        /// The module can be unloaded together with its load context
        const COLLECTIBLE = 0x0000_0008;
        /// The module only carries resources
        const RESOURCE = 0x0000_0010;
        /// The module is mapped flat instead of in its image layout
        const FLAT_LAYOUT = 0x0000_0020;
        /// The module is a Windows Runtime metadata module
        const WINDOWS_RUNTIME = 0x0000_0040;
    }
}

/// A loaded assembly
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyInfo {
    /// Runtime handle of the assembly
    pub id: AssemblyId,
    /// Simple name, e.g. `System.Net.Http`
    pub name: String,
}

/// A loaded module
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Runtime handle of the module
    pub id: ModuleId,
    /// File path the module was loaded from
    pub path: String,
    /// The assembly owning the module
    pub assembly: AssemblyInfo,
    /// Flags reported by the runtime
    pub flags: ModuleFlags,
}

impl ModuleInfo {
    /// Returns true for Windows Runtime metadata modules, which are never instrumented
    #[must_use]
    pub fn is_windows_runtime(&self) -> bool {
        self.flags.contains(ModuleFlags::WINDOWS_RUNTIME)
    }
}

/// A type definition or reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    /// `TypeDef` or `TypeRef` token
    pub id: Token,
    /// Full name of the type, including its namespace
    pub name: String,
}

/// A method definition, reference or instantiation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionInfo {
    /// The token the function was resolved from
    pub id: Token,
    /// Simple name of the method
    pub name: String,
    /// The declaring type, if it could be resolved. Members of constructed generic types
    /// (`TypeSpec` parents) have none.
    pub type_info: Option<TypeInfo>,
    /// The method signature, or the instantiation signature for a `MethodSpec`
    pub signature: SignatureBlob,
}
