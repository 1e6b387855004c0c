//! Typed access to the metadata of one loaded module.
//!
//! [`MetadataAccessor`] turns the raw primitives of a [`MetadataHost`] into resolved records
//! ([`AssemblyInfo`], [`ModuleInfo`], [`TypeInfo`], [`FunctionInfo`]) and lazy token
//! enumerations.
//!
//! Every resolver comes in two flavours. The `try_*` variant reports the precise failure as an
//! [`Error`]; the plain variant logs that failure at debug level and returns `None`. Profiler
//! callbacks use the plain variants: a lookup that fails for one module must never affect any
//! other module.
//!
//! # Examples
//!
//! ```rust,ignore
//! use dotprobe::metadata::accessor::MetadataAccessor;
//!
//! let accessor = MetadataAccessor::new(&host, module_id);
//! if let Some(token) = accessor.find_assembly_reference_by_name("System.Net.Http") {
//!     println!("System.Net.Http is referenced as {}", token);
//! }
//! for type_def in accessor.type_defs() {
//!     if let Some(info) = accessor.resolve_type(type_def) {
//!         println!("{}", info.name);
//!     }
//! }
//! ```

use std::fmt;

use log::debug;

use crate::{
    host::{
        decode_name, enumerator::PagedEnum, AssemblyId, EnumHandle, HostResult, MetadataHost,
        ModuleId, PageFill,
    },
    integrations::SignatureBlob,
    metadata::{
        info::{AssemblyInfo, FunctionInfo, ModuleInfo, TypeInfo},
        methodspec,
        token::{Token, TokenKind},
    },
    Error, Result,
};

/// Resolves tokens of one module through the host.
///
/// The accessor is a cheap pair of a host reference and a module id; create one per
/// callback rather than storing it.
pub struct MetadataAccessor<'h, H: MetadataHost + ?Sized> {
    host: &'h H,
    module: ModuleId,
}

impl<'h, H: MetadataHost + ?Sized> MetadataAccessor<'h, H> {
    /// Creates an accessor for `module`
    pub fn new(host: &'h H, module: ModuleId) -> Self {
        MetadataAccessor { host, module }
    }

    /// The module this accessor is bound to
    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    /// The host this accessor queries
    #[must_use]
    pub fn host(&self) -> &'h H {
        self.host
    }

    // ---------------------------------------------------------------------------------------
    // Enumerations
    // ---------------------------------------------------------------------------------------

    /// All `TypeDef` tokens of the module
    pub fn type_defs(&self) -> PagedEnum<'h, Token> {
        let (host, module) = (self.host, self.module);
        self.paged(move |handle, out| host.enum_type_defs(module, handle, out))
    }

    /// All `TypeRef` tokens of the module
    pub fn type_refs(&self) -> PagedEnum<'h, Token> {
        let (host, module) = (self.host, self.module);
        self.paged(move |handle, out| host.enum_type_refs(module, handle, out))
    }

    /// The `MethodDef` tokens declared by the type `parent`
    pub fn methods(&self, parent: Token) -> PagedEnum<'h, Token> {
        let (host, module) = (self.host, self.module);
        self.paged(move |handle, out| host.enum_methods(module, parent, handle, out))
    }

    /// The `MemberRef` tokens whose parent is `parent`
    pub fn member_refs(&self, parent: Token) -> PagedEnum<'h, Token> {
        let (host, module) = (self.host, self.module);
        self.paged(move |handle, out| host.enum_member_refs(module, parent, handle, out))
    }

    /// All `ModuleRef` tokens of the module
    pub fn module_refs(&self) -> PagedEnum<'h, Token> {
        let (host, module) = (self.host, self.module);
        self.paged(move |handle, out| host.enum_module_refs(module, handle, out))
    }

    /// All `AssemblyRef` tokens of the module
    pub fn assembly_refs(&self) -> PagedEnum<'h, Token> {
        let (host, module) = (self.host, self.module);
        self.paged(move |handle, out| host.enum_assembly_refs(module, handle, out))
    }

    fn paged<F>(&self, fill: F) -> PagedEnum<'h, Token>
    where
        F: FnMut(&mut EnumHandle, &mut [Token]) -> HostResult<PageFill> + 'h,
    {
        let (host, module) = (self.host, self.module);
        PagedEnum::new(fill, move |handle| host.close_enum(module, handle))
    }

    // ---------------------------------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------------------------------

    /// Resolves a loaded assembly, `None` if the host does not know it
    pub fn resolve_assembly(&self, assembly: AssemblyId) -> Option<AssemblyInfo> {
        logged("assembly", assembly, self.try_resolve_assembly(assembly))
    }

    /// Resolves a loaded assembly
    ///
    /// # Errors
    /// Returns [`Error::NullHandle`] for the null handle and [`Error::Host`] if the host fails
    pub fn try_resolve_assembly(&self, assembly: AssemblyId) -> Result<AssemblyInfo> {
        if assembly.is_null() {
            return Err(Error::NullHandle("assembly"));
        }

        let props = self.host.assembly_props(assembly)?;
        Ok(AssemblyInfo {
            id: assembly,
            name: decode_name(&props.name),
        })
    }

    /// Resolves a loaded module and its assembly, `None` if either is unknown
    pub fn resolve_module(&self, module: ModuleId) -> Option<ModuleInfo> {
        logged("module", module, self.try_resolve_module(module))
    }

    /// Resolves a loaded module and its assembly
    ///
    /// # Errors
    /// Returns [`Error::NullHandle`] for a null module or assembly handle and [`Error::Host`] if
    /// the host fails
    pub fn try_resolve_module(&self, module: ModuleId) -> Result<ModuleInfo> {
        if module.is_null() {
            return Err(Error::NullHandle("module"));
        }

        let props = self.host.module_props(module)?;
        let assembly = self.try_resolve_assembly(props.assembly)?;
        Ok(ModuleInfo {
            id: module,
            path: decode_name(&props.path),
            assembly,
            flags: props.flags,
        })
    }

    /// Resolves a `TypeDef` or `TypeRef`, `None` for any other token or on failure
    pub fn resolve_type(&self, token: Token) -> Option<TypeInfo> {
        logged("type", token, self.try_resolve_type(token))
    }

    /// Resolves a `TypeDef` or `TypeRef`
    ///
    /// # Errors
    /// Returns [`Error::InvalidToken`] for the null token, [`Error::UnexpectedTokenKind`] for
    /// tokens of other tables, and [`Error::Host`] if the host fails
    pub fn try_resolve_type(&self, token: Token) -> Result<TypeInfo> {
        if token.is_null() {
            return Err(Error::InvalidToken(token));
        }

        match token.kind() {
            Some(TokenKind::TypeDef | TokenKind::TypeRef) => {
                let name = self.host.type_props(self.module, token)?;
                Ok(TypeInfo {
                    id: token,
                    name: decode_name(&name),
                })
            }
            _ => Err(Error::UnexpectedTokenKind {
                token,
                expected: "TypeDef or TypeRef",
            }),
        }
    }

    /// Resolves a `MethodDef`, `MemberRef` or `MethodSpec`, `None` for any other token or on
    /// failure
    pub fn resolve_function(&self, token: Token) -> Option<FunctionInfo> {
        logged("function", token, self.try_resolve_function(token))
    }

    /// Resolves a `MethodDef`, `MemberRef` or `MethodSpec`.
    ///
    /// A `MethodSpec` resolves to the name and declaring type of the generic method it
    /// instantiates, with the instantiation blob as its signature. A declaring type that cannot
    /// be resolved, e.g. a `TypeSpec`, leaves [`FunctionInfo::type_info`] empty.
    ///
    /// # Errors
    /// Returns [`Error::InvalidToken`] for the null token, [`Error::UnexpectedTokenKind`] for
    /// tokens of other tables, and [`Error::Host`] if the host fails
    pub fn try_resolve_function(&self, token: Token) -> Result<FunctionInfo> {
        if token.is_null() {
            return Err(Error::InvalidToken(token));
        }

        match token.kind() {
            Some(TokenKind::MethodDef | TokenKind::MemberRef) => {
                let props = self.host.member_props(self.module, token)?;
                Ok(FunctionInfo {
                    id: token,
                    name: decode_name(&props.name),
                    type_info: self.resolve_type(props.parent),
                    signature: SignatureBlob::new(props.signature),
                })
            }
            Some(TokenKind::MethodSpec) => {
                let spec = self.host.method_spec_props(self.module, token)?;
                if spec.method.is_kind(TokenKind::MethodSpec) {
                    // A MethodSpec never instantiates another MethodSpec
                    return Err(Error::UnexpectedTokenKind {
                        token: spec.method,
                        expected: "MethodDef or MemberRef",
                    });
                }

                let generic = self.try_resolve_function(spec.method)?;
                Ok(FunctionInfo {
                    id: token,
                    name: generic.name,
                    type_info: generic.type_info,
                    signature: SignatureBlob::new(spec.instantiation),
                })
            }
            _ => Err(Error::UnexpectedTokenKind {
                token,
                expected: "MethodDef, MemberRef or MethodSpec",
            }),
        }
    }

    /// Name of the assembly owning this module, `None` on failure
    pub fn assembly_name(&self) -> Option<String> {
        logged("assembly name of module", self.module, self.try_assembly_name())
    }

    /// Name of the assembly owning this module
    ///
    /// # Errors
    /// Returns [`Error::Host`] if the host fails
    pub fn try_assembly_name(&self) -> Result<String> {
        let name = self.host.module_assembly_name(self.module)?;
        Ok(decode_name(&name))
    }

    /// Finds the `AssemblyRef` of this module referencing the assembly called `name`.
    ///
    /// Names are compared case-sensitively. References whose name cannot be read are skipped.
    /// The enumeration stops at the first match.
    pub fn find_assembly_reference_by_name(&self, name: &str) -> Option<Token> {
        self.assembly_refs().find(|&token| {
            match self.host.assembly_ref_props(self.module, token) {
                Ok(reference) => decode_name(&reference) == name,
                Err(error) => {
                    debug!("Skipping assembly reference {}: {}", token, error);
                    false
                }
            }
        })
    }

    // ---------------------------------------------------------------------------------------
    // Emission
    // ---------------------------------------------------------------------------------------

    /// Mints a `MethodSpec` token instantiating the generic method `method`.
    ///
    /// See [`methodspec::define_method_spec`].
    ///
    /// # Errors
    /// See [`methodspec::define_method_spec`]
    pub fn define_method_spec(&self, method: Token, instantiation: &SignatureBlob) -> Result<Token> {
        methodspec::define_method_spec(self.host, self.module, method, instantiation)
    }
}

fn logged<T>(what: &str, subject: impl fmt::Display, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            debug!("Failed to resolve {} {}: {}", what, subject, error);
            None
        }
    }
}
