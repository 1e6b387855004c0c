//! In-memory metadata host

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
};

use widestring::U16String;

use crate::{
    host::{
        AssemblyId, AssemblyProps, EnumHandle, HostError, HostResult, MemberProps, MetadataHost,
        MethodSpecProps, ModuleId, ModuleProps, PageFill,
    },
    metadata::{
        info::ModuleFlags,
        token::{Token, TokenKind},
    },
};

struct FakeMember {
    parent: Token,
    token: Token,
    name: String,
    signature: Vec<u8>,
}

struct FakeMethodSpec {
    token: Token,
    method: Token,
    instantiation: Vec<u8>,
}

struct FakeModule {
    name: String,
    assembly: AssemblyId,
    flags: ModuleFlags,
    assembly_refs: Vec<String>,
    module_refs: Vec<Token>,
    types: Vec<(Token, String)>,
    members: Vec<FakeMember>,
    method_specs: Vec<FakeMethodSpec>,
}

/// A [`MetadataHost`] backed by plain collections.
///
/// Modules are registered with [`FakeHost::add_module`]; every module is its own assembly.
/// Enumeration handles encode the cursor, so the host keeps no per-enumeration state apart from
/// the counters exposed for assertions.
pub struct FakeHost {
    modules: RefCell<HashMap<ModuleId, FakeModule>>,
    assemblies: RefCell<HashMap<AssemblyId, String>>,
    failing: RefCell<HashSet<&'static str>>,
    page_size: Cell<usize>,
    open: Cell<usize>,
    closes: Cell<usize>,
    fills: Cell<usize>,
    emitted: Cell<usize>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        FakeHost {
            modules: RefCell::new(HashMap::new()),
            assemblies: RefCell::new(HashMap::new()),
            failing: RefCell::new(HashSet::new()),
            page_size: Cell::new(256),
            open: Cell::new(0),
            closes: Cell::new(0),
            fills: Cell::new(0),
            emitted: Cell::new(0),
        }
    }

    /// Registers a module loaded from `/app/{name}.dll` whose assembly is called `name`.
    ///
    /// `assembly_refs` become `AssemblyRef` rows 1..=n, in order.
    pub fn add_module(&self, id: ModuleId, name: &str, assembly_refs: &[&str]) {
        let assembly = AssemblyId(0x1000 + id.0);
        self.assemblies
            .borrow_mut()
            .insert(assembly, name.to_string());
        self.modules.borrow_mut().insert(
            id,
            FakeModule {
                name: name.to_string(),
                assembly,
                flags: ModuleFlags::ON_DISK,
                assembly_refs: assembly_refs.iter().map(|r| (*r).to_string()).collect(),
                module_refs: Vec::new(),
                types: Vec::new(),
                members: Vec::new(),
                method_specs: Vec::new(),
            },
        );
    }

    pub fn set_flags(&self, module: ModuleId, flags: ModuleFlags) {
        self.edit(module, |m| m.flags = flags);
    }

    pub fn add_type(&self, module: ModuleId, token: Token, name: &str) {
        self.edit(module, |m| m.types.push((token, name.to_string())));
    }

    pub fn add_member(
        &self,
        module: ModuleId,
        parent: Token,
        token: Token,
        name: &str,
        signature: &[u8],
    ) {
        self.edit(module, |m| {
            m.members.push(FakeMember {
                parent,
                token,
                name: name.to_string(),
                signature: signature.to_vec(),
            })
        });
    }

    pub fn add_method_spec(&self, module: ModuleId, token: Token, method: Token, instantiation: &[u8]) {
        self.edit(module, |m| {
            m.method_specs.push(FakeMethodSpec {
                token,
                method,
                instantiation: instantiation.to_vec(),
            })
        });
    }

    pub fn add_module_ref(&self, module: ModuleId, token: Token) {
        self.edit(module, |m| m.module_refs.push(token));
    }

    /// Makes every later call of the host operation `operation` fail with `E_FAIL`
    pub fn fail(&self, operation: &'static str) {
        self.failing.borrow_mut().insert(operation);
    }

    /// Caps the number of tokens handed out per page
    pub fn set_page_size(&self, page_size: usize) {
        self.page_size.set(page_size);
    }

    /// Enumerations that were started and not yet closed
    pub fn open_enums(&self) -> usize {
        self.open.get()
    }

    /// Calls of `close_enum`, including those with a null handle
    pub fn closes(&self) -> usize {
        self.closes.get()
    }

    /// Calls of any `enum_*` primitive
    pub fn fills(&self) -> usize {
        self.fills.get()
    }

    /// Successful `define_method_spec` calls
    pub fn emitted(&self) -> usize {
        self.emitted.get()
    }

    fn edit(&self, module: ModuleId, f: impl FnOnce(&mut FakeModule)) {
        let mut modules = self.modules.borrow_mut();
        let module = modules.get_mut(&module).expect("module must be added first");
        f(module);
    }

    fn check(&self, operation: &'static str) -> HostResult<()> {
        if self.failing.borrow().contains(operation) {
            return Err(HostError::new(operation, HostError::E_FAIL));
        }
        Ok(())
    }

    fn with_module<T>(
        &self,
        operation: &'static str,
        module: ModuleId,
        f: impl FnOnce(&FakeModule) -> HostResult<T>,
    ) -> HostResult<T> {
        self.check(operation)?;
        match self.modules.borrow().get(&module) {
            Some(module) => f(module),
            None => Err(HostError::new(operation, HostError::RECORD_NOT_FOUND)),
        }
    }

    fn page(
        &self,
        operation: &'static str,
        module: ModuleId,
        handle: &mut EnumHandle,
        out: &mut [Token],
        items: impl FnOnce(&FakeModule) -> Vec<Token>,
    ) -> HostResult<PageFill> {
        self.fills.set(self.fills.get() + 1);
        let items = self.with_module(operation, module, |m| Ok(items(m)))?;

        if handle.is_null() {
            self.open.set(self.open.get() + 1);
            *handle = EnumHandle(1);
        }

        let cursor = handle.0 - 1;
        let remaining = items.get(cursor..).unwrap_or(&[]);
        if remaining.is_empty() {
            return Ok(PageFill::Done);
        }

        let count = remaining.len().min(out.len()).min(self.page_size.get());
        out[..count].copy_from_slice(&remaining[..count]);
        *handle = EnumHandle(cursor + count + 1);
        Ok(PageFill::Items(count))
    }
}

fn not_found(operation: &'static str) -> HostError {
    HostError::new(operation, HostError::RECORD_NOT_FOUND)
}

fn types_of(module: &FakeModule, kind: TokenKind) -> Vec<Token> {
    module
        .types
        .iter()
        .map(|(token, _)| *token)
        .filter(|token| token.is_kind(kind))
        .collect()
}

fn members_of(module: &FakeModule, parent: Token, kind: TokenKind) -> Vec<Token> {
    module
        .members
        .iter()
        .filter(|member| member.parent == parent && member.token.is_kind(kind))
        .map(|member| member.token)
        .collect()
}

impl MetadataHost for FakeHost {
    fn enum_type_defs(
        &self,
        module: ModuleId,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill> {
        self.page("enum_type_defs", module, handle, out, |m| {
            types_of(m, TokenKind::TypeDef)
        })
    }

    fn enum_type_refs(
        &self,
        module: ModuleId,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill> {
        self.page("enum_type_refs", module, handle, out, |m| {
            types_of(m, TokenKind::TypeRef)
        })
    }

    fn enum_methods(
        &self,
        module: ModuleId,
        parent: Token,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill> {
        self.page("enum_methods", module, handle, out, |m| {
            members_of(m, parent, TokenKind::MethodDef)
        })
    }

    fn enum_member_refs(
        &self,
        module: ModuleId,
        parent: Token,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill> {
        self.page("enum_member_refs", module, handle, out, |m| {
            members_of(m, parent, TokenKind::MemberRef)
        })
    }

    fn enum_module_refs(
        &self,
        module: ModuleId,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill> {
        self.page("enum_module_refs", module, handle, out, |m| {
            m.module_refs.clone()
        })
    }

    fn enum_assembly_refs(
        &self,
        module: ModuleId,
        handle: &mut EnumHandle,
        out: &mut [Token],
    ) -> HostResult<PageFill> {
        self.page("enum_assembly_refs", module, handle, out, |m| {
            (1..=m.assembly_refs.len() as u32)
                .map(|row| Token::from_parts(TokenKind::AssemblyRef, row))
                .collect()
        })
    }

    fn close_enum(&self, _module: ModuleId, handle: EnumHandle) {
        self.closes.set(self.closes.get() + 1);
        if !handle.is_null() {
            self.open.set(self.open.get() - 1);
        }
    }

    fn assembly_props(&self, assembly: AssemblyId) -> HostResult<AssemblyProps> {
        self.check("assembly_props")?;
        self.assemblies
            .borrow()
            .get(&assembly)
            .map(|name| AssemblyProps {
                name: U16String::from_str(name),
            })
            .ok_or_else(|| not_found("assembly_props"))
    }

    fn module_props(&self, module: ModuleId) -> HostResult<ModuleProps> {
        self.with_module("module_props", module, |m| {
            Ok(ModuleProps {
                path: U16String::from_str(&format!("/app/{}.dll", m.name)),
                assembly: m.assembly,
                flags: m.flags,
            })
        })
    }

    fn module_assembly_name(&self, module: ModuleId) -> HostResult<U16String> {
        self.with_module("module_assembly_name", module, |m| {
            Ok(U16String::from_str(&m.name))
        })
    }

    fn assembly_ref_props(&self, module: ModuleId, token: Token) -> HostResult<U16String> {
        self.with_module("assembly_ref_props", module, |m| {
            if !token.is_kind(TokenKind::AssemblyRef) || token.row() == 0 {
                return Err(not_found("assembly_ref_props"));
            }
            m.assembly_refs
                .get(token.row() as usize - 1)
                .map(|name| U16String::from_str(name))
                .ok_or_else(|| not_found("assembly_ref_props"))
        })
    }

    fn type_props(&self, module: ModuleId, token: Token) -> HostResult<U16String> {
        self.with_module("type_props", module, |m| {
            m.types
                .iter()
                .find(|(candidate, _)| *candidate == token)
                .map(|(_, name)| U16String::from_str(name))
                .ok_or_else(|| not_found("type_props"))
        })
    }

    fn member_props(&self, module: ModuleId, token: Token) -> HostResult<MemberProps> {
        self.with_module("member_props", module, |m| {
            m.members
                .iter()
                .find(|member| member.token == token)
                .map(|member| MemberProps {
                    parent: member.parent,
                    name: U16String::from_str(&member.name),
                    signature: member.signature.clone(),
                })
                .ok_or_else(|| not_found("member_props"))
        })
    }

    fn method_spec_props(&self, module: ModuleId, token: Token) -> HostResult<MethodSpecProps> {
        self.with_module("method_spec_props", module, |m| {
            m.method_specs
                .iter()
                .find(|spec| spec.token == token)
                .map(|spec| MethodSpecProps {
                    method: spec.method,
                    instantiation: spec.instantiation.clone(),
                })
                .ok_or_else(|| not_found("method_spec_props"))
        })
    }

    fn define_method_spec(
        &self,
        module: ModuleId,
        method: Token,
        instantiation: &[u8],
    ) -> HostResult<Token> {
        self.check("define_method_spec")?;
        let mut modules = self.modules.borrow_mut();
        let m = modules
            .get_mut(&module)
            .ok_or_else(|| not_found("define_method_spec"))?;

        let token = Token::from_parts(TokenKind::MethodSpec, m.method_specs.len() as u32 + 1);
        m.method_specs.push(FakeMethodSpec {
            token,
            method,
            instantiation: instantiation.to_vec(),
        });
        self.emitted.set(self.emitted.get() + 1);
        Ok(token)
    }
}
