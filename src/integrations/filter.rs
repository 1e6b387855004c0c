//! Narrowing the global integration set to the rules applicable to one module.
//!
//! Each pass is a pure function: it borrows the input, returns a new vector, and keeps the
//! relative order of whatever survives. The passes can be combined freely; [`filter_for_module`]
//! applies them in the canonical order `name`, `caller`, `target`.
//!
//! The caller and target passes work on individual replacements. An integration whose last
//! replacement is removed is dropped as a whole, and so is one that had no replacements to
//! begin with.

use std::collections::HashSet;

use crate::{
    host::MetadataHost,
    integrations::{Integration, MethodReplacement},
    metadata::accessor::MetadataAccessor,
};

/// Answers whether a module references an assembly.
///
/// [`MetadataAccessor`] implements this by scanning the module's `AssemblyRef` table. A
/// `HashSet` of names can stand in when the references are already known.
pub trait AssemblyReferences {
    /// Returns true if the module references the assembly with the simple name `name`
    fn references_assembly(&self, name: &str) -> bool;
}

impl AssemblyReferences for HashSet<String> {
    fn references_assembly(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<H: MetadataHost + ?Sized> AssemblyReferences for MetadataAccessor<'_, H> {
    fn references_assembly(&self, name: &str) -> bool {
        self.find_assembly_reference_by_name(name).is_some()
    }
}

/// Removes the integrations whose names are in `excluded`
#[must_use]
pub fn filter_by_name(integrations: &[Integration], excluded: &HashSet<String>) -> Vec<Integration> {
    integrations
        .iter()
        .filter(|integration| !excluded.contains(integration.name()))
        .cloned()
        .collect()
}

/// Keeps the replacements whose caller may live in the assembly `assembly_name`.
///
/// A replacement survives if its caller has no assembly constraint or names `assembly_name`.
#[must_use]
pub fn filter_by_caller(integrations: &[Integration], assembly_name: &str) -> Vec<Integration> {
    retain_replacements(integrations, |replacement| {
        replacement.caller().matches_assembly(assembly_name)
    })
}

/// Keeps the replacements whose target can be called from the assembly `assembly_name`.
///
/// A replacement survives if its target has no assembly constraint, lives in `assembly_name`
/// itself, or lives in an assembly `references` knows about.
#[must_use]
pub fn filter_by_target<R>(
    integrations: &[Integration],
    references: &R,
    assembly_name: &str,
) -> Vec<Integration>
where
    R: AssemblyReferences + ?Sized,
{
    retain_replacements(integrations, |replacement| {
        let target = replacement.target().assembly();
        target.is_empty() || target == assembly_name || references.references_assembly(target)
    })
}

/// Applies the name, caller and target passes for the module bound to `accessor`.
///
/// Returns `None` if the name of the module's assembly cannot be resolved.
pub fn filter_for_module<H>(
    integrations: &[Integration],
    disabled: &HashSet<String>,
    accessor: &MetadataAccessor<'_, H>,
) -> Option<Vec<Integration>>
where
    H: MetadataHost + ?Sized,
{
    let assembly_name = accessor.assembly_name()?;

    let enabled = filter_by_name(integrations, disabled);
    let by_caller = filter_by_caller(&enabled, &assembly_name);
    Some(filter_by_target(&by_caller, accessor, &assembly_name))
}

fn retain_replacements<F>(integrations: &[Integration], mut keep: F) -> Vec<Integration>
where
    F: FnMut(&MethodReplacement) -> bool,
{
    integrations
        .iter()
        .filter_map(|integration| integration.retain_replacements(&mut keep))
        .collect()
}
