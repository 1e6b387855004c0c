use serde::Serialize;

use crate::{integrations::SignatureBlob, Error, Result};

/// Identifies a method by assembly, type, name and signature.
///
/// Every empty field is a wildcard: `MethodReference::default()` matches any method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct MethodReference {
    assembly: String,
    #[serde(rename = "type")]
    type_name: String,
    method: String,
    signature: SignatureBlob,
}

impl MethodReference {
    /// Creates a new method reference
    ///
    /// ## Arguments
    /// * 'assembly' - Simple name of the declaring assembly, empty for any
    /// * 'type_name' - Full name of the declaring type, empty for any
    /// * 'method' - Method name, empty for any
    /// * 'signature' - Signature blob, empty for any
    pub fn new(
        assembly: impl Into<String>,
        type_name: impl Into<String>,
        method: impl Into<String>,
        signature: SignatureBlob,
    ) -> Self {
        MethodReference {
            assembly: assembly.into(),
            type_name: type_name.into(),
            method: method.into(),
            signature,
        }
    }

    /// Simple name of the declaring assembly
    #[must_use]
    pub fn assembly(&self) -> &str {
        &self.assembly
    }

    /// Full name of the declaring type
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Method name
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Signature blob
    #[must_use]
    pub fn signature(&self) -> &SignatureBlob {
        &self.signature
    }

    /// Returns true if every field is a wildcard
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.assembly.is_empty()
            && self.type_name.is_empty()
            && self.method.is_empty()
            && self.signature.is_empty()
    }

    /// Returns true if the assembly constraint is empty or equal to `name`
    #[must_use]
    pub fn matches_assembly(&self, name: &str) -> bool {
        self.assembly.is_empty() || self.assembly == name
    }

    /// Returns true if the type constraint is empty or equal to `name`
    #[must_use]
    pub fn matches_type(&self, name: &str) -> bool {
        self.type_name.is_empty() || self.type_name == name
    }

    /// Returns true if the method constraint is empty or equal to `name`
    #[must_use]
    pub fn matches_method(&self, name: &str) -> bool {
        self.method.is_empty() || self.method == name
    }
}

/// A call-site substitution: calls to `target` made from within `caller` are redirected to
/// `wrapper`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct MethodReplacement {
    caller: MethodReference,
    target: MethodReference,
    wrapper: MethodReference,
}

impl MethodReplacement {
    /// Creates a new method replacement
    #[must_use]
    pub fn new(caller: MethodReference, target: MethodReference, wrapper: MethodReference) -> Self {
        MethodReplacement {
            caller,
            target,
            wrapper,
        }
    }

    /// The methods whose bodies are rewritten
    #[must_use]
    pub fn caller(&self) -> &MethodReference {
        &self.caller
    }

    /// The callee being intercepted
    #[must_use]
    pub fn target(&self) -> &MethodReference {
        &self.target
    }

    /// The method the call is redirected to
    #[must_use]
    pub fn wrapper(&self) -> &MethodReference {
        &self.wrapper
    }
}

/// A named bundle of method replacements that is enabled or disabled as a unit.
///
/// The name is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Integration {
    name: String,
    method_replacements: Vec<MethodReplacement>,
}

impl Integration {
    /// Creates a new integration
    ///
    /// ## Arguments
    /// * 'name' - Name of the integration, must not be empty
    /// * 'method_replacements' - The replacements, in rule file order
    ///
    /// # Errors
    /// Returns [`Error::InvalidIntegration`] if `name` is empty
    pub fn new(
        name: impl Into<String>,
        method_replacements: Vec<MethodReplacement>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidIntegration(
                "integration name must not be empty".to_string(),
            ));
        }

        Ok(Integration {
            name,
            method_replacements,
        })
    }

    /// Name of the integration
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The replacements of this integration, in rule file order
    #[must_use]
    pub fn method_replacements(&self) -> &[MethodReplacement] {
        &self.method_replacements
    }

    /// Returns a copy of this integration holding only the replacements accepted by `keep`.
    ///
    /// Returns `None` if no replacement is left.
    pub(crate) fn retain_replacements<F>(&self, mut keep: F) -> Option<Integration>
    where
        F: FnMut(&MethodReplacement) -> bool,
    {
        let method_replacements: Vec<MethodReplacement> = self
            .method_replacements
            .iter()
            .filter(|replacement| keep(replacement))
            .cloned()
            .collect();

        if method_replacements.is_empty() {
            return None;
        }

        Some(Integration {
            name: self.name.clone(),
            method_replacements,
        })
    }
}
