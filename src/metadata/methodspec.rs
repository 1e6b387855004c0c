//! Minting `MethodSpec` tokens for generic call targets.
//!
//! When a selected target or wrapper is a generic method, rewritten code cannot call the
//! `MethodDef` or `MemberRef` directly: it needs a `MethodSpec` row pairing the generic method
//! with its type arguments (ECMA-335 Partition II, Section 22.29). The host emits that row; this
//! module validates the request and the answer.

use log::debug;

use crate::{
    host::{MetadataHost, ModuleId},
    integrations::SignatureBlob,
    metadata::token::{Token, TokenKind},
    Error, Result,
};

/// Asks the host to define a `MethodSpec` instantiating `method` with `instantiation`.
///
/// A failure abandons the one call-site substitution that needed the token; it is reported to
/// the caller and has no further effect.
///
/// ## Arguments
/// * 'host' - The host owning the module's metadata
/// * 'module' - The module to emit into
/// * 'method' - The generic method, a `MethodDef` or `MemberRef` token
/// * 'instantiation' - A `GENERICINST` signature listing the type arguments
///
/// # Errors
/// Returns [`Error::UnexpectedTokenKind`] if `method` is not a `MethodDef` or `MemberRef`, and
/// [`Error::EmptySignature`] if `instantiation` is empty; the host is not called in either
/// case. Returns [`Error::Host`] if the host rejects the emission, and [`Error::InvalidToken`]
/// if it answers with something other than a `MethodSpec` token.
pub fn define_method_spec<H: MetadataHost + ?Sized>(
    host: &H,
    module: ModuleId,
    method: Token,
    instantiation: &SignatureBlob,
) -> Result<Token> {
    if !(method.is_kind(TokenKind::MethodDef) || method.is_kind(TokenKind::MemberRef)) {
        return Err(Error::UnexpectedTokenKind {
            token: method,
            expected: "MethodDef or MemberRef",
        });
    }

    if instantiation.is_empty() {
        return Err(Error::EmptySignature);
    }

    let token = host.define_method_spec(module, method, instantiation.as_bytes())?;
    if token.is_null() || !token.is_kind(TokenKind::MethodSpec) {
        return Err(Error::InvalidToken(token));
    }

    debug!(
        "Defined MethodSpec {} for {} <{}> in module {}",
        token, method, instantiation, module
    );
    Ok(token)
}
