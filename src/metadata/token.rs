use std::fmt;

use strum::{Display, EnumIter, FromRepr};

/// A metadata token, scoped to the module whose metadata it was read from.
///
/// The high byte selects the metadata table and the low 24 bits the 1-based row in it
/// (ECMA-335 Partition III, Section 1.9). Row `0` of any table, and in particular the all-zero
/// token, never names an entity; the resolvers of this crate report such lookups as `None`
/// instead of passing the zero token along.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// The null token
    pub const NULL: Token = Token(0);

    /// Creates a token for `row` in the table identified by `kind`
    #[must_use]
    pub fn from_parts(kind: TokenKind, row: u32) -> Self {
        Token(((kind as u32) << 24) | (row & 0x00FF_FFFF))
    }

    /// The raw value as handed to and from the host
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Table identifier in the high byte
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// 1-based row in the low 24 bits
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true for the all-zero token
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns the table kind of this token, if it is one this crate knows about
    #[must_use]
    pub fn kind(&self) -> Option<TokenKind> {
        TokenKind::from_repr(self.table())
    }

    /// Returns true if the token belongs to the table identified by `kind`
    #[must_use]
    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.table() == kind as u8
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "Token({}#{})", kind, self.row()),
            None => write!(f, "Token(0x{:08x})", self.0),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// The metadata tables a token can point into that this crate dispatches on.
///
/// The discriminants are the table identifiers stored in the high byte of a [`Token`]
/// (ECMA-335 Partition II, Section 22).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumIter, FromRepr)]
#[repr(u8)]
pub enum TokenKind {
    /// `TypeRef` (0x01) - a type defined in another assembly
    TypeRef = 0x01,
    /// `TypeDef` (0x02) - a type defined in this module
    TypeDef = 0x02,
    /// `MethodDef` (0x06) - a method defined in this module
    MethodDef = 0x06,
    /// `MemberRef` (0x0A) - a method or field defined elsewhere
    MemberRef = 0x0A,
    /// `ModuleRef` (0x1A) - a module referenced by this module
    ModuleRef = 0x1A,
    /// `TypeSpec` (0x1B) - a constructed type, e.g. a generic instantiation
    TypeSpec = 0x1B,
    /// `Assembly` (0x20) - the assembly owning this module
    Assembly = 0x20,
    /// `AssemblyRef` (0x23) - an assembly referenced by this module
    AssemblyRef = 0x23,
    /// `MethodSpec` (0x2B) - an instantiation of a generic method
    MethodSpec = 0x2B,
}
