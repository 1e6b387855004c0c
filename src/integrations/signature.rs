//! Opaque signature blobs.
//!
//! Rule files pin methods to a signature, either as an array of byte values or as a hex
//! string. The bytes are an ECMA-335 signature blob (Partition II, Section 23.2), but this crate
//! never interprets them: they are compared, displayed, and handed to the host verbatim.

use std::fmt::{self, Write as _};

use serde::{Serialize, Serializer};

/// An ordered sequence of signature bytes.
///
/// An empty blob matches any signature when used in a [`crate::integrations::MethodReference`].
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct SignatureBlob(Vec<u8>);

impl SignatureBlob {
    /// Creates a blob from raw bytes
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        SignatureBlob(bytes)
    }

    /// Decodes a hex string, skipping every character that is not a hex digit.
    ///
    /// Valid digits are paired left to right into bytes, the first digit of a pair being the
    /// high nibble. A trailing digit without a partner is dropped. Decoding never fails, so
    /// separators such as spaces, `:` or `-` are allowed anywhere.
    ///
    /// ## Arguments
    /// * 'text' - The hex text to decode
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotprobe::integrations::SignatureBlob;
    ///
    /// assert_eq!(SignatureBlob::from_hex_lenient("DEAD").as_bytes(), &[0xDE, 0xAD]);
    /// assert_eq!(SignatureBlob::from_hex_lenient("de:ad").as_bytes(), &[0xDE, 0xAD]);
    /// assert_eq!(SignatureBlob::from_hex_lenient("ABC").as_bytes(), &[0xAB]);
    /// ```
    #[must_use]
    pub fn from_hex_lenient(text: &str) -> Self {
        let mut bytes = Vec::with_capacity(text.len() / 2);
        let mut high: Option<u8> = None;

        for nibble in text.chars().filter_map(|c| c.to_digit(16)) {
            // to_digit(16) is at most 15
            let nibble = nibble as u8;
            match high.take() {
                Some(h) => bytes.push((h << 4) | nibble),
                None => high = Some(nibble),
            }
        }

        SignatureBlob(bytes)
    }

    /// Returns the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns true if the blob holds no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of bytes in the blob
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Formats the blob as upper case hex without separators
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 2);
        for byte in &self.0 {
            // Writing to a String cannot fail
            let _ = write!(out, "{:02X}", byte);
        }
        out
    }
}

impl From<Vec<u8>> for SignatureBlob {
    fn from(bytes: Vec<u8>) -> Self {
        SignatureBlob(bytes)
    }
}

impl From<&[u8]> for SignatureBlob {
    fn from(bytes: &[u8]) -> Self {
        SignatureBlob(bytes.to_vec())
    }
}

impl AsRef<[u8]> for SignatureBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SignatureBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBlob({})", self.to_hex())
    }
}

impl fmt::Display for SignatureBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for SignatureBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
