// crates/hongd-core/src/core/name.rs
// ============================================================================
// Module: HONGD Name Codec
// Description: Fixed-width GDP names and their printable and hex forms.
// Purpose: Provide pure, allocation-light conversions with strict validation.
// Dependencies: base64, serde
// ============================================================================

//! ## Overview
//! A GDP name is a 32-byte opaque identifier. Its printable form is the
//! 43-character unpadded base64url encoding and its hex form is 64 lowercase
//! hex characters. The all-zero value is the "unset" sentinel.
//!
//! Decoding is strict: non-canonical trailing bits are rejected so that
//! every printable name maps to exactly one internal name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::core::error::NameError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Byte length of an internal GDP name.
pub const GDP_NAME_LEN: usize = 32;

/// Character length of a printable (base64url) GDP name.
pub const GDP_PNAME_LEN: usize = 43;

/// Character length of a hex-encoded GDP name.
pub const GDP_HEX_NAME_LEN: usize = 2 * GDP_NAME_LEN;

/// Lowercase hex alphabet.
const HEX: &[u8; 16] = b"0123456789abcdef";

// ============================================================================
// SECTION: GDP Name
// ============================================================================

/// Fixed-width internal GDP name.
///
/// # Invariants
/// - Always exactly [`GDP_NAME_LEN`] bytes.
/// - The all-zero value is the invalid sentinel; see [`GdpName::is_valid`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GdpName([u8; GDP_NAME_LEN]);

impl GdpName {
    /// The all-zero "unset" sentinel.
    pub const INVALID: Self = Self([0; GDP_NAME_LEN]);

    /// Wraps raw name bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; GDP_NAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds a name from a slice, returning `None` when the length is wrong.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; GDP_NAME_LEN]>::try_from(bytes).ok().map(Self)
    }

    /// Returns the raw name bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; GDP_NAME_LEN] {
        &self.0
    }

    /// Returns true unless this is the all-zero sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_valid(self)
    }

    /// Returns the printable (base64url) form.
    #[must_use]
    pub fn to_printable(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Returns the lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        to_hex(self)
    }

    /// Returns the sharded on-disk file root, `_xx/<printable>`, where `xx`
    /// is the hex value of the first name byte.
    #[must_use]
    pub fn file_name_root(&self) -> String {
        let first = self.0[0];
        let mut out = String::with_capacity(4 + GDP_PNAME_LEN);
        out.push('_');
        out.push(char::from(HEX[usize::from(first >> 4)]));
        out.push(char::from(HEX[usize::from(first & 0x0f)]));
        out.push('/');
        out.push_str(&self.to_printable());
        out
    }
}

impl fmt::Display for GdpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.write_str(&self.to_printable())
        } else {
            f.write_str("(none)")
        }
    }
}

impl fmt::Debug for GdpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GdpName({self})")
    }
}

impl FromStr for GdpName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_internal(s)
    }
}

impl From<[u8; GDP_NAME_LEN]> for GdpName {
    fn from(value: [u8; GDP_NAME_LEN]) -> Self {
        Self(value)
    }
}

impl Serialize for GdpName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_printable())
    }
}

impl<'de> Deserialize<'de> for GdpName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode_internal(&text).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Codec Functions
// ============================================================================

/// Encodes an internal name into its 43-character printable form.
///
/// # Errors
///
/// Returns [`NameError::EncodeError`] if the encoder output has an
/// unexpected length.
pub fn encode_printable(name: &GdpName) -> Result<String, NameError> {
    let out = name.to_printable();
    if out.len() != GDP_PNAME_LEN {
        return Err(NameError::EncodeError(format!(
            "printable name has {} characters, expected {GDP_PNAME_LEN}",
            out.len()
        )));
    }
    Ok(out)
}

/// Decodes a printable name into its internal form.
///
/// # Errors
///
/// Returns [`NameError::DecodeError`] when the input is not exactly
/// [`GDP_PNAME_LEN`] characters, contains characters outside the base64url
/// alphabet, or does not decode to [`GDP_NAME_LEN`] bytes.
pub fn decode_internal(printable: &str) -> Result<GdpName, NameError> {
    if printable.len() != GDP_PNAME_LEN {
        return Err(NameError::DecodeError(format!(
            "printable name has {} characters, expected {GDP_PNAME_LEN}",
            printable.len()
        )));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(printable.as_bytes())
        .map_err(|err| NameError::DecodeError(err.to_string()))?;
    GdpName::from_slice(&bytes).ok_or_else(|| {
        NameError::DecodeError(format!(
            "printable name decoded to {} bytes, expected {GDP_NAME_LEN}",
            bytes.len()
        ))
    })
}

/// Returns true iff any byte of the name is non-zero.
#[must_use]
pub fn is_valid(name: &GdpName) -> bool {
    name.0.iter().any(|byte| *byte != 0)
}

/// Encodes a name as 64 lowercase hex characters.
#[must_use]
pub fn to_hex(name: &GdpName) -> String {
    let mut out = String::with_capacity(GDP_HEX_NAME_LEN);
    for byte in name.0 {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

/// Parses a 64-character hex name (either case).
///
/// # Errors
///
/// Returns [`NameError::FormatError`] on wrong length or non-hex characters.
pub fn from_hex(text: &str) -> Result<GdpName, NameError> {
    let raw = text.as_bytes();
    if raw.len() != GDP_HEX_NAME_LEN {
        return Err(NameError::FormatError(format!(
            "hex name has {} characters, expected {GDP_HEX_NAME_LEN}",
            raw.len()
        )));
    }
    let mut out = [0u8; GDP_NAME_LEN];
    for (slot, pair) in out.iter_mut().zip(raw.chunks_exact(2)) {
        let high = hex_value(pair[0])?;
        let low = hex_value(pair[1])?;
        *slot = (high << 4) | low;
    }
    Ok(GdpName(out))
}

/// Returns the value of a single hex digit.
fn hex_value(digit: u8) -> Result<u8, NameError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(NameError::FormatError(format!(
            "invalid hex character '{}'",
            char::from(digit)
        ))),
    }
}
