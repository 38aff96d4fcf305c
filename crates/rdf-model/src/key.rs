//! Fixed-width content-addressed identifiers.

use std::fmt;

/// A 4-byte opaque identifier, totally ordered little-endian.
///
/// The all-zero key ([`Key::INVALID`]) is reserved and never assigned to a
/// real entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key([u8; 4]);

impl Key {
    /// The reserved "none/invalid" key.
    pub const INVALID: Key = Key([0; 4]);

    /// Wrap a raw 4-byte value.
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Key(bytes)
    }

    /// Build a key from the low 32 bits of a hash, little-endian.
    pub fn from_u32(v: u32) -> Self {
        Key(v.to_le_bytes())
    }

    /// Build a key by copying the first 4 bytes of `slice`.
    ///
    /// Panics if `slice` is shorter than 4 bytes.
    pub fn from_slice(slice: &[u8]) -> Self {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&slice[..4]);
        Key(bytes)
    }

    /// Borrow the raw bytes, e.g. for use as a storage-backend key.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// The little-endian `u32` this key encodes.
    pub fn as_u32(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// True if this is the reserved invalid key.
    pub fn is_invalid(&self) -> bool {
        *self == Key::INVALID
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:08x})", self.as_u32())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.as_u32())
    }
}
