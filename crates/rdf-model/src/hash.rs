//! The identifier hash: a pure function of a URI's canonical bytes plus a
//! salt, used by the identifier service to resolve collisions.

use crate::Key;
use xxhash_rust::xxh64::xxh64;

/// Hash `bytes` salted with `salt`, truncated to a 4-byte [`Key`].
///
/// Uses the salt as the xxh64 seed so that incrementing it on collision
/// produces an independent hash without re-deriving the input bytes.
pub fn hash(bytes: &[u8], salt: u32) -> Key {
    let digest = xxh64(bytes, salt as u64);
    // Fold the 64-bit digest down to 32 bits rather than truncating, so the
    // salt actually perturbs every output bit instead of only the low word.
    let folded = (digest as u32) ^ ((digest >> 32) as u32);
    Key::from_u32(folded)
}
