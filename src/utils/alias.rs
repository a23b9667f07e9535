//! Alias generation for short links.
//!
//! Custom aliases are validated by the request layer before they reach this
//! crate; generated ones come from here.

use base64::Engine as _;

/// Length of a generated alias in characters.
pub const ALIAS_LENGTH: usize = 6;

/// Generates a random URL-safe alias.
///
/// Draws `ALIAS_LENGTH` random bytes and encodes them as URL-safe base64
/// without padding, truncated to `ALIAS_LENGTH` characters. The token space
/// (64^6) is large enough that collisions are rare; the resolver still
/// retries against the store on the unlucky draw.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
pub fn generate_alias() -> String {
    let mut buffer = [0u8; ALIAS_LENGTH];

    getrandom::getrandom(&mut buffer).expect("Failed to generate random bytes");

    let mut alias = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer);
    alias.truncate(ALIAS_LENGTH);
    alias
}
