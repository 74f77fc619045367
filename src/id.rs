//! Short identifier generation.
//!
//! Identifiers are 8 characters drawn uniformly from a 64-symbol URL-safe
//! alphabet (~48 bits of entropy). Generation is independent of store
//! contents; collisions are detected at insert time and retried by the
//! service.

use rand::Rng;

pub const SHORT_ID_LEN: usize = 8;

const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generate a random short identifier.
///
/// Draws from `rand::rng()`, which is cryptographically secure.
pub fn generate() -> String {
    let mut rng = rand::rng();
    (0..SHORT_ID_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `s` has the shape of a generated identifier.
///
/// Lets lookups reject malformed path segments without a store round trip.
pub fn is_valid(s: &str) -> bool {
    s.len() == SHORT_ID_LEN && s.bytes().all(|b| ALPHABET.contains(&b))
}
