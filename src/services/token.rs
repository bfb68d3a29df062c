//! Random tokens for collision-resistant file names.
use rand::Rng;
use rand::rngs::OsRng;

/// Characters a token may contain.
pub const TOKEN_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_+";

/// Returns `n` characters drawn uniformly from [`TOKEN_ALPHABET`].
///
/// Every index comes from the operating system's entropy source. A failing
/// source panics instead of falling back to a weaker generator.
pub fn random_string(n: usize) -> String {
    (0..n)
        .map(|_| TOKEN_ALPHABET[OsRng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}
