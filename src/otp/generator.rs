//! Numeric code generation.

use rand::{rngs::OsRng, Rng};

/// Draw `length` decimal digits from the OS entropy source.
///
/// Each digit is sampled independently and uniformly so a leaked code
/// reveals nothing about the next one.
pub(crate) fn numeric_code(length: usize) -> String {
    let mut rng = OsRng;
    let mut code = String::with_capacity(length);
    for _ in 0..length {
        let digit: u8 = rng.gen_range(0..=9);
        code.push(char::from(b'0' + digit));
    }
    code
}
