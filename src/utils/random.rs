//! Random generation utilities
//!
//! Every function that draws randomness takes the RNG as a parameter, so
//! callers decide between a seeded generator (tests) and an entropy-backed
//! one (production).

use rand::Rng;

/// The 62-symbol alphabet confirmation codes are drawn from
pub const ALPHANUMERIC: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random string with custom character set
///
/// Each character is drawn independently and uniformly from `charset`.
///
/// # Arguments
/// * `rng` - Random source
/// * `length` - The desired length of the random string
/// * `charset` - String containing all allowed characters
///
/// # Example
/// ```rust,ignore
/// let mut rng = StdRng::seed_from_u64(7);
/// let code = string_with_charset(&mut rng, 6, "0123456789");
/// ```
pub fn string_with_charset<R: Rng + ?Sized>(rng: &mut R, length: usize, charset: &str) -> String {
    let chars: Vec<char> = charset.chars().collect();
    if chars.is_empty() {
        return String::new();
    }

    (0..length)
        .map(|_| chars[rng.gen_range(0..chars.len())])
        .collect()
}

/// Returns true when every character of `value` belongs to `charset`
pub fn is_from_charset(value: &str, charset: &str) -> bool {
    value.chars().all(|c| charset.contains(c))
}
