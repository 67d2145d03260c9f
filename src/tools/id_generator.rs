//! Random request id generation.

use rand::Rng;

/// Prefix of every generated request id.
pub const REQUEST_ID_PREFIX: &str = "req-";

/// Number of random hex digits following the prefix.
pub const REQUEST_ID_HEX_DIGITS: usize = 16;

/// Generates a request id like `req-3f9a0c1be47d2a65`.
///
/// The suffix is 64 bits of randomness rendered as lowercase hex.
pub fn generate_request_id() -> String {
    let random: u64 = rand::rng().random();
    format!(
        "{}{:0width$x}",
        REQUEST_ID_PREFIX,
        random,
        width = REQUEST_ID_HEX_DIGITS
    )
}
