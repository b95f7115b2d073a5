//! Password reset keys.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of a generated reset key.
pub const RESET_KEY_LEN: usize = 32;

/// Generate a random alphanumeric reset key.
///
/// Each account holds exactly one key at a time; using it to reset the
/// password replaces it with a new one.
pub fn generate_reset_key() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_KEY_LEN)
        .map(char::from)
        .collect()
}
