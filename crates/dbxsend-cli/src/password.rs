//! Link password generation

use rand::{seq::SliceRandom, thread_rng};

const ALPHABET: &[u8] = b"0123456789abcdef";
const PASSWORD_LEN: usize = 12;

/// A short lowercase hex password, easy to read out over the phone.
///
/// Not meant to resist offline guessing; it only gates the shared link.
pub fn generate_password() -> String {
    let mut rng = thread_rng();
    (0..PASSWORD_LEN)
        .filter_map(|_| ALPHABET.choose(&mut rng))
        .map(|&b| b as char)
        .collect()
}
