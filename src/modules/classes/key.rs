//! Join keys handed out to students by the teacher of a class.

use rand::Rng;

pub const KEY_LENGTH: usize = 8;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a join key of [`KEY_LENGTH`] ASCII letters.
///
/// Keys are not secret-grade; uniqueness is enforced by the database.
pub fn generate_class_key() -> String {
    let mut rng = rand::thread_rng();
    (0..KEY_LENGTH)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}
