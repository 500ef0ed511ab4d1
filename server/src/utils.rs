//! Random identity and colour helpers.

use rand::Rng;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 10;

/// Random base36 token, unique in practice for the lifetime of one server.
pub fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Hue in degrees, always within `[0, 360)`.
pub fn random_hue<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    rng.gen_range(0..360)
}

pub fn opposite_hue(hue: u16) -> u16 {
    (hue % 360 + 180) % 360
}
