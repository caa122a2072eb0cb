use rand::Rng;

/// Safe character set for game codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 4;

/// Generate a random game code. No uniqueness guarantee at generation time;
/// the store's insert constraint rejects collisions and the caller retries.
pub fn generate_game_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Normalize a user-typed code for lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
