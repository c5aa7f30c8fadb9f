//! Password hashes and bearer tokens
//!
//! Passwords are stored as bcrypt hashes (salt and cost are part of the
//! hash string). [`UNUSABLE_HASH`] marks an account that cannot sign in
//! until an administrator sets a password; restored accounts start that way.

use bcrypt::BcryptError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// bcrypt work factor for stored passwords
pub const HASH_COST: u32 = 10;

/// Not a valid bcrypt hash, so nothing verifies against it
pub const UNUSABLE_HASH: &str = "!";

const TOKEN_BYTES: usize = 32;

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    bcrypt::hash(password, HASH_COST)
}

/// `false` for a wrong password and for malformed or unusable hashes
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Fresh opaque API token
pub fn new_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}
