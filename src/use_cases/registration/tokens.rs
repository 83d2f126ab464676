use argon2::password_hash::rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::entities::user;

/// Stored in place of a key once its user is active. Never validates.
pub const ACTIVATED: &str = "ALREADY_ACTIVATED";

const KEY_LENGTH: usize = 64;
const SALT_LENGTH: usize = 16;

/// Derives an activation key as `hex(sha256(salt || seed))` with a random salt.
pub fn generate(seed: &[u8]) -> String {
    let salt = {
        let mut buff = [0_u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut buff);
        buff
    };
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(seed);
    hex::encode(hasher.finalize())
}

pub fn generate_for(user: &user::Model) -> String {
    generate(user.username.as_bytes())
}

pub fn is_activated_sentinel(activation_key: &str) -> bool {
    activation_key == ACTIVATED
}

pub fn is_well_formed(activation_key: &str) -> bool {
    activation_key.len() == KEY_LENGTH
        && activation_key
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
