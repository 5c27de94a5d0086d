//! Password hashing and verification using Argon2id.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use std::sync::LazyLock;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::Rng;

use crate::error::AuthError;

/// Length of generated one-time passwords.
pub const TEMPORARY_PASSWORD_LEN: usize = 12;

/// Letters and digits without the look-alikes `0 O o 1 l I`.
const TEMPORARY_PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";

/// Hash that no account owns, verified when the login email is unknown.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("orgdesk-no-such-account").ok());

/// Hash a plaintext password into an Argon2id PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Crypto(format!("hash error: {e}")))
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Spend one Argon2 verification on a throwaway hash.
///
/// Login calls this for unknown emails so they cost as much as a wrong
/// password. Always `false` for real input.
pub fn verify_dummy_password(password: &str) -> bool {
    match DUMMY_HASH.as_deref() {
        Some(hash) => verify_password(password, hash).unwrap_or(false),
        None => false,
    }
}

/// Generate a random one-time password from an unambiguous alphabet.
pub fn generate_temporary_password() -> String {
    let mut rng = rand::thread_rng();
    (0..TEMPORARY_PASSWORD_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..TEMPORARY_PASSWORD_ALPHABET.len());
            char::from(TEMPORARY_PASSWORD_ALPHABET[idx])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("hunter2").unwrap();
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(matches!(
            verify_password("pw", "not-a-hash"),
            Err(AuthError::Crypto(_))
        ));
    }

    #[test]
    fn temporary_passwords_avoid_look_alikes_and_are_distinct() {
        let a = generate_temporary_password();
        let b = generate_temporary_password();
        assert_eq!(a.len(), TEMPORARY_PASSWORD_LEN);
        assert_ne!(a, b);
        for _ in 0..200 {
            let pw = generate_temporary_password();
            assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(!pw.contains(['0', 'O', 'o', '1', 'l', 'I']), "{pw}");
        }
    }

    #[test]
    fn dummy_verification_runs_argon2_and_never_matches() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(hash).unwrap().algorithm.as_str().starts_with("argon2"));
        assert!(!verify_dummy_password("hunter2"));
        assert!(!verify_dummy_password(""));
    }
}
