use bcrypt::{hash, verify, DEFAULT_COST};
use log::error;

/// One-way salted hash of a plaintext password. Only the digest is ever
/// persisted; bcrypt embeds the salt in it.
pub fn hash_password(plaintext: &str) -> Result<String, ()> {
    hash(plaintext, DEFAULT_COST).map_err(|e| {
        error!("couldn't hash password: {e:?}");
    })
}

/// Constant-time comparison of a login attempt against a stored digest.
/// A malformed digest counts as a failed verification.
pub fn verify_password(plaintext: &str, pwhash: &str) -> bool {
    verify(plaintext, pwhash).unwrap_or_else(|e| {
        error!("couldn't verify password: {e:?}");
        false
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verifies_the_original_plaintext_only() {
        let pwhash = hash_password("correct horse").unwrap();

        assert!(verify_password("correct horse", &pwhash));
        assert!(!verify_password("correct horsf", &pwhash));
        assert!(!verify_password("", &pwhash));
    }

    #[test]
    fn the_stored_hash_is_not_a_valid_password() {
        let pwhash = hash_password("hunter23").unwrap();

        assert!(!verify_password(&pwhash, &pwhash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same input").unwrap();
        let b = hash_password("same input").unwrap();

        assert_ne!(a, b);
    }
}
