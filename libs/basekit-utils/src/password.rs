//! Argon2id password hashing in PHC string format.

use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{Error, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Hash `password` with a fresh random salt.
///
/// # Errors
/// When the hasher rejects its input, e.g. a password over the Argon2 length limit.
pub fn make_pass(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Whether `password` matches `hashed`, a PHC string from [`make_pass`].
///
/// # Errors
/// When `hashed` is not a valid PHC string. A wrong password is `Ok(false)`.
pub fn check_pass(password: &str, hashed: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(hashed)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hashed = make_pass("correct horse").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(check_pass("correct horse", &hashed).unwrap());
        assert!(!check_pass("wrong horse", &hashed).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = make_pass("same").unwrap();
        let b = make_pass("same").unwrap();
        assert_ne!(a, b);
        assert!(check_pass("same", &a).unwrap());
        assert!(check_pass("same", &b).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(check_pass("anything", "not-a-phc-string").is_err());
    }
}
