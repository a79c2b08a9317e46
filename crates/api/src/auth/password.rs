//! Argon2id password hashing and verification.
//!
//! All password hashes use the Argon2id variant with a cryptographically random
//! salt generated via [`OsRng`]. The PHC string format is used for storage so
//! that algorithm parameters and salt are embedded in the hash itself, which
//! lets the cost be raised later without invalidating existing credentials.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use talent_core::validation::MAX_PASSWORD_LENGTH;

/// Default Argon2 memory cost in KiB.
pub const DEFAULT_MEMORY_KIB: u32 = 19_456;
/// Default Argon2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 2;
/// Default Argon2 lane count.
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Plaintext hashed once at startup to produce the dummy credential used
/// when a login names an unknown account.
const DUMMY_PASSWORD: &str = "dummy-password-for-timing-equalisation";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Password must not be empty")]
    Empty,

    #[error("Password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,

    #[error("Invalid hashing parameters: {0}")]
    Params(argon2::Error),

    #[error("Password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Hashes plaintext passwords for storage and verifies plaintext against
/// stored hashes.
///
/// Stateless apart from its cost parameters; clone freely into blocking tasks.
#[derive(Debug, Clone)]
pub struct CredentialManager {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl CredentialManager {
    /// Build a manager with the given cost. Computes the dummy credential, so
    /// this costs one hash.
    pub fn new(config: PasswordConfig) -> Result<Self, CredentialError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(CredentialError::Params)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut manager = Self {
            argon2,
            dummy_hash: String::new(),
        };
        manager.dummy_hash = manager.hash(DUMMY_PASSWORD)?;
        Ok(manager)
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// Returns the PHC-formatted hash string (includes algorithm, params, salt, and hash).
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        check_length(password)?;
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(CredentialError::Hash)?;
        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored PHC-formatted hash.
    ///
    /// The parameters and salt embedded in `stored` are used, and the digest
    /// comparison is the primitive's constant-time one. Malformed hashes and
    /// out-of-range plaintexts yield `false`, indistinguishable from a wrong
    /// password.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        if check_length(password).is_err() {
            return false;
        }
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend one verification's worth of work and return `false`.
    ///
    /// Used when the account does not exist so the response time matches a
    /// wrong-password attempt.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.dummy_hash);
        false
    }
}

fn check_length(password: &str) -> Result<(), CredentialError> {
    if password.is_empty() {
        return Err(CredentialError::Empty);
    }
    if password.chars().count() as u64 > MAX_PASSWORD_LENGTH {
        return Err(CredentialError::TooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Minimum-cost parameters so the tests stay fast.
    fn test_manager() -> CredentialManager {
        CredentialManager::new(PasswordConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid params")
    }

    #[test]
    fn test_hash_and_verify() {
        let manager = test_manager();
        let password = "correct-horse-battery-staple";
        let hash = manager.hash(password).expect("hashing should succeed");

        // The hash must be a valid PHC string starting with the argon2id identifier.
        assert!(
            hash.starts_with("$argon2id$"),
            "expected argon2id PHC prefix"
        );
        assert!(manager.verify(password, &hash));
    }

    #[test]
    fn test_wrong_password_fails() {
        let manager = test_manager();
        let hash = manager.hash("real-password").expect("hashing should succeed");
        assert!(!manager.verify("wrong-password", &hash));
    }

    #[test]
    fn test_same_password_hashes_differ() {
        let manager = test_manager();
        let first = manager.hash("Abcdef1!").unwrap();
        let second = manager.hash("Abcdef1!").unwrap();
        assert_ne!(first, second, "salts must be random per call");
        assert!(manager.verify("Abcdef1!", &first));
        assert!(manager.verify("Abcdef1!", &second));
    }

    #[test]
    fn test_embedded_params_are_used_for_verify() {
        let cheap = test_manager();
        let hash = cheap.hash("Abcdef1!").unwrap();

        let other = CredentialManager::new(PasswordConfig {
            memory_kib: 128,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(other.verify("Abcdef1!", &hash));
    }

    #[test]
    fn test_malformed_hash_is_false_not_error() {
        let manager = test_manager();
        assert!(!manager.verify("Abcdef1!", ""));
        assert!(!manager.verify("Abcdef1!", "not-a-phc-string"));
        assert!(!manager.verify(
            "Abcdef1!",
            "$2b$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy"
        ));
    }

    #[test]
    fn test_empty_and_oversized_plaintext_rejected() {
        let manager = test_manager();
        assert_matches!(manager.hash(""), Err(CredentialError::Empty));

        let at_limit = "a".repeat(MAX_PASSWORD_LENGTH as usize);
        assert!(manager.hash(&at_limit).is_ok());

        let too_long = "a".repeat(MAX_PASSWORD_LENGTH as usize + 1);
        assert_matches!(manager.hash(&too_long), Err(CredentialError::TooLong));

        let hash = manager.hash("Abcdef1!").unwrap();
        assert!(!manager.verify("", &hash));
        assert!(!manager.verify(&too_long, &hash));
    }

    #[test]
    fn test_dummy_verify_is_always_false() {
        let manager = test_manager();
        assert!(!manager.verify_dummy(DUMMY_PASSWORD));
        assert!(!manager.verify_dummy("anything"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = CredentialManager::new(PasswordConfig {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        });
        assert_matches!(result, Err(CredentialError::Params(_)));
    }
}
