//! Password Hashing
//! Mission: One-way credential hashing with a tunable work factor

use anyhow::{Context, Result};

/// bcrypt hasher with a configurable cost.
///
/// The cost only affects newly created hashes; bcrypt embeds cost and salt in
/// the `$2b$<cost>$...` output, so hashes created under an older cost keep
/// verifying after the setting changes.
pub struct PasswordHasher {
    cost: u32,
}

/// Raised when a stored hash cannot be parsed. A plain mismatch is `Ok(false)`,
/// never an error.
#[derive(Debug)]
pub enum CredentialError {
    Corrupt,
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::Corrupt => write!(f, "Stored credential hash is malformed"),
        }
    }
}

impl std::error::Error for CredentialError {}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password for storage.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        bcrypt::hash(plaintext, self.cost).context("Failed to hash password")
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// bcrypt performs a constant-time comparison against the stored hash.
    pub fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, CredentialError> {
        bcrypt::verify(plaintext, stored).map_err(|_| CredentialError::Corrupt)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps these tests fast.
    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hasher = fast_hasher();
        let hash = hasher.hash("Secret123!").unwrap();

        assert!(hasher.verify("Secret123!", &hash).unwrap());
        assert!(!hasher.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = fast_hasher();
        let a = hasher.hash("Secret123!").unwrap();
        let b = hasher.hash("Secret123!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_cost_change_keeps_old_hashes_verifying() {
        let old = PasswordHasher::new(4);
        let hash = old.hash("Secret123!").unwrap();

        // The hash self-describes its cost, so a hasher configured with a
        // different cost still verifies it.
        let new = PasswordHasher::new(6);
        assert!(new.verify("Secret123!", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_corrupt_not_false() {
        let hasher = fast_hasher();
        let result = hasher.verify("Secret123!", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(CredentialError::Corrupt)));
    }
}
