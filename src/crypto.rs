use crate::ChoreError;
use argon2::{Algorithm, Argon2, Params, PasswordVerifier, Version};
use password_hash::{PasswordHash, PasswordHasher as ArgonPasswordHasher, SaltString};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Number of random bytes in a session token (256 bits).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// `Debug` and `Display` print `[REDACTED]`. Serialization exposes the value,
/// since session tokens are returned to the client in the login response.
///
/// # Example
///
/// ```rust
/// use chorepool::crypto::SecretString;
///
/// let password = SecretString::new("correct horse battery");
/// assert_eq!(format!("{:?}", password), "SecretString([REDACTED])");
/// assert_eq!(password.expose_secret(), "correct horse battery");
/// ```
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString)
    }
}

/// Pluggable password hashing. The default implementation is [`Argon2Hasher`].
pub trait PasswordHasher: Send + Sync {
    /// # Errors
    ///
    /// Returns `ChoreError::PasswordHashError` if hashing fails.
    fn hash(&self, password: &str) -> Result<String, ChoreError>;

    /// # Errors
    ///
    /// Returns `ChoreError::PasswordHashError` if the stored hash is malformed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, ChoreError>;

    /// Verifies `password` against a hash that nothing matches, at the same
    /// cost as [`verify`](Self::verify) against a hash from this hasher. Login
    /// runs it for unknown usernames so they take as long to reject as a wrong
    /// password.
    ///
    /// # Errors
    ///
    /// Returns `ChoreError::PasswordHashError` if the decoy cannot be built.
    fn verify_decoy(&self, password: &str) -> Result<bool, ChoreError>;
}

/// Fixed salt and all-zero output for the decoy PHC string.
const DECOY_SALT: &str = "Y2hvcmVwb29sZGVjb3k";
const DECOY_OUTPUT: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Argon2id password hasher.
///
/// ```rust
/// use chorepool::crypto::{Argon2Hasher, PasswordHasher};
///
/// let hasher = Argon2Hasher::new(1024, 1, 1);
/// let hash = hasher.hash("hunter2hunter2").unwrap();
/// assert!(hasher.verify("hunter2hunter2", &hash).unwrap());
/// assert!(!hasher.verify("hunter3hunter3", &hash).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    /// KiB
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl Argon2Hasher {
    #[must_use]
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// A PHC string with this hasher's parameters, so verifying against it
    /// costs what verifying a real hash does.
    fn decoy_hash(&self) -> String {
        format!(
            "$argon2id$v=19$m={},t={},p={}${DECOY_SALT}${DECOY_OUTPUT}",
            self.memory_cost, self.time_cost, self.parallelism
        )
    }

    /// Cheap parameters for tests. Never use in production.
    #[cfg(any(test, feature = "mocks"))]
    #[must_use]
    pub fn insecure_fast() -> Self {
        Self::new(1024, 1, 1)
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, ChoreError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|_| ChoreError::PasswordHashError)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|_| ChoreError::PasswordHashError)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, ChoreError> {
        let parsed = PasswordHash::new(hash).map_err(|_| ChoreError::PasswordHashError)?;

        // parameters come from the PHC string, not from self
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn verify_decoy(&self, password: &str) -> Result<bool, ChoreError> {
        self.verify(password, &self.decoy_hash())
    }
}

/// Generates an opaque session token: [`SESSION_TOKEN_BYTES`] bytes from the
/// OS CSPRNG, hex encoded.
///
/// # Errors
///
/// Returns `ChoreError::Internal` if the entropy source fails. Callers must
/// not fall back to a weaker source.
pub fn generate_session_token() -> Result<String, ChoreError> {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        log::error!(target: "chorepool", "msg=\"entropy source failed\", error=\"{e}\"");
        ChoreError::Internal("entropy source unavailable".to_owned())
    })?;
    Ok(hex::encode(bytes))
}

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Generates a group join code: 5 random bytes as 8 base32 characters.
///
/// # Errors
///
/// Returns `ChoreError::Internal` if the entropy source fails.
pub fn generate_group_code() -> Result<String, ChoreError> {
    let mut bytes = [0u8; 5];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        log::error!(target: "chorepool", "msg=\"entropy source failed\", error=\"{e}\"");
        ChoreError::Internal("entropy source unavailable".to_owned())
    })?;

    // 40 bits split into eight 5-bit groups, most significant first
    let bits = bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    Ok((0..8)
        .rev()
        .map(|i| char::from(BASE32_ALPHABET[((bits >> (i * 5)) & 0x1f) as usize]))
        .collect())
}
