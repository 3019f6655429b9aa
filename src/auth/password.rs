/// Password Hashing and Verification
///
/// Argon2 hashes are stored as a self-describing string:
///
/// ```text
/// $argon2id$v=19$m=131072,t=15,p=6$<salt>$<hash>$<app-tag>
/// ```
///
/// Verification always re-derives with the parameters embedded in the
/// stored string, so raising the defaults never invalidates existing hashes.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::HashError;

/// Memory cost in KiB (128 MiB).
pub const DEFAULT_MEMORY_COST: u32 = 128 * 1024;
pub const DEFAULT_ITERATIONS: u32 = 15;
pub const DEFAULT_PARALLELISM: u32 = 6;
pub const DEFAULT_SALT_LENGTH: usize = 64;
pub const DEFAULT_KEY_LENGTH: usize = 128;

/// Trailing segment of every hash this crate writes. Opaque on read.
pub const APP_TAG: &str = "blog";

/// Argon2 version 0x13.
pub const KDF_VERSION: u32 = 0x13;

/// Upper cost bounds accepted from a stored hash (memory in KiB, 2 GiB).
pub const MAX_MEMORY_COST: u32 = 2 * 1024 * 1024;
pub const MAX_ITERATIONS: u32 = 256;
pub const MAX_PARALLELISM: u32 = 64;

const MIN_SALT_LENGTH: usize = 8;

/// Argon2 flavour recorded in the first segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Argon2id,
    Argon2i,
}

impl Variant {
    fn tag(self) -> &'static str {
        match self {
            Variant::Argon2id => "argon2id",
            Variant::Argon2i => "argon2i",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "argon2id" => Some(Variant::Argon2id),
            // "argon2" is how older hashes spell the non-id variant
            "argon2i" | "argon2" => Some(Variant::Argon2i),
            _ => None,
        }
    }

    fn algorithm(self) -> Algorithm {
        match self {
            Variant::Argon2id => Algorithm::Argon2id,
            Variant::Argon2i => Algorithm::Argon2i,
        }
    }
}

/// Cost parameters of one derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CostParams {
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl CostParams {
    const DEFAULT: CostParams = CostParams {
        memory: DEFAULT_MEMORY_COST,
        iterations: DEFAULT_ITERATIONS,
        parallelism: DEFAULT_PARALLELISM,
    };

    fn to_argon2(self, key_length: usize) -> Result<Params, argon2::Error> {
        Params::new(self.memory, self.iterations, self.parallelism, Some(key_length))
    }
}

/// Decoded form of a stored password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRecord {
    pub variant: Variant,
    pub version: u32,
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
    pub app_tag: String,
}

impl HashRecord {
    fn cost(&self) -> CostParams {
        CostParams {
            memory: self.memory,
            iterations: self.iterations,
            parallelism: self.parallelism,
        }
    }
}

impl fmt::Display for HashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}$v={}$m={},t={},p={}${}${}${}",
            self.variant.tag(),
            self.version,
            self.memory,
            self.iterations,
            self.parallelism,
            STANDARD_NO_PAD.encode(&self.salt),
            STANDARD_NO_PAD.encode(&self.hash),
            self.app_tag,
        )
    }
}

impl FromStr for HashRecord {
    type Err = HashError;

    fn from_str(encoded: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = encoded.split('$').collect();
        if parts.len() != 7 || !parts[0].is_empty() {
            return Err(HashError::Parse(format!(
                "expected 6 '$'-separated fields, found {}",
                parts.len().saturating_sub(1)
            )));
        }

        let variant = Variant::from_tag(parts[1])
            .ok_or_else(|| HashError::Parse(format!("unknown algorithm '{}'", parts[1])))?;

        let version = parse_field(parts[2], "v")?;
        if version != KDF_VERSION {
            return Err(HashError::VersionMismatch {
                expected: KDF_VERSION,
                found: version,
            });
        }

        let costs: Vec<&str> = parts[3].split(',').collect();
        if costs.len() != 3 {
            return Err(HashError::Parse("expected m=,t=,p= cost parameters".to_string()));
        }
        let memory = parse_field(costs[0], "m")?;
        let iterations = parse_field(costs[1], "t")?;
        let parallelism = parse_field(costs[2], "p")?;
        check_bound("m", memory, MAX_MEMORY_COST)?;
        check_bound("t", iterations, MAX_ITERATIONS)?;
        check_bound("p", parallelism, MAX_PARALLELISM)?;

        let salt = STANDARD_NO_PAD
            .decode(parts[4])
            .map_err(|e| HashError::Parse(format!("salt: {}", e)))?;
        let hash = STANDARD_NO_PAD
            .decode(parts[5])
            .map_err(|e| HashError::Parse(format!("hash: {}", e)))?;

        if salt.len() < MIN_SALT_LENGTH {
            return Err(HashError::Parse("salt is too short".to_string()));
        }

        let record = HashRecord {
            variant,
            version,
            memory,
            iterations,
            parallelism,
            salt,
            hash,
            app_tag: parts[6].to_string(),
        };

        // Reject parameters the KDF would refuse before anyone derives with them.
        record
            .cost()
            .to_argon2(record.hash.len())
            .map_err(|e| HashError::Parse(format!("cost parameters: {}", e)))?;

        Ok(record)
    }
}

/// Parse a `key=<u32>` segment.
fn parse_field(segment: &str, key: &str) -> Result<u32, HashError> {
    segment
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| HashError::Parse(format!("expected '{}=' in '{}'", key, segment)))?
        .parse::<u32>()
        .map_err(|_| HashError::Parse(format!("non-numeric '{}' parameter", key)))
}

fn check_bound(key: &str, value: u32, max: u32) -> Result<(), HashError> {
    if value > max {
        return Err(HashError::Parse(format!(
            "'{}' parameter {} exceeds the maximum of {}",
            key, value, max
        )));
    }
    Ok(())
}

fn derive_key(
    password: &str,
    salt: &[u8],
    variant: Variant,
    cost: CostParams,
    key_length: usize,
) -> Result<Vec<u8>, HashError> {
    let params = cost.to_argon2(key_length)?;
    let argon2 = Argon2::new(variant.algorithm(), Version::V0x13, params);

    let mut key = vec![0u8; key_length];
    argon2.hash_password_into(password.as_bytes(), salt, &mut key)?;
    Ok(key)
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

pub(crate) fn hash_with_params(password: &str, cost: CostParams) -> Result<String, HashError> {
    let mut salt = vec![0u8; DEFAULT_SALT_LENGTH];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| HashError::Randomness(e.to_string()))?;

    let hash = derive_key(password, &salt, Variant::Argon2id, cost, DEFAULT_KEY_LENGTH)?;

    let record = HashRecord {
        variant: Variant::Argon2id,
        version: KDF_VERSION,
        memory: cost.memory,
        iterations: cost.iterations,
        parallelism: cost.parallelism,
        salt,
        hash,
        app_tag: APP_TAG.to_string(),
    };

    Ok(record.to_string())
}

/// Hash a password with Argon2id and the default cost parameters.
///
/// Every call draws a fresh 64-byte salt from the OS random source, so
/// hashing the same password twice yields two different strings.
///
/// # Errors
/// Returns `HashError::Randomness` if the OS random source is unavailable.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    hash_with_params(password, CostParams::DEFAULT)
}

/// Verify a password against its stored hash.
///
/// # Errors
/// - `HashError::Parse` if the stored hash is malformed
/// - `HashError::VersionMismatch` if it was written by another Argon2 version
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, HashError> {
    let record: HashRecord = encoded.parse()?;

    let candidate = derive_key(
        password,
        &record.salt,
        record.variant,
        record.cost(),
        record.hash.len(),
    )?;

    Ok(constant_time_eq(&candidate, &record.hash))
}

/// A well-formed hash at the default cost that no password matches.
///
/// Logins for unknown users verify against it, so they pay the same KDF
/// cost as a wrong password for a real account.
pub fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| {
        HashRecord {
            variant: Variant::Argon2id,
            version: KDF_VERSION,
            memory: DEFAULT_MEMORY_COST,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
            salt: vec![0u8; DEFAULT_SALT_LENGTH],
            hash: vec![0u8; DEFAULT_KEY_LENGTH],
            app_tag: APP_TAG.to_string(),
        }
        .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap parameters keep most tests fast; the format is identical.
    const TEST_COST: CostParams = CostParams {
        memory: 64,
        iterations: 1,
        parallelism: 1,
    };

    fn cheap_hash(password: &str) -> String {
        hash_with_params(password, TEST_COST).expect("Failed to hash password")
    }

    /// Replace one character of the given segment with a different base64 symbol.
    fn tamper_segment(encoded: &str, index: usize) -> String {
        let mut parts: Vec<String> = encoded.split('$').map(str::to_string).collect();
        let segment = &mut parts[index];
        let first = segment.remove(0);
        let replacement = if first == 'A' { 'B' } else { 'A' };
        segment.insert(0, replacement);
        parts.join("$")
    }

    #[test]
    fn test_hash_password_default_format() {
        let hash = hash_password("mysecretpassword").expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$v=19$m=131072,t=15,p=6$"));
        assert!(hash.ends_with("$blog"));

        let record: HashRecord = hash.parse().expect("Failed to parse hash");
        assert_eq!(record.salt.len(), DEFAULT_SALT_LENGTH);
        assert_eq!(record.hash.len(), DEFAULT_KEY_LENGTH);
    }

    #[test]
    fn test_verify_password_with_default_cost() {
        let hash = hash_password("mysecretpassword").expect("Failed to hash password");

        assert!(verify_password("mysecretpassword", &hash).expect("Failed to verify"));
    }

    #[test]
    fn test_verify_password() {
        let hash = cheap_hash("correct horse battery staple");

        assert!(verify_password("correct horse battery staple", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = cheap_hash("correct horse battery staple");

        assert!(!verify_password("Correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_hashes() {
        let first = cheap_hash("same_password");
        let second = cheap_hash("same_password");

        assert_ne!(first, second);
        assert!(verify_password("same_password", &first).unwrap());
        assert!(verify_password("same_password", &second).unwrap());
    }

    #[test]
    fn test_password_with_unicode() {
        let password = "パスワード123";
        let hash = cheap_hash(password);
        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_embedded_parameters_are_used() {
        let hash = cheap_hash("pw");
        assert!(hash.contains("$m=64,t=1,p=1$"));

        // Verification must not assume the defaults.
        assert!(verify_password("pw", &hash).unwrap());
    }

    #[test]
    fn test_tampered_salt_fails_verification() {
        let hash = cheap_hash("pw");
        let tampered = tamper_segment(&hash, 4);

        match verify_password("pw", &tampered) {
            Ok(matched) => assert!(!matched),
            Err(e) => assert!(matches!(e, HashError::Parse(_))),
        }
    }

    #[test]
    fn test_tampered_digest_fails_verification() {
        let hash = cheap_hash("pw");
        let tampered = tamper_segment(&hash, 5);

        match verify_password("pw", &tampered) {
            Ok(matched) => assert!(!matched),
            Err(e) => assert!(matches!(e, HashError::Parse(_))),
        }
    }

    #[test]
    fn test_version_mismatch() {
        let hash = cheap_hash("pw").replace("$v=19$", "$v=16$");

        let result = verify_password("pw", &hash);
        assert!(matches!(
            result,
            Err(HashError::VersionMismatch { expected: 19, found: 16 })
        ));
    }

    #[test]
    fn test_wrong_field_count() {
        let hash = cheap_hash("pw");
        let truncated = hash.rsplit_once('$').unwrap().0;

        assert!(matches!(verify_password("pw", truncated), Err(HashError::Parse(_))));
        assert!(matches!(
            verify_password("pw", "not_a_valid_hash"),
            Err(HashError::Parse(_))
        ));
        assert!(matches!(verify_password("pw", ""), Err(HashError::Parse(_))));
    }

    #[test]
    fn test_non_numeric_cost() {
        let hash = cheap_hash("pw").replace("m=64", "m=lots");
        assert!(matches!(verify_password("pw", &hash), Err(HashError::Parse(_))));

        let hash = cheap_hash("pw").replace("t=1,p=1", "p=1,t=1");
        assert!(matches!(verify_password("pw", &hash), Err(HashError::Parse(_))));
    }

    #[test]
    fn test_invalid_base64() {
        let hash = cheap_hash("pw");
        let mut parts: Vec<&str> = hash.split('$').collect();
        parts[4] = "not*base64!";
        let broken = parts.join("$");

        assert!(matches!(verify_password("pw", &broken), Err(HashError::Parse(_))));
    }

    #[test]
    fn test_padded_base64_is_rejected() {
        let hash = cheap_hash("pw");
        let mut parts: Vec<String> = hash.split('$').map(str::to_string).collect();
        parts[5].push('=');
        let padded = parts.join("$");

        assert!(matches!(verify_password("pw", &padded), Err(HashError::Parse(_))));
    }

    #[test]
    fn test_unknown_variant() {
        let hash = cheap_hash("pw").replacen("argon2id", "scrypt", 1);
        assert!(matches!(verify_password("pw", &hash), Err(HashError::Parse(_))));
    }

    #[test]
    fn test_kdf_rejected_costs_are_parse_errors() {
        let hash = cheap_hash("pw").replace("p=1", "p=0");
        assert!(matches!(verify_password("pw", &hash), Err(HashError::Parse(_))));
    }

    #[test]
    fn test_oversized_costs_are_rejected_before_derivation() {
        let salt = STANDARD_NO_PAD.encode([1u8; 16]);
        let hash = STANDARD_NO_PAD.encode([2u8; 32]);
        let encode = |costs: &str| format!("$argon2id$v=19${}${}${}$blog", costs, salt, hash);

        for costs in [
            "m=4294967295,t=1,p=1",
            "m=64,t=4294967295,p=1",
            "m=64,t=1,p=16777215",
        ] {
            assert!(
                matches!(verify_password("pw", &encode(costs)), Err(HashError::Parse(_))),
                "Should reject {}",
                costs
            );
        }

        // Raised costs below the bounds still parse.
        let raised = format!("m={},t={},p={}", MAX_MEMORY_COST, MAX_ITERATIONS, MAX_PARALLELISM);
        let record: HashRecord = encode(&raised).parse().expect("Failed to parse raised costs");
        assert_eq!(record.memory, MAX_MEMORY_COST);
    }

    #[test]
    fn test_decoy_hash_uses_default_cost_and_matches_nothing() {
        let record: HashRecord = decoy_hash().parse().expect("Failed to parse decoy hash");
        assert_eq!(record.cost(), CostParams::DEFAULT);
        assert_eq!(record.hash.len(), DEFAULT_KEY_LENGTH);

        assert!(!verify_password("", decoy_hash()).unwrap());
        assert!(!verify_password("correct horse battery staple", decoy_hash()).unwrap());
    }

    #[test]
    fn test_record_round_trip_preserves_format() {
        let hash = cheap_hash("pw");
        let record: HashRecord = hash.parse().unwrap();

        assert_eq!(record.variant, Variant::Argon2id);
        assert_eq!(record.version, 19);
        assert_eq!(record.to_string(), hash);
    }

    #[test]
    fn test_legacy_argon2i_tag() {
        let salt = [7u8; 16];
        let cost = TEST_COST;
        let key = derive_key("pw", &salt, Variant::Argon2i, cost, 32).unwrap();
        let encoded = format!(
            "$argon2$v=19$m=64,t=1,p=1${}${}$simoni.dev",
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(&key),
        );

        assert!(verify_password("pw", &encoded).unwrap());
        assert!(!verify_password("other", &encoded).unwrap());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
