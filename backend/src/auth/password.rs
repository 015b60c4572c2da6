use rand::Rng;
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256-iter";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;

/// Salted, iterated SHA-256 hash in the form
/// `sha256-iter$<iterations>$<salt_hex>$<digest_hex>`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    let digest = iterated_digest(&salt, password, ITERATIONS);
    format!(
        "{}${}${}${}",
        SCHEME,
        ITERATIONS,
        hex::encode(salt),
        hex::encode(digest)
    )
}

/// Verifies a candidate password against a stored hash string. Any
/// malformed stored value verifies as false rather than erroring.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    if parts.len() != 4 || parts[0] != SCHEME {
        return false;
    }
    let Ok(iterations) = parts[1].parse::<u32>() else {
        return false;
    };
    let Ok(salt) = hex::decode(parts[2]) else {
        return false;
    };
    let Ok(expected) = hex::decode(parts[3]) else {
        return false;
    };

    let digest = iterated_digest(&salt, password, iterations);
    constant_time_eq(&digest, &expected)
}

fn iterated_digest(salt: &[u8], password: &str, iterations: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut digest: [u8; 32] = hasher.finalize().into();
    for _ in 1..iterations {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(digest);
        digest = hasher.finalize().into();
    }
    digest
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let stored = hash_password("hunter2");
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn salts_make_hashes_unique() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn malformed_stored_values_fail_closed() {
        assert!(!verify_password("hunter2", ""));
        assert!(!verify_password("hunter2", "plaintext"));
        assert!(!verify_password("hunter2", "sha256-iter$abc$zz$zz"));
    }
}
