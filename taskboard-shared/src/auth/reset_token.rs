/// Password reset token utilities
///
/// Reset tokens are emailed to the account owner as part of a link and are
/// valid for [`RESET_TOKEN_TTL_MINUTES`]. Only the SHA-256 hash of a token is
/// stored, in `users.reset_token_hash`, so a database leak does not expose
/// usable links.
///
/// # Token Format
///
/// 32 random bytes, hex encoded (64 lowercase hex characters).
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::reset_token::{
///     generate_reset_token, hash_reset_token, validate_reset_token_format, verify_reset_token,
/// };
///
/// let (token, hash) = generate_reset_token();
/// assert_eq!(token.len(), 64);
/// assert!(validate_reset_token_format(&token));
/// assert_eq!(hash_reset_token(&token), hash);
/// assert!(verify_reset_token(&token, &hash));
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a token
const TOKEN_BYTES: usize = 32;

/// Length of an encoded token
pub const RESET_TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// How long a reset link stays valid
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Generates a new reset token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hash). The plaintext goes into the
/// email, the hash into the database.
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let hash = hash_reset_token(&token);

    (token, hash)
}

/// Hashes a reset token using SHA-256
///
/// # Returns
///
/// Hex-encoded SHA-256 hash (64 characters)
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks that a token has the shape produced by [`generate_reset_token`]
///
/// Malformed tokens can be rejected without a database lookup.
pub fn validate_reset_token_format(token: &str) -> bool {
    token.len() == RESET_TOKEN_LENGTH
        && token.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Checks a presented token against a stored hash
///
/// The comparison runs over the full hash regardless of where the first
/// difference is.
pub fn verify_reset_token(token: &str, stored_hash: &str) -> bool {
    constant_time_compare(&hash_reset_token(token), stored_hash)
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Expiry timestamp for a token issued at `now`
pub fn reset_token_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(RESET_TOKEN_TTL_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reset_token() {
        let (token, hash) = generate_reset_token();

        assert_eq!(token.len(), RESET_TOKEN_LENGTH);
        assert_eq!(hash.len(), 64);
        assert_ne!(token, hash);
        assert!(validate_reset_token_format(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: std::collections::HashSet<String> =
            (0..100).map(|_| generate_reset_token().0).collect();

        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let (token, hash) = generate_reset_token();

        assert_eq!(hash_reset_token(&token), hash);
        assert_ne!(hash_reset_token(&token.to_uppercase()), hash);
    }

    #[test]
    fn test_verify_reset_token() {
        let (token, hash) = generate_reset_token();
        let (other, _) = generate_reset_token();

        assert!(verify_reset_token(&token, &hash));
        assert!(!verify_reset_token(&other, &hash));
        assert!(!verify_reset_token(&token, &hash[..63]));
    }

    #[test]
    fn test_validate_reset_token_format() {
        assert!(validate_reset_token_format(&"a".repeat(64)));
        assert!(!validate_reset_token_format(&"a".repeat(63)));
        assert!(!validate_reset_token_format(&"A".repeat(64)));
        assert!(!validate_reset_token_format(&"g".repeat(64)));
        assert!(!validate_reset_token_format(""));
    }

    #[test]
    fn test_reset_token_expiry() {
        let now = Utc::now();
        assert_eq!(reset_token_expiry(now) - now, Duration::hours(1));
    }
}
