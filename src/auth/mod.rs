//! Password hashing and session cookie primitives.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::{ApiError, ValidationErrors};

/// Name of the cookie carrying the signed session id.
pub const SESSION_COOKIE: &str = "imovia_session";

/// Salted, computationally-hard hash for storage. bcrypt embeds the salt and
/// work factor in the output string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!("password hashing failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })
}

/// Constant-time verification against a stored hash. Malformed hashes count
/// as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Complexity policy applied before a password change is accepted.
pub fn validate_password_policy(password: &str) -> Result<(), ApiError> {
    let mut problems = Vec::new();
    if password.len() < 8 {
        problems.push("at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        problems.push("a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        problems.push("an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("a digit");
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        problems.push("a symbol");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        let mut errors = ValidationErrors::new();
        errors.put(
            "new_password",
            format!("Password must contain {}", problems.join(", ")),
        );
        errors.into_result()
    }
}

fn signature(session_id: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(b".");
    hasher.update(secret.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Cookie value: `<session id>.<signature>`, so a tampered id is rejected
/// before the session store is consulted.
pub fn sign_session_id(session_id: &str, secret: &str) -> String {
    format!("{}.{}", session_id, signature(session_id, secret))
}

/// Verify a cookie value and return the embedded session id.
pub fn verify_cookie_value(value: &str, secret: &str) -> Option<String> {
    let (session_id, sig) = value.rsplit_once('.')?;
    let expected = signature(session_id, secret);
    if constant_time_eq(sig.as_bytes(), expected.as_bytes()) {
        Some(session_id.to_string())
    } else {
        None
    }
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
    fn bcrypt_round_trip() {
        // low cost keeps the test fast; verification is cost-agnostic
        let hash = bcrypt::hash("S3nha!forte", 4).unwrap();
        assert!(verify_password("S3nha!forte", &hash));
        assert!(!verify_password("s3nha!forte", &hash));
        assert!(!verify_password("S3nha!forte", "not-a-hash"));
    }

    #[test]
    fn policy_requires_all_classes() {
        assert!(validate_password_policy("S3nha!forte").is_ok());
        for weak in ["short1!", "alllowercase1!", "ALLUPPERCASE1!", "NoDigits!!", "NoSymbol123"] {
            assert!(validate_password_policy(weak).is_err(), "{} should fail", weak);
        }
    }

    #[test]
    fn cookie_signature_round_trip() {
        let signed = sign_session_id("abc-123", "secret");
        assert_eq!(verify_cookie_value(&signed, "secret").as_deref(), Some("abc-123"));
        assert!(verify_cookie_value(&signed, "other-secret").is_none());
        assert!(verify_cookie_value("abc-123.forged", "secret").is_none());
        assert!(verify_cookie_value("no-signature", "secret").is_none());
    }
}
