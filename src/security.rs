use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Identifiers
// =============================================================================

/// Derive a stable user ID from an email address
///
/// The address is trimmed and lowercased, hashed with SHA-256, and the first
/// 16 bytes are encoded as unpadded URL-safe base64 (22 characters). The same
/// email always maps to the same ID, which is what makes duplicate
/// registrations collide in the `users` table.
pub fn user_id_from_email(email: &str) -> String {
    let normalized = email.trim().to_ascii_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    BASE64_URL_SAFE_NO_PAD.encode(&digest[..16])
}

/// Random record ID: a v4 UUID as unpadded URL-safe base64
pub fn new_record_id() -> String {
    BASE64_URL_SAFE_NO_PAD.encode(uuid::Uuid::new_v4().as_bytes())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with a server-side pepper
///
/// `hash = HMAC-SHA256(key = pepper, data = user_id || password)`, hex encoded.
/// Binding the user ID means two users with the same password get different
/// hashes; the pepper lives in the environment, never in the tables.
pub fn hash_password(user_id: &str, password: &str, pepper: &str) -> Option<String> {
    let mac = password_mac(user_id, password, pepper)?;
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Check a password against a stored hash in constant time
pub fn verify_password(user_id: &str, password: &str, pepper: &str, stored_hash: &str) -> bool {
    let stored = match hex::decode(stored_hash) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Stored password hash for {} is not valid hex", user_id);
            return false;
        }
    };

    match password_mac(user_id, password, pepper) {
        Some(mac) => mac.verify_slice(&stored).is_ok(),
        None => false,
    }
}

fn password_mac(user_id: &str, password: &str, pepper: &str) -> Option<HmacSha256> {
    let mut mac = match HmacSha256::new_from_slice(pepper.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return None;
        }
    };
    mac.update(user_id.as_bytes());
    mac.update(password.as_bytes());
    Some(mac)
}
