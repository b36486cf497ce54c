//! Token vault: AES-256-GCM encrypted originals keyed by random token ids

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use aes_gcm::Aes256Gcm;
use aes_gcm::aead::{Aead, KeyInit, Nonce, Payload};
use parking_lot::RwLock;
use rand::{RngCore, rngs::OsRng};
use redact_config::VaultConfig;
use redact_core::{RedactError, RestoreResult, Result};
use time::OffsetDateTime;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::keyring::{KEY_LEN, KeyRing};

const TOKEN_ID_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Encrypted copy of one original text. Secret bytes are zeroed when the record drops.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct TokenRecord {
    ciphertext: Vec<u8>,
    nonce: [u8; NONCE_LEN],
    #[zeroize(skip)]
    created_at: OffsetDateTime,
    #[zeroize(skip)]
    expires_at: OffsetDateTime,
    key_version: u32,
}

/// Snapshot of vault contents for stats
#[derive(Debug, Clone, Default)]
pub struct VaultStats {
    pub total_tokens: usize,
    pub key_version: u32,
    pub retained_keys: usize,
    pub tokens_by_key_version: BTreeMap<u32, usize>,
    pub oldest_token: Option<OffsetDateTime>,
}

/// In-memory token store.
///
/// Locks are held only for map access; encryption and decryption run on copies.
pub struct Vault {
    tokens: RwLock<HashMap<String, TokenRecord>>,
    keys: RwLock<KeyRing>,
}

impl Vault {
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            keys: RwLock::new(KeyRing::new(
                config.pbkdf2_iterations,
                config.retained_key_versions,
            )),
        }
    }

    /// Encrypt `text` under the current key and return a fresh token id
    pub fn mint(&self, text: &str, ttl: Duration) -> Result<String> {
        if ttl.is_zero() {
            return Err(RedactError::InvalidInput("token ttl must be positive".to_string()));
        }

        let created_at = OffsetDateTime::now_utc();
        let expires_at = time::Duration::try_from(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add(ttl))
            .ok_or_else(|| RedactError::InvalidInput(format!("token ttl out of range: {:?}", ttl)))?;

        let (key_version, key) = self
            .keys
            .read()
            .current_key()
            .ok_or_else(|| RedactError::CryptoFailure("no active master key".to_string()))?;

        let mut id_bytes = [0u8; TOKEN_ID_LEN];
        OsRng.fill_bytes(&mut id_bytes);
        let token = hex::encode(id_bytes);

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = seal(&key, &nonce, &token, text.as_bytes())?;

        self.tokens.write().insert(
            token.clone(),
            TokenRecord {
                ciphertext,
                nonce,
                created_at,
                expires_at,
                key_version,
            },
        );

        debug!(key_version, ttl_secs = ttl.as_secs(), "minted token");
        Ok(token)
    }

    pub fn restore(&self, token: &str) -> Result<RestoreResult> {
        self.restore_at(token, OffsetDateTime::now_utc())
    }

    pub(crate) fn restore_at(&self, token: &str, now: OffsetDateTime) -> Result<RestoreResult> {
        let record = self
            .tokens
            .read()
            .get(token)
            .cloned()
            .ok_or(RedactError::TokenNotFound)?;

        if now > record.expires_at {
            return Err(RedactError::TokenExpired);
        }

        let key = self
            .keys
            .read()
            .key(record.key_version)
            .ok_or(RedactError::KeyRetired(record.key_version))?;

        let plaintext = open(&key, &record.nonce, token, &record.ciphertext)?;
        let original_text = String::from_utf8(plaintext)
            .map_err(|_| RedactError::CryptoFailure("restored text is not valid UTF-8".to_string()))?;

        Ok(RestoreResult {
            original_text,
            token: token.to_string(),
            restored_at: now,
            key_version: record.key_version,
        })
    }

    /// Drop a token before it expires. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.write().remove(token).is_some()
    }

    /// Remove every token whose expiry has passed
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(OffsetDateTime::now_utc())
    }

    pub(crate) fn cleanup_at(&self, now: OffsetDateTime) -> usize {
        let mut tokens = self.tokens.write();
        let before = tokens.len();
        tokens.retain(|_, record| record.expires_at >= now);
        let removed = before - tokens.len();
        drop(tokens);

        if removed > 0 {
            info!(removed, "swept expired tokens");
        }
        removed
    }

    /// Make a new master key current. Tokens minted earlier stay under their own version.
    pub fn rotate_keys(&self) -> Result<u32> {
        let mut keys = self.keys.write();
        let version = keys.rotate();
        let retained = keys.versions();
        drop(keys);

        info!(key_version = version, ?retained, "rotated master key");
        Ok(version)
    }

    pub fn key_version(&self) -> u32 {
        self.keys.read().current_version()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }

    pub fn stats(&self) -> VaultStats {
        let (key_version, retained_keys) = {
            let keys = self.keys.read();
            (keys.current_version(), keys.len())
        };

        let tokens = self.tokens.read();
        let mut tokens_by_key_version = BTreeMap::new();
        for record in tokens.values() {
            *tokens_by_key_version.entry(record.key_version).or_insert(0) += 1;
        }

        VaultStats {
            total_tokens: tokens.len(),
            key_version,
            retained_keys,
            tokens_by_key_version,
            oldest_token: tokens.values().map(|r| r.created_at).min(),
        }
    }
}

impl Default for Vault {
    fn default() -> Self {
        Self::new(&VaultConfig::default())
    }
}

// The token id is bound as associated data so a record cannot be replayed under another id.
fn seal(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], token: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| RedactError::CryptoFailure(format!("cipher setup failed: {}", e)))?;

    cipher
        .encrypt(
            Nonce::<Aes256Gcm>::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad: token.as_bytes(),
            },
        )
        .map_err(|_| RedactError::CryptoFailure("encryption failed".to_string()))
}

fn open(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], token: &str, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| RedactError::CryptoFailure(format!("cipher setup failed: {}", e)))?;

    cipher
        .decrypt(
            Nonce::<Aes256Gcm>::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: token.as_bytes(),
            },
        )
        .map_err(|_| RedactError::CryptoFailure("decryption failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn vault(retain: usize) -> Vault {
        Vault::new(&VaultConfig {
            pbkdf2_iterations: 1000,
            retained_key_versions: retain,
        })
    }

    #[test]
    fn test_mint_restore_round_trip() {
        let vault = vault(3);
        let text = "Email: test@example.com, Phone: 555-123-4567";
        let token = vault.mint(text, DAY).unwrap();

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        let restored = vault.restore(&token).unwrap();
        assert_eq!(restored.original_text, text);
        assert_eq!(restored.key_version, 1);
        assert_eq!(vault.cleanup(), 0);
    }

    #[test]
    fn test_round_trip_unicode_and_empty() {
        let vault = vault(3);
        for text in ["", "naïve café ☕ 東京", "line\nbreak\ttab"] {
            let token = vault.mint(text, DAY).unwrap();
            assert_eq!(vault.restore(&token).unwrap().original_text, text);
        }
    }

    #[test]
    fn test_tokens_are_unique() {
        let vault = vault(3);
        let a = vault.mint("same", DAY).unwrap();
        let b = vault.mint("same", DAY).unwrap();
        assert_ne!(a, b);
        assert_eq!(vault.len(), 2);
    }

    #[test]
    fn test_unknown_token() {
        let vault = vault(3);
        assert!(matches!(vault.restore("deadbeef"), Err(RedactError::TokenNotFound)));
    }

    #[test]
    fn test_expired_before_sweep() {
        let vault = vault(3);
        let token = vault.mint("secret", Duration::from_secs(60)).unwrap();
        let later = OffsetDateTime::now_utc() + time::Duration::minutes(5);

        assert!(matches!(vault.restore_at(&token, later), Err(RedactError::TokenExpired)));
        // Still stored until swept
        assert_eq!(vault.len(), 1);
        assert_eq!(vault.cleanup_at(later), 1);
        assert!(matches!(vault.restore(&token), Err(RedactError::TokenNotFound)));
    }

    #[test]
    fn test_cleanup_keeps_live_tokens() {
        let vault = vault(3);
        vault.mint("short", Duration::from_secs(60)).unwrap();
        let long = vault.mint("long", DAY).unwrap();
        let later = OffsetDateTime::now_utc() + time::Duration::hours(1);

        assert_eq!(vault.cleanup_at(later), 1);
        assert_eq!(vault.len(), 1);
        assert_eq!(vault.restore(&long).unwrap().original_text, "long");
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let vault = vault(3);
        assert!(matches!(vault.mint("x", Duration::ZERO), Err(RedactError::InvalidInput(_))));
    }

    #[test]
    fn test_rotation_keeps_old_tokens_restorable() {
        let vault = vault(3);
        let old = vault.mint("before rotation", DAY).unwrap();
        assert_eq!(vault.rotate_keys().unwrap(), 2);
        let new = vault.mint("after rotation", DAY).unwrap();

        let restored = vault.restore(&old).unwrap();
        assert_eq!(restored.original_text, "before rotation");
        assert_eq!(restored.key_version, 1);
        assert_eq!(vault.restore(&new).unwrap().key_version, 2);

        let stats = vault.stats();
        assert_eq!(stats.key_version, 2);
        assert_eq!(stats.retained_keys, 2);
        assert_eq!(stats.tokens_by_key_version.get(&1), Some(&1));
        assert_eq!(stats.tokens_by_key_version.get(&2), Some(&1));
    }

    #[test]
    fn test_evicted_key_reports_retired() {
        let vault = vault(1);
        let token = vault.mint("gone", DAY).unwrap();
        vault.rotate_keys().unwrap();
        assert!(matches!(vault.restore(&token), Err(RedactError::KeyRetired(1))));
    }

    #[test]
    fn test_corrupted_record_is_crypto_failure() {
        let vault = vault(3);
        let token = vault.mint("integrity matters", DAY).unwrap();
        if let Some(record) = vault.tokens.write().get_mut(&token) {
            record.ciphertext[0] ^= 0xff;
        }
        assert!(matches!(vault.restore(&token), Err(RedactError::CryptoFailure(_))));
    }

    #[test]
    fn test_record_bound_to_token_id() {
        let vault = vault(3);
        let a = vault.mint("first", DAY).unwrap();
        let b = vault.mint("second", DAY).unwrap();
        {
            let mut tokens = vault.tokens.write();
            let record = tokens.get(&a).cloned().unwrap();
            tokens.insert(b.clone(), record);
        }
        assert!(matches!(vault.restore(&b), Err(RedactError::CryptoFailure(_))));
    }

    #[test]
    fn test_revoke() {
        let vault = vault(3);
        let token = vault.mint("bye", DAY).unwrap();
        assert!(vault.revoke(&token));
        assert!(!vault.revoke(&token));
        assert!(vault.is_empty());
    }

    #[test]
    fn test_concurrent_mint_restore() {
        let vault = vault(3);
        std::thread::scope(|scope| {
            for worker in 0..8 {
                let vault = &vault;
                scope.spawn(move || {
                    for i in 0..25 {
                        let text = format!("worker {} item {}", worker, i);
                        let token = vault.mint(&text, DAY).unwrap();
                        assert_eq!(vault.restore(&token).unwrap().original_text, text);
                    }
                });
            }
        });
        assert_eq!(vault.len(), 200);
    }
}
