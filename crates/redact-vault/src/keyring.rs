//! Versioned master keys derived with PBKDF2-HMAC-SHA256

use std::collections::BTreeMap;

use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use time::OffsetDateTime;
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 16;

struct MasterKey {
    key: Zeroizing<[u8; KEY_LEN]>,
    created_at: OffsetDateTime,
}

/// Bounded ring of master keys indexed by version.
///
/// Every key is derived from one random per-ring seed and a fresh salt. The newest
/// `retain` versions are kept; older ones are dropped (and zeroed) on rotation.
pub struct KeyRing {
    seed: Zeroizing<[u8; KEY_LEN]>,
    keys: BTreeMap<u32, MasterKey>,
    current: u32,
    retain: usize,
    iterations: u32,
}

impl KeyRing {
    pub fn new(iterations: u32, retain: usize) -> Self {
        let mut seed = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut seed[..]);

        let mut ring = Self {
            seed,
            keys: BTreeMap::new(),
            current: 0,
            retain: retain.max(1),
            iterations: iterations.max(1),
        };
        ring.rotate();
        ring
    }

    fn derive(&self, salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2::pbkdf2_hmac::<Sha256>(&self.seed[..], salt, self.iterations, &mut key[..]);
        key
    }

    /// Derive a key under a new salt and make it current. Returns the new version.
    pub fn rotate(&mut self) -> u32 {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = self.derive(&salt);
        self.current += 1;
        self.keys.insert(
            self.current,
            MasterKey {
                key,
                created_at: OffsetDateTime::now_utc(),
            },
        );

        while self.keys.len() > self.retain {
            self.keys.pop_first();
        }

        self.current
    }

    pub fn current_version(&self) -> u32 {
        self.current
    }

    /// Copy of the current key, for use outside the ring's lock
    pub fn current_key(&self) -> Option<(u32, Zeroizing<[u8; KEY_LEN]>)> {
        self.key(self.current).map(|key| (self.current, key))
    }

    pub fn key(&self, version: u32) -> Option<Zeroizing<[u8; KEY_LEN]>> {
        self.keys.get(&version).map(|k| k.key.clone())
    }

    pub fn created_at(&self, version: u32) -> Option<OffsetDateTime> {
        self.keys.get(&version).map(|k| k.created_at)
    }

    /// Retained versions, oldest first
    pub fn versions(&self) -> Vec<u32> {
        self.keys.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ring_starts_at_version_one() {
        let ring = KeyRing::new(1000, 3);
        assert_eq!(ring.current_version(), 1);
        assert_eq!(ring.versions(), vec![1]);
        assert!(ring.current_key().is_some());
    }

    #[test]
    fn test_rotation_derives_distinct_keys() {
        let mut ring = KeyRing::new(1000, 3);
        let first = ring.key(1).unwrap();
        assert_eq!(ring.rotate(), 2);
        let second = ring.key(2).unwrap();
        assert_ne!(*first, *second);
    }

    #[test]
    fn test_rotation_evicts_oldest() {
        let mut ring = KeyRing::new(1000, 2);
        ring.rotate();
        ring.rotate();
        assert_eq!(ring.current_version(), 3);
        assert_eq!(ring.versions(), vec![2, 3]);
        assert!(ring.key(1).is_none());
    }

    #[test]
    fn test_zero_retain_keeps_current() {
        let mut ring = KeyRing::new(1000, 0);
        ring.rotate();
        assert_eq!(ring.versions(), vec![2]);
    }
}
