//! Reversible tokens: authenticated encryption of original text with expiry and key rotation

pub mod keyring;
pub mod vault;

pub use keyring::KeyRing;
pub use vault::{Vault, VaultStats};
