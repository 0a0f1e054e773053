//! In-memory credential store, encrypted with a process-lifetime key
//!
//! Credentials are held encrypted with a ChaCha20-Poly1305 key generated when
//! the vault is created and never persisted or exposed. This keeps plaintext
//! secrets out of casual memory dumps and log output; it is not a boundary
//! against a privileged attacker on the same host.

use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, Key, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::CameError;

/// Nonce length for ChaCha20-Poly1305 (12 bytes)
const NONCE_LEN: usize = 12;

/// One encrypted secret with the nonce it was sealed under
#[derive(Debug, Clone)]
pub(crate) struct SealedSecret {
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl SealedSecret {
    fn scrub(&mut self) {
        self.nonce.zeroize();
        self.ciphertext.zeroize();
        self.ciphertext.clear();
    }
}

/// Opaque snapshot of a vault's encrypted credentials
///
/// Only round-trips through the vault instance that produced it: the sealing
/// key lives for the lifetime of that vault and nowhere else.
#[derive(Debug, Clone)]
pub(crate) struct CredentialBackup {
    username: SealedSecret,
    password: SealedSecret,
}

/// Encrypted-at-rest username/password storage
pub(crate) struct CredentialVault {
    cipher: Option<ChaCha20Poly1305>,
    username: SealedSecret,
    password: SealedSecret,
}

// Neither the cipher nor the sealed secrets belong in debug output.
impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("scrubbed", &self.cipher.is_none())
            .finish_non_exhaustive()
    }
}

impl CredentialVault {
    /// Create a vault with a freshly generated process-lifetime key
    pub fn new(username: &str, password: &str) -> Self {
        let mut key_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut key_bytes);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key_bytes));
        key_bytes.zeroize();

        let username = Self::seal(&cipher, username);
        let password = Self::seal(&cipher, password);

        Self {
            cipher: Some(cipher),
            username,
            password,
        }
    }

    /// Replace both credentials, re-encrypting under the existing key
    pub fn set(&mut self, username: &str, password: &str) -> Result<(), CameError> {
        let cipher = self.cipher()?;
        let username = Self::seal(cipher, username);
        let password = Self::seal(cipher, password);
        self.username.scrub();
        self.password.scrub();
        self.username = username;
        self.password = password;
        Ok(())
    }

    /// Decrypt the stored username
    pub fn username(&self) -> Result<Zeroizing<String>, CameError> {
        self.open(&self.username)
    }

    /// Decrypt the stored password
    pub fn password(&self) -> Result<Zeroizing<String>, CameError> {
        self.open(&self.password)
    }

    /// Snapshot the encrypted credentials for a later [`import`](Self::import)
    pub fn export(&self) -> CredentialBackup {
        CredentialBackup {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Overwrite the stored credentials with a prior snapshot, verbatim
    pub fn import(&mut self, backup: CredentialBackup) {
        self.username.scrub();
        self.password.scrub();
        self.username = backup.username;
        self.password = backup.password;
    }

    /// Irreversibly destroy the key and both secrets
    ///
    /// Any decryption attempted afterwards fails; callers reaching that point
    /// are using a disposed session.
    pub fn scrub(&mut self) {
        self.cipher = None;
        self.username.scrub();
        self.password.scrub();
    }

    fn cipher(&self) -> Result<&ChaCha20Poly1305, CameError> {
        self.cipher
            .as_ref()
            .ok_or_else(|| CameError::Auth("Credentials no longer available (disposed)".to_string()))
    }

    fn seal(cipher: &ChaCha20Poly1305, plaintext: &str) -> SealedSecret {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        // Encryption with a valid key and fresh nonce cannot fail; an empty
        // ciphertext decrypts to an error, which is the disposed-vault path.
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .unwrap_or_default();
        SealedSecret { nonce, ciphertext }
    }

    fn open(&self, sealed: &SealedSecret) -> Result<Zeroizing<String>, CameError> {
        let cipher = self.cipher()?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .map_err(|_| CameError::Auth("Credentials no longer available (disposed)".to_string()))?;
        let text = String::from_utf8(plaintext)
            .map_err(|_| CameError::Auth("Credentials no longer available (disposed)".to_string()))?;
        Ok(Zeroizing::new(text))
    }
}
