// Authenticated cipher used underneath the format codec.

use chacha20poly1305::ChaCha20Poly1305;
use chacha20poly1305::aead::{Aead, KeyInit};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::FteError;

/// Key size in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the random nonce prefixed to every ciphertext.
pub const NONCE_SIZE: usize = 12;
/// Poly1305 tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey([u8; KEY_SIZE]);

impl CipherKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Copy a key out of a slice of exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FteError> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| FteError::InvalidKey {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    /// A fresh key from the operating system RNG.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// The raw key bytes. This is secret material.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey(..)")
    }
}

/// An authenticated symmetric cipher with a fixed expansion.
///
/// `encrypt` must return exactly `plaintext.len() + overhead()` bytes; the
/// format codec relies on this to fill a capacity bucket exactly. `decrypt`
/// must fail with [`FteError::CipherAuth`] on any tampering.
pub trait Cipher {
    /// Bytes added to every plaintext.
    fn overhead(&self) -> usize;

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, FteError>;

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, FteError>;
}

/// ChaCha20-Poly1305 with a random nonce per message.
///
/// Output layout is `nonce (12) || ciphertext || tag (16)`. Random nonces
/// make ciphertexts of the same plaintext unlinkable, which in turn makes
/// the formatted outputs unlinkable.
pub struct ChaChaCipher {
    cipher: ChaCha20Poly1305,
}

impl ChaChaCipher {
    pub fn new(key: &CipherKey) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(key.as_bytes().into()),
        }
    }
}

impl std::fmt::Debug for ChaChaCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaChaCipher")
            .field("overhead", &self.overhead())
            .finish_non_exhaustive()
    }
}

impl Cipher for ChaChaCipher {
    fn overhead(&self) -> usize {
        NONCE_SIZE + TAG_SIZE
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, FteError> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let sealed = self
            .cipher
            .encrypt((&nonce).into(), plaintext)
            .map_err(|_| FteError::CipherAuth)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, FteError> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(FteError::CipherAuth);
        }
        let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(nonce.into(), sealed)
            .map_err(|_| FteError::CipherAuth)
    }
}
