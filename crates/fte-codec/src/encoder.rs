// Format-transforming cipher: encrypt, then unrank the ciphertext into the
// format's language. Decode runs the same steps backwards.

use std::sync::Arc;

use num_bigint::BigUint;

use crate::FteError;
use crate::cipher::{ChaChaCipher, Cipher, CipherKey};
use crate::format::Format;
use crate::framing::{LENGTH_PREFIX, open_frame, seal_frame};

/// Encodes byte messages into strings of a format and back.
///
/// Encoding picks the shortest admissible length `L` whose bucket width `w`
/// fits the cipher overhead, the length prefix and the message; frames the
/// message to exactly `w - overhead` bytes; encrypts it to `w` bytes; and
/// unranks that ciphertext, read as a big-endian integer, at length `L`. The
/// receiver recovers `L` from the string itself and `w` from `L`.
///
/// The cipher is the only state beyond the shared [`Format`], so a
/// `FormatCipher` may be used from many threads at once.
pub struct FormatCipher<C: Cipher = ChaChaCipher> {
    format: Arc<Format>,
    cipher: C,
}

impl FormatCipher<ChaChaCipher> {
    /// A cipher over `format` using ChaCha20-Poly1305 with `key`.
    pub fn new(format: Arc<Format>, key: &CipherKey) -> Self {
        Self::with_cipher(format, ChaChaCipher::new(key))
    }
}

impl<C: Cipher> FormatCipher<C> {
    pub fn with_cipher(format: Arc<Format>, cipher: C) -> Self {
        Self { format, cipher }
    }

    pub fn format(&self) -> &Arc<Format> {
        &self.format
    }

    /// Longest message [`encode`](Self::encode) accepts.
    pub fn max_message_len(&self) -> Result<usize, FteError> {
        self.format.max_payload(self.cipher.overhead())
    }

    /// Encrypt `plaintext` and render it as a string of the format.
    pub fn encode(&self, plaintext: &[u8]) -> Result<Vec<u8>, FteError> {
        let overhead = self.cipher.overhead();
        let needed = overhead + LENGTH_PREFIX + plaintext.len();
        let (length, width) = self.format.select_length(needed)?;

        let frame = seal_frame(plaintext, width - overhead)?;
        let ciphertext = self.cipher.encrypt(&frame)?;
        if ciphertext.len() != width {
            return Err(FteError::CipherLength {
                expected: width,
                actual: ciphertext.len(),
            });
        }

        let value = BigUint::from_bytes_be(&ciphertext);
        let formatted = self.format.codec().unrank(&value, length)?;
        tracing::debug!(
            plaintext_len = plaintext.len(),
            length,
            width,
            "encoded message"
        );
        Ok(formatted)
    }

    /// Recover the plaintext from a formatted string.
    pub fn decode(&self, formatted: &[u8]) -> Result<Vec<u8>, FteError> {
        let length = formatted.len();
        if !self.format.spec().admits_length(length) {
            return Err(FteError::NotAccepted);
        }
        if !self.format.dfa().accepts(formatted) {
            return Err(FteError::NotAccepted);
        }
        let value = self.format.codec().rank(formatted)?;

        let overhead = self.cipher.overhead();
        let width = self.format.bucket_width(length)?;
        if width < overhead + LENGTH_PREFIX || value.bits() > 8 * width as u64 {
            return Err(FteError::Padding);
        }

        let ciphertext = to_fixed_width(&value, width);
        let frame = self.cipher.decrypt(&ciphertext)?;
        let plaintext = open_frame(&frame)?;
        tracing::debug!(plaintext_len = plaintext.len(), length, width, "decoded message");
        Ok(plaintext)
    }
}

impl<C: Cipher> std::fmt::Debug for FormatCipher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatCipher")
            .field("format", &self.format.spec())
            .field("overhead", &self.cipher.overhead())
            .finish_non_exhaustive()
    }
}

/// Big-endian bytes of `value`, left-padded with zeros to `width`.
/// The caller guarantees `value < 256^width`.
fn to_fixed_width(value: &BigUint, width: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    let mut out = vec![0u8; width];
    let skip = bytes.len().saturating_sub(width);
    let tail = &bytes[skip..];
    out[width - tail.len()..].copy_from_slice(tail);
    out
}
