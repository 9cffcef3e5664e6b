/// Symmetric Field Codec
///
/// AES-256-CBC with PKCS7 padding, in two modes over the same cipher:
///
/// - Randomized: fresh random IV per call, output is base64(IV || ct).
///   Identical plaintexts encrypt differently every time. Used for
///   fields retrieved only by primary key (phone numbers).
/// - Deterministic: all-zero IV, output is base64(ct). Identical
///   plaintexts always produce identical ciphertext, which makes the
///   column searchable by equality but leaks repetition patterns to
///   anyone with database read access. Kept bit-compatible with stored
///   values; do not extend to new fields.
///
/// The two outputs are not self-describing: callers must know which mode
/// produced a stored value.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const KEY_LENGTH: usize = 32;
const BLOCK_SIZE: usize = 16;

/// Reversible encryption for sensitive stored fields.
#[derive(Clone)]
pub struct FieldCodec {
    key: [u8; KEY_LENGTH],
}

impl FieldCodec {
    /// Build a codec from the configured key string.
    ///
    /// The string is space-padded or truncated to exactly 32 bytes, so a
    /// short configured key still yields the same cipher key across
    /// deployments.
    pub fn new(key: &str) -> Self {
        let mut padded = [b' '; KEY_LENGTH];
        let bytes = key.as_bytes();
        let len = bytes.len().min(KEY_LENGTH);
        padded[..len].copy_from_slice(&bytes[..len]);
        Self { key: padded }
    }

    /// Randomized mode: encrypt with a fresh random IV.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; BLOCK_SIZE];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new((&self.key).into(), (&iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut output = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
        output.extend_from_slice(&iv);
        output.extend_from_slice(&ciphertext);
        BASE64_STANDARD.encode(output)
    }

    /// Randomized mode: decrypt base64(IV || ct).
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let raw = BASE64_STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;

        if raw.len() < BLOCK_SIZE * 2 || (raw.len() - BLOCK_SIZE) % BLOCK_SIZE != 0 {
            return Err(CryptoError::MalformedCiphertext);
        }

        let (iv, ciphertext) = raw.split_at(BLOCK_SIZE);
        let iv: [u8; BLOCK_SIZE] = iv.try_into().map_err(|_| CryptoError::MalformedCiphertext)?;

        self.decrypt_raw(&iv, ciphertext)
    }

    /// Deterministic mode: encrypt with the fixed all-zero IV.
    /// Equal plaintexts produce equal ciphertexts.
    pub fn encrypt_deterministic(&self, plaintext: &str) -> String {
        let iv = [0u8; BLOCK_SIZE];

        let ciphertext = Aes256CbcEnc::new((&self.key).into(), (&iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        BASE64_STANDARD.encode(ciphertext)
    }

    /// Deterministic mode: decrypt base64(ct) produced with the zero IV.
    pub fn decrypt_deterministic(&self, encoded: &str) -> Result<String, CryptoError> {
        let ciphertext = BASE64_STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;

        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::MalformedCiphertext);
        }

        let iv = [0u8; BLOCK_SIZE];
        self.decrypt_raw(&iv, &ciphertext)
    }

    fn decrypt_raw(&self, iv: &[u8; BLOCK_SIZE], ciphertext: &[u8]) -> Result<String, CryptoError> {
        let plaintext = Aes256CbcDec::new((&self.key).into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::InvalidPadding)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidPlaintext)
    }
}

impl std::fmt::Debug for FieldCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCodec")
            .field("key", &"***redacted***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> FieldCodec {
        FieldCodec::new("intra-calendar-0123456789!@#$%^&*")
    }

    #[test]
    fn randomized_round_trip() {
        let codec = test_codec();
        let plaintext = "010-1234-5678";

        let encrypted = codec.encrypt(plaintext);
        let decrypted = codec.decrypt(&encrypted).expect("decrypt");

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn randomized_mode_never_repeats_ciphertext() {
        let codec = test_codec();

        let a = codec.encrypt("010-1234-5678");
        let b = codec.encrypt("010-1234-5678");

        assert_ne!(a, b);
        assert_eq!(codec.decrypt(&a).unwrap(), codec.decrypt(&b).unwrap());
    }

    #[test]
    fn deterministic_round_trip() {
        let codec = test_codec();
        let plaintext = "someone@example.com";

        let encrypted = codec.encrypt_deterministic(plaintext);
        let decrypted = codec.decrypt_deterministic(&encrypted).expect("decrypt");

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn deterministic_mode_always_repeats_ciphertext() {
        let codec = test_codec();

        let a = codec.encrypt_deterministic("010-1234-5678");
        let b = codec.encrypt_deterministic("010-1234-5678");

        assert_eq!(a, b);
    }

    #[test]
    fn handles_multibyte_utf8() {
        let codec = test_codec();
        let plaintext = "연락처 010-1234-5678";

        let encrypted = codec.encrypt(plaintext);
        assert_eq!(codec.decrypt(&encrypted).unwrap(), plaintext);
    }

    #[test]
    fn block_aligned_plaintext_still_round_trips() {
        // Exactly one block; PKCS7 must append a full padding block.
        let codec = test_codec();
        let plaintext = "0123456789abcdef";

        let encrypted = codec.encrypt(plaintext);
        assert_eq!(codec.decrypt(&encrypted).unwrap(), plaintext);
    }

    #[test]
    fn short_key_is_space_padded() {
        let a = FieldCodec::new("short-key");
        let b = FieldCodec::new("short-key                       ");

        let ct = a.encrypt_deterministic("value");
        assert_eq!(b.decrypt_deterministic(&ct).unwrap(), "value");
    }

    #[test]
    fn garbled_ciphertext_fails_loudly() {
        let codec = test_codec();

        assert!(codec.decrypt("not-base64!!!").is_err());
        // Valid base64, wrong length for IV + one block
        assert!(matches!(
            codec.decrypt(&BASE64_STANDARD.encode([0u8; 8])),
            Err(CryptoError::MalformedCiphertext)
        ));
    }
}
