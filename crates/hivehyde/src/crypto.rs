//! Key material handling and the cryptographic half of the signing
//! pipeline: HMAC-SHA256 over the signing record and the AES-256-CBC
//! fingerprint envelope. Primitives come from the RustCrypto crates; only
//! key parsing and composition live here.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::error::HiveHydeError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Hex length of a session key on the wire (32 raw bytes).
pub const SESSION_KEY_HEX_LEN: usize = 64;

const NONCE_SUFFIX_LEN: usize = 8;
const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Parses a 64-hex-character session key into its 32 raw bytes.
pub fn parse_session_key(key_hex: &str) -> Result<[u8; 32], HiveHydeError> {
    let mut key = [0u8; 32];
    hex::decode_to_slice(key_hex, &mut key)
        .map_err(|source| HiveHydeError::SessionKeyFormat { source })?;
    Ok(key)
}

/// Derives the AES IV from a session key: its first 32 hex characters
/// parsed as 16 raw bytes (equivalently, the first half of the parsed
/// key).
pub fn derive_iv(key: &[u8; 32]) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&key[..16]);
    iv
}

/// Encrypts the raw fingerprint JSON under the session key with
/// AES-256-CBC/PKCS7 and returns the base64 ciphertext.
pub fn encrypt_fingerprint(key_hex: &str, plaintext: &str) -> Result<String, HiveHydeError> {
    let key = parse_session_key(key_hex)?;
    let iv = derive_iv(&key);
    let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    Ok(BASE64.encode(ciphertext))
}

/// Decrypts a fingerprint envelope back to its JSON plaintext. The server
/// side of the protocol; exposed for verification mirrors and tests.
pub fn decrypt_fingerprint(key_hex: &str, ciphertext_b64: &str) -> Result<String, HiveHydeError> {
    let key = parse_session_key(key_hex)?;
    let iv = derive_iv(&key);
    let ciphertext = BASE64
        .decode(ciphertext_b64)
        .map_err(|source| HiveHydeError::FingerprintDecode { source })?;
    let plaintext = Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| HiveHydeError::FingerprintDecrypt)?;
    String::from_utf8(plaintext).map_err(|_| HiveHydeError::FingerprintDecrypt)
}

/// HMAC-SHA256 over `message`, returned as lowercase hex.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> Result<String, HiveHydeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|_| HiveHydeError::Signing { context: "hmac key" })?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Builds a `<timestamp>-<8 base36 chars>` nonce.
pub fn generate_nonce(timestamp_ms: u64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..NONCE_SUFFIX_LEN)
        .map(|_| BASE36_ALPHABET[rng.gen_range(0..BASE36_ALPHABET.len())] as char)
        .collect();
    format!("{timestamp_ms}-{suffix}")
}
