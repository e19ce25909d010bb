// Envelope encryption for credential secrets
// Decision: AES-256-GCM; every value gets its own data key (DEK), wrapped by a versioned
// key-encryption key (KEK) from configuration
// Decision: Payloads are self-describing JSON so rotation can find values still on an old KEK

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const PAYLOAD_VERSION: u8 = 1;
const ALGORITHM: &str = "AES-256-GCM";

/// Encrypt/decrypt capability handed to services that store secrets.
pub trait SecretCipher: Send + Sync {
    fn encrypt_string(&self, plaintext: &str) -> Result<Vec<u8>>;
    fn decrypt_to_string(&self, data: &[u8]) -> Result<String>;
}

/// Stored form of one encrypted value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub version: u8,
    pub alg: String,
    /// Id of the KEK that wrapped the DEK.
    pub key_id: String,
    /// base64(nonce || wrapped DEK)
    pub dek_wrapped: String,
    /// base64 nonce for the data ciphertext
    pub nonce: String,
    /// base64 ciphertext with GCM tag
    pub ciphertext: String,
}

impl EncryptedPayload {
    fn parse(data: &[u8]) -> Result<Self> {
        let payload: Self =
            serde_json::from_slice(data).context("Encrypted value is not a valid payload")?;
        if payload.version != PAYLOAD_VERSION || payload.alg != ALGORITHM {
            bail!(
                "Unsupported payload (version {}, alg {})",
                payload.version,
                payload.alg
            );
        }
        Ok(payload)
    }
}

/// A KEK parsed from `key_id:base64(32 bytes)`.
struct KeyEncryptionKey {
    id: String,
    cipher: Aes256Gcm,
}

impl FromStr for KeyEncryptionKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (id, encoded) = s
            .split_once(':')
            .filter(|(id, _)| !id.is_empty())
            .ok_or_else(|| anyhow!("Encryption key must look like 'key_id:base64_key'"))?;

        let bytes = BASE64
            .decode(encoded.trim())
            .with_context(|| format!("Encryption key '{}' is not valid base64", id))?;
        if bytes.len() != KEY_LEN {
            bail!(
                "Encryption key '{}' must be {} bytes, got {}",
                id,
                KEY_LEN,
                bytes.len()
            );
        }

        let cipher = Aes256Gcm::new_from_slice(&bytes)
            .map_err(|e| anyhow!("Invalid encryption key '{}': {}", id, e))?;
        Ok(Self {
            id: id.to_string(),
            cipher,
        })
    }
}

fn seal(cipher: &Aes256Gcm, plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;
    Ok((nonce.to_vec(), sealed))
}

fn open(cipher: &Aes256Gcm, nonce: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN {
        bail!("Invalid nonce length {}", nonce.len());
    }
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| anyhow!("Decryption failed (wrong key or corrupted data)"))
}

/// Envelope encryption with a primary KEK for new values and older KEKs kept for decryption.
#[derive(Clone)]
pub struct EncryptionService {
    primary: Arc<KeyEncryptionKey>,
    keyring: Arc<HashMap<String, Aes256Gcm>>,
}

impl EncryptionService {
    /// `primary_key` encrypts new values; `previous_keys` remain readable.
    pub fn new(primary_key: &str, previous_keys: &[&str]) -> Result<Self> {
        let primary: KeyEncryptionKey = primary_key.parse()?;

        let mut keyring = HashMap::new();
        keyring.insert(primary.id.clone(), primary.cipher.clone());
        for raw in previous_keys {
            let key: KeyEncryptionKey = raw.parse()?;
            if keyring.contains_key(&key.id) {
                bail!("Duplicate encryption key id '{}'", key.id);
            }
            keyring.insert(key.id, key.cipher);
        }

        Ok(Self {
            primary: Arc::new(primary),
            keyring: Arc::new(keyring),
        })
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let dek = Aes256Gcm::generate_key(&mut OsRng);
        let dek_cipher = Aes256Gcm::new(&dek);

        let (dek_nonce, wrapped_dek) = seal(&self.primary.cipher, dek.as_slice())?;
        let (nonce, ciphertext) = seal(&dek_cipher, plaintext)?;

        let payload = EncryptedPayload {
            version: PAYLOAD_VERSION,
            alg: ALGORITHM.to_string(),
            key_id: self.primary.id.clone(),
            dek_wrapped: BASE64.encode([dek_nonce, wrapped_dek].concat()),
            nonce: BASE64.encode(nonce),
            ciphertext: BASE64.encode(ciphertext),
        };
        serde_json::to_vec(&payload).context("Failed to serialize encrypted payload")
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let payload = EncryptedPayload::parse(data)?;
        let kek = self
            .keyring
            .get(&payload.key_id)
            .ok_or_else(|| anyhow!("No encryption key loaded for key id '{}'", payload.key_id))?;

        let dek_wrapped = BASE64
            .decode(&payload.dek_wrapped)
            .context("Wrapped data key is not valid base64")?;
        if dek_wrapped.len() <= NONCE_LEN {
            bail!("Wrapped data key is truncated");
        }
        let (dek_nonce, wrapped_dek) = dek_wrapped.split_at(NONCE_LEN);
        let dek = open(kek, dek_nonce, wrapped_dek)?;
        let dek_cipher =
            Aes256Gcm::new_from_slice(&dek).map_err(|_| anyhow!("Unwrapped data key is invalid"))?;

        let nonce = BASE64
            .decode(&payload.nonce)
            .context("Nonce is not valid base64")?;
        let ciphertext = BASE64
            .decode(&payload.ciphertext)
            .context("Ciphertext is not valid base64")?;
        open(&dek_cipher, &nonce, &ciphertext)
    }

    /// Key id recorded in an encrypted value, without decrypting it.
    pub fn key_id_of(data: &[u8]) -> Result<String> {
        Ok(EncryptedPayload::parse(data)?.key_id)
    }

    pub fn is_current_key(&self, data: &[u8]) -> Result<bool> {
        Ok(Self::key_id_of(data)? == self.primary.id)
    }

    /// Move a value onto the primary key. `None` when it is already there.
    pub fn reencrypt(&self, data: &[u8]) -> Result<Option<Vec<u8>>> {
        if self.is_current_key(data)? {
            return Ok(None);
        }
        let plaintext = self.decrypt(data)?;
        self.encrypt(&plaintext).map(Some)
    }

    pub fn primary_key_id(&self) -> &str {
        &self.primary.id
    }

    pub fn available_key_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.keyring.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl SecretCipher for EncryptionService {
    fn encrypt_string(&self, plaintext: &str) -> Result<Vec<u8>> {
        self.encrypt(plaintext.as_bytes())
    }

    fn decrypt_to_string(&self, data: &[u8]) -> Result<String> {
        String::from_utf8(self.decrypt(data)?).context("Decrypted value is not valid UTF-8")
    }
}

/// New random KEK in `key_id:base64_key` form, suitable for `SECRETS_ENCRYPTION_KEY`.
pub fn generate_encryption_key(key_id: &str) -> String {
    let key = Aes256Gcm::generate_key(&mut OsRng);
    format!("{}:{}", key_id, BASE64.encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let service = EncryptionService::new(&generate_encryption_key("primary"), &[]).unwrap();

        let encrypted = service.encrypt_string("x-api-key-123").unwrap();
        assert!(!String::from_utf8_lossy(&encrypted).contains("x-api-key-123"));
        assert_eq!(
            service.decrypt_to_string(&encrypted).unwrap(),
            "x-api-key-123"
        );
    }

    #[test]
    fn test_empty_string_round_trip() {
        let service = EncryptionService::new(&generate_encryption_key("primary"), &[]).unwrap();
        let encrypted = service.encrypt_string("").unwrap();
        assert_eq!(service.decrypt_to_string(&encrypted).unwrap(), "");
    }

    #[test]
    fn test_same_plaintext_encrypts_differently() {
        let service = EncryptionService::new(&generate_encryption_key("primary"), &[]).unwrap();
        let a = service.encrypt_string("secret").unwrap();
        let b = service.encrypt_string("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rotation_reads_old_and_writes_new() {
        let old = generate_encryption_key("2024");
        let new = generate_encryption_key("2025");

        let before = EncryptionService::new(&old, &[])
            .unwrap()
            .encrypt_string("api-secret")
            .unwrap();

        let rotated = EncryptionService::new(&new, &[&old]).unwrap();
        assert_eq!(rotated.decrypt_to_string(&before).unwrap(), "api-secret");
        assert!(!rotated.is_current_key(&before).unwrap());

        let after = rotated.reencrypt(&before).unwrap().unwrap();
        assert_eq!(EncryptionService::key_id_of(&after).unwrap(), "2025");
        assert_eq!(rotated.decrypt_to_string(&after).unwrap(), "api-secret");
        assert!(rotated.reencrypt(&after).unwrap().is_none());
        assert_eq!(rotated.available_key_ids(), vec!["2024", "2025"]);
    }

    #[test]
    fn test_missing_key_cannot_decrypt() {
        let encrypted = EncryptionService::new(&generate_encryption_key("a"), &[])
            .unwrap()
            .encrypt_string("value")
            .unwrap();
        let other = EncryptionService::new(&generate_encryption_key("b"), &[]).unwrap();
        assert!(other.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_wrong_key_material_fails_closed() {
        let encrypted = EncryptionService::new(&generate_encryption_key("same"), &[])
            .unwrap()
            .encrypt_string("value")
            .unwrap();
        let imposter = EncryptionService::new(&generate_encryption_key("same"), &[]).unwrap();
        assert!(imposter.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_is_rejected() {
        let service = EncryptionService::new(&generate_encryption_key("primary"), &[]).unwrap();
        let encrypted = service.encrypt_string("value").unwrap();

        let mut payload: EncryptedPayload = serde_json::from_slice(&encrypted).unwrap();
        let mut bytes = BASE64.decode(&payload.ciphertext).unwrap();
        bytes[0] ^= 0xff;
        payload.ciphertext = BASE64.encode(bytes);

        let tampered = serde_json::to_vec(&payload).unwrap();
        assert!(service.decrypt(&tampered).is_err());
    }

    #[test]
    fn test_rejects_malformed_keys() {
        assert!(EncryptionService::new("missing-separator", &[]).is_err());
        assert!(EncryptionService::new(":AAAA", &[]).is_err());
        assert!(EncryptionService::new("v1:not base64!", &[]).is_err());
        let short = format!("v1:{}", BASE64.encode([7u8; 16]));
        assert!(EncryptionService::new(&short, &[]).is_err());
    }

    #[test]
    fn test_rejects_duplicate_key_ids() {
        let a = generate_encryption_key("v1");
        let b = generate_encryption_key("v1");
        assert!(EncryptionService::new(&a, &[&b]).is_err());
    }

    #[test]
    fn test_payload_records_key_id() {
        let service = EncryptionService::new(&generate_encryption_key("kek-7"), &[]).unwrap();
        let payload: EncryptedPayload =
            serde_json::from_slice(&service.encrypt_string("v").unwrap()).unwrap();
        assert_eq!(payload.version, PAYLOAD_VERSION);
        assert_eq!(payload.alg, ALGORITHM);
        assert_eq!(payload.key_id, "kek-7");
    }
}
