// Credential vault for X posting credentials
// Decision: API key and secret are encrypted independently; the bearer token is stored as given
// Decision: Decrypted values live only inside PostingCredentials and never reach logs

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::storage::{SecretCipher, StorageBackend, UpsertXCredentialRow, XCredentialRow};

pub const INCOMPLETE_MESSAGE: &str = "X credentials are incomplete. Please fill them out again.";

#[derive(Debug, Error)]
pub enum VaultError {
    /// No row, an empty field, or a value that no longer decrypts
    #[error("{}", INCOMPLETE_MESSAGE)]
    Incomplete,

    #[error("Credential storage is not configured")]
    NotConfigured,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Incomplete => ApiError::Validation(err.to_string()),
            VaultError::NotConfigured => ApiError::NotConfigured(err.to_string()),
            VaultError::Storage(e) => ApiError::Internal(e),
        }
    }
}

/// Decrypted credentials for one outbound post.
pub struct PostingCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub bearer_token: String,
}

impl fmt::Debug for PostingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostingCredentials")
            .field("api_key", &"[redacted]")
            .field("api_secret", &"[redacted]")
            .field("bearer_token", &"[redacted]")
            .finish()
    }
}

pub struct CredentialVault {
    db: Arc<StorageBackend>,
    cipher: Option<Arc<dyn SecretCipher>>,
}

impl CredentialVault {
    pub fn new(db: Arc<StorageBackend>, cipher: Option<Arc<dyn SecretCipher>>) -> Self {
        Self { db, cipher }
    }

    fn cipher(&self) -> Result<&dyn SecretCipher, VaultError> {
        self.cipher.as_deref().ok_or(VaultError::NotConfigured)
    }

    /// Encrypt and store, replacing any existing row for the user.
    pub async fn save(
        &self,
        user_id: Uuid,
        api_key: &str,
        api_secret: &str,
        bearer_token: &str,
    ) -> Result<(), VaultError> {
        let cipher = self.cipher()?;
        let row = UpsertXCredentialRow {
            user_id,
            api_key_encrypted: cipher.encrypt_string(api_key)?,
            api_secret_encrypted: cipher.encrypt_string(api_secret)?,
            bearer_token: bearer_token.to_string(),
        };
        self.db.upsert_x_credential(row).await?;

        tracing::info!(user_id = %user_id, "X credentials saved");
        Ok(())
    }

    /// Idempotent.
    pub async fn remove(&self, user_id: Uuid) -> Result<(), VaultError> {
        if self.db.delete_x_credential(user_id).await? {
            tracing::info!(user_id = %user_id, "X credentials removed");
        }
        Ok(())
    }

    /// Whether the user has a stored credential row.
    pub async fn status(&self, user_id: Uuid) -> Result<bool, VaultError> {
        Ok(self.db.has_x_credential(user_id).await?)
    }

    pub async fn load_for_posting(&self, user_id: Uuid) -> Result<PostingCredentials, VaultError> {
        let cipher = self.cipher()?;
        let row = self
            .db
            .get_x_credential(user_id)
            .await?
            .ok_or(VaultError::Incomplete)?;

        let credentials = decrypt_row(cipher, &row)?;
        if credentials.api_key.trim().is_empty()
            || credentials.api_secret.trim().is_empty()
            || credentials.bearer_token.trim().is_empty()
        {
            return Err(VaultError::Incomplete);
        }
        Ok(credentials)
    }
}

fn decrypt_row(
    cipher: &dyn SecretCipher,
    row: &XCredentialRow,
) -> Result<PostingCredentials, VaultError> {
    let decrypt = |data: &[u8], field: &str| {
        cipher.decrypt_to_string(data).map_err(|e| {
            tracing::warn!(
                user_id = %row.user_id,
                field,
                "Stored X credential does not decrypt: {:#}",
                e
            );
            VaultError::Incomplete
        })
    };

    Ok(PostingCredentials {
        api_key: decrypt(&row.api_key_encrypted, "api_key")?,
        api_secret: decrypt(&row.api_secret_encrypted, "api_secret")?,
        bearer_token: row.bearer_token.clone(),
    })
}
