// User service: signup and password login

use std::sync::Arc;

use crate::auth::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::storage::{CreateUserRow, StorageBackend, UniqueViolation, UserRow};

const EMAIL_TAKEN: &str = "Email already registered";

pub struct UserService {
    db: Arc<StorageBackend>,
}

impl UserService {
    pub fn new(db: Arc<StorageBackend>) -> Self {
        Self { db }
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserRow, ApiError> {
        if self.db.get_user_by_email(email).await?.is_some() {
            return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let password_hash = hash_password(password)?;
        let created = self
            .db
            .create_user(CreateUserRow {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User signed up");
                Ok(user)
            }
            // Lost a race with a concurrent signup for the same email
            Err(e) if UniqueViolation::is(&e) => Err(ApiError::Conflict(EMAIL_TAKEN.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserRow, ApiError> {
        let user = self
            .db
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ApiError::Unauthorized("Incorrect password".to_string()));
        }

        Ok(user)
    }
}
