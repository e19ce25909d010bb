// Storage layer for the ContentDesk control plane
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)

pub mod backend;
pub mod encryption;
pub mod memory;
pub mod models;
pub mod repositories;

pub use backend::StorageBackend;
pub use encryption::{
    generate_encryption_key, EncryptedPayload, EncryptionService, SecretCipher,
};
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::Database;
