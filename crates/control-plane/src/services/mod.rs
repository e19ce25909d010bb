// Services layer for business logic
// Services own business logic and validation, calling storage directly

pub mod article;
pub mod audio;
pub mod image;
pub mod user;
pub mod vault;
pub mod workflow;

pub use article::ArticleService;
pub use audio::AudioService;
pub use image::ImageService;
pub use user::UserService;
pub use vault::{CredentialVault, PostingCredentials, VaultError};
pub use workflow::{Workflow, WorkflowService};
