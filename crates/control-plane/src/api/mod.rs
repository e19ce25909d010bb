// HTTP API routes
//
// Each submodule handles one resource with its own state.

pub mod articles;
pub mod common;
pub mod generated_audio;
pub mod generated_images;
pub mod proxy;
pub mod validation;
pub mod x_credentials;

pub use common::{ErrorResponse, StatusResponse};
