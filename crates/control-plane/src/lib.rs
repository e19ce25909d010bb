// ContentDesk Control Plane Library
// Decision: Shared library for binaries (API server, CLI tools) and integration tests

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Router assembly
pub mod app;

// Authentication module
pub mod auth;

pub mod config;
pub mod error;

// Services layer
pub mod services;

// Storage layer
pub mod storage;

// OpenAPI document generation
pub mod openapi;

pub mod telemetry;

pub use app::{build_router, AppContext};
pub use config::AppConfig;
pub use error::ApiError;
