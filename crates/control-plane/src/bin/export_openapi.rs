// Export OpenAPI documentification as JSON
//
// Usage: cargo run --bin export-openapi > docs/api/openapi.json
//
// Generates the document without starting the API server, for CI and documentation builds.

use anyhow::{Context, Result};
use contentdesk_control_plane::openapi::ApiDoc;

fn main() -> Result<()> {
    let json = ApiDoc::to_json().context("Failed to serialize OpenAPI document")?;
    println!("{}", json);
    Ok(())
}
