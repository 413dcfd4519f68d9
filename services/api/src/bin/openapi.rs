//! services/api/src/bin/openapi.rs
//!
//! Dumps the study companion's OpenAPI document so front-end clients can be
//! generated without starting the server.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use api_lib::web::rest::ApiDoc;
use std::error::Error;
use std::path::Path;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn write_document(output: &Path) -> Result<(), Box<dyn Error>> {
    let doc = ApiDoc::openapi();
    std::fs::write(output, doc.to_pretty_json()?)?;
    println!("Wrote {} paths to {}", doc.paths.paths.len(), output.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    write_document(Path::new(&output))
}
