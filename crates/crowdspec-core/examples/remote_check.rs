// Validate the documents a manifest points to
// Usage: cargo run --example remote_check <manifest.json>

use crowdspec_core::{Error, HttpFetcher, RemoteDocumentValidator};
use crowdspec_schemas::{create_manifest_validator, SchemaValidator};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args().nth(1).ok_or("usage: remote_check <manifest.json>")?;
    let raw = std::fs::read_to_string(&path)?;
    let manifest = create_manifest_validator().validate(&serde_json::from_str(&raw)?)?;

    let validator = RemoteDocumentValidator::new(HttpFetcher::with_default_config()?);
    validator.validate_example_images(&manifest).await?;

    match validator.validate_manifest_uris(&manifest).await {
        Ok(documents) => {
            println!("taskdata entries: {}", documents.taskdata.map_or(0, |t| t.len()));
            println!("groundtruth entries: {}", documents.groundtruth.map_or(0, |g| g.len()));
        }
        Err(Error::Fetch { uri, status, message, .. }) => {
            eprintln!("could not fetch {} ({:?}): {}", uri, status, message);
        }
        Err(other) => return Err(other.into()),
    }

    Ok(())
}
