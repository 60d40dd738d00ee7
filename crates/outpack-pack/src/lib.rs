//! outpack: package a static site's functions and manifest for deployment.
//!
//! Declared middleware, edge functions, and serverless functions are each
//! turned into a `functions/<name>.func/` directory holding one bundled
//! entry module and its runtime config; `config.json` is merged with any
//! manifest a previous run left behind.

use sha2::{Digest, Sha256};
use std::path::Path;

pub mod bundle;
pub mod descriptor;
pub mod manifest;
mod orchestrator;
pub mod runtime;
pub mod wasm;

pub use bundle::BundleResult;
pub use descriptor::FunctionDescriptor;
pub use manifest::{DeploymentManifest, Route};
pub use orchestrator::{
    BuildFormat, HostOverride, OUTPUT_DIR, PackagePhase, PackagePlan, PackageReport,
    ProjectContext, STATIC_DIR, materialize, plan, validate_sources,
};
pub use runtime::RuntimeConfig;
pub use wasm::WasmPlugin;

/// Compute SHA-256 hash of a file and return the hex digest.
pub(crate) async fn sha256_file(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let hash = Sha256::digest(&bytes);
    Ok(hex::encode(hash))
}
