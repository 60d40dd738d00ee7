//! Function bundler: one self-contained entry module per descriptor.
//!
//! Edge and serverless functions go through the bundler with the wasm plugin
//! attached. Middleware is already plain JavaScript and is copied byte for
//! byte.

use std::path::{Path, PathBuf};

use outpack_bundler::{BuildOptions, Format, Platform};
use outpack_core::{BundlingFailure, FunctionRole};
use tracing::{debug, info};

use crate::descriptor::FunctionDescriptor;
use crate::sha256_file;
use crate::wasm::WasmPlugin;

/// A function entry module written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResult {
    pub role: FunctionRole,
    pub source_path: PathBuf,
    pub bundle_dir: PathBuf,
    pub entry_file: PathBuf,
    pub size_bytes: u64,
    pub sha256: String,
    /// Modules rendered into the entry; 1 for copied middleware.
    pub module_count: usize,
}

/// Bundler options for an edge or serverless function.
pub fn build_options(descriptor: &FunctionDescriptor) -> Result<BuildOptions, regex::Error> {
    let mut options =
        BuildOptions::new(&descriptor.source_path, &descriptor.entry_file).plugin(WasmPlugin::new()?);
    options.format = Format::Esm;
    options.platform = match descriptor.role {
        FunctionRole::ServerlessFunction => Platform::Node,
        FunctionRole::EdgeFunction | FunctionRole::Middleware => Platform::Browser,
    };
    options.allow_overwrite = true;
    Ok(options)
}

/// Create the bundle directory and write the descriptor's entry module.
pub async fn bundle(descriptor: &FunctionDescriptor) -> Result<BundleResult, BundlingFailure> {
    let fail = |message: String| BundlingFailure {
        source_path: descriptor.source_path.clone(),
        role: descriptor.role,
        message,
    };

    tokio::fs::create_dir_all(&descriptor.bundle_dir)
        .await
        .map_err(|e| fail(format!("failed to create {}: {e}", descriptor.bundle_dir.display())))?;

    let module_count = if descriptor.role.is_bundled() {
        let options =
            build_options(descriptor).map_err(|e| fail(format!("invalid wasm import filter: {e}")))?;
        debug!(function = %descriptor.source_path.display(), ?options, "bundling");
        let output = outpack_bundler::build(&options)
            .await
            .map_err(|failure| fail(failure.to_string()))?;
        output.module_count
    } else {
        copy_verbatim(&descriptor.source_path, &descriptor.entry_file)
            .await
            .map_err(fail)?;
        1
    };

    let size_bytes = tokio::fs::metadata(&descriptor.entry_file)
        .await
        .map(|m| m.len())
        .map_err(|e| fail(format!("failed to stat {}: {e}", descriptor.entry_file.display())))?;
    let sha256 = sha256_file(&descriptor.entry_file)
        .await
        .map_err(|e| fail(format!("failed to hash {}: {e}", descriptor.entry_file.display())))?;

    info!(
        function = %descriptor.source_path.display(),
        role = ?descriptor.role,
        bytes = size_bytes,
        modules = module_count,
        "function packaged"
    );
    Ok(BundleResult {
        role: descriptor.role,
        source_path: descriptor.source_path.clone(),
        bundle_dir: descriptor.bundle_dir.clone(),
        entry_file: descriptor.entry_file.clone(),
        size_bytes,
        sha256,
        module_count,
    })
}

async fn copy_verbatim(from: &Path, to: &Path) -> Result<(), String> {
    tokio::fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|e| format!("failed to copy {} to {}: {e}", from.display(), to.display()))
}
