//! Single-file ES module builds for function handlers.
//!
//! A thin layer over rolldown: the entry point and everything it imports,
//! dynamic imports included, land in one output file. Plugins registered on
//! [`BuildOptions`] see every resolve and load.

pub mod error;
pub mod options;

use std::path::PathBuf;

use rolldown::BundlerBuilder;
use rolldown_common::Output;
use tracing::{debug, info, warn};

pub use error::{BuildFailure, Message};
pub use options::{BuildOptions, Format, Platform};

/// Result of a successful [`build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub outfile: PathBuf,
    pub size_bytes: u64,
    /// Modules rendered into the output, the entry point included.
    pub module_count: usize,
}

/// Bundle `options.entry_point` into `options.outfile`.
pub async fn build(options: &BuildOptions) -> Result<BuildOutput, BuildFailure> {
    if !options.allow_overwrite && options.outfile == options.entry_point {
        return Err(BuildFailure::single(Message::at(
            &options.outfile,
            "Refusing to overwrite input file",
        )));
    }

    let write_failed = |err: std::io::Error| {
        BuildFailure::single(Message::at(
            &options.outfile,
            format!("Failed to write output file: {err}"),
        ))
    };
    if let Some(parent) = options.outfile.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    debug!(entry = %options.entry_point.display(), ?options, "starting build");
    let mut bundler = BundlerBuilder::default()
        .with_options(options.to_bundler_options())
        .with_plugins(options.plugins.clone())
        .build()
        .map_err(|err| BuildFailure::single(Message::new(format!("invalid bundler options: {err:?}"))))?;

    let output = bundler
        .write()
        .await
        .map_err(|diagnostics| BuildFailure::from_diagnostics(diagnostics.into_vec()))?;
    for warning in &output.warnings {
        warn!(entry = %options.entry_point.display(), "{warning}");
    }

    let module_count = output
        .assets
        .iter()
        .map(|asset| match asset {
            Output::Chunk(chunk) => chunk.module_ids.len(),
            Output::Asset(_) => 0,
        })
        .sum();
    let size_bytes = tokio::fs::metadata(&options.outfile)
        .await
        .map_err(write_failed)?
        .len();

    let output = BuildOutput {
        outfile: options.outfile.clone(),
        size_bytes,
        module_count,
    };
    info!(
        outfile = %output.outfile.display(),
        size = output.size_bytes,
        modules = output.module_count,
        "bundle written"
    );
    Ok(output)
}
