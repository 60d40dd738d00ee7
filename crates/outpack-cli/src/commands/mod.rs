pub mod build;
pub mod init;
pub mod plan;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use outpack_core::{AdapterConfig, BuildMode};
use outpack_pack::ProjectContext;
use tracing::warn;

/// Where the project lives and how it was built.
#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Project directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    pub path: String,
    /// Adapter config, relative to the project directory (.toml or .json)
    #[arg(short, long, default_value = "outpack.toml")]
    pub config: String,
    /// Build mode the site generator ran in
    #[arg(short, long, default_value = "static")]
    pub mode: String,
}

impl ProjectArgs {
    /// Resolve the project root and load its adapter config. A missing
    /// config file falls back to the defaults.
    pub fn load(&self) -> anyhow::Result<(ProjectContext, AdapterConfig)> {
        let root = std::fs::canonicalize(&self.path)
            .with_context(|| format!("project directory '{}' not found", self.path))?;
        let mode: BuildMode = self.mode.parse()?;
        let config = load_config(&root.join(&self.config))?;
        Ok((ProjectContext { root, mode }, config))
    }
}

fn load_config(path: &Path) -> anyhow::Result<AdapterConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "no adapter config, using defaults");
        return Ok(AdapterConfig::default());
    }
    AdapterConfig::from_file(path).with_context(|| format!("failed to load {}", path.display()))
}

pub(crate) fn config_path(project: &str) -> PathBuf {
    Path::new(project).join("outpack.toml")
}
