use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rolldown::{BundlerOptions, InputItem};
use rolldown_common::{CodeSplittingMode, OutputFormat};
use rolldown_plugin::Plugin;
use rolldown_plugin::__inner::{Pluginable, SharedPluginable};

/// Output module format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Esm,
}

/// Runtime the bundle is resolved for. `Node` keeps Node builtins external
/// and prefers the `node` export condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    Node,
    #[default]
    Browser,
}

/// Options for a single [`build`](crate::build) invocation.
#[derive(Clone)]
pub struct BuildOptions {
    pub entry_point: PathBuf,
    pub outfile: PathBuf,
    pub format: Format,
    pub platform: Platform,
    /// Permit `outfile` to be the entry point itself.
    pub allow_overwrite: bool,
    pub plugins: Vec<SharedPluginable>,
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("entry_point", &self.entry_point)
            .field("outfile", &self.outfile)
            .field("format", &self.format)
            .field("platform", &self.platform)
            .field("allow_overwrite", &self.allow_overwrite)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

impl BuildOptions {
    pub fn new(entry_point: impl Into<PathBuf>, outfile: impl Into<PathBuf>) -> Self {
        Self {
            entry_point: entry_point.into(),
            outfile: outfile.into(),
            format: Format::Esm,
            platform: Platform::default(),
            allow_overwrite: false,
            plugins: Vec::new(),
        }
    }

    pub fn plugin<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(Arc::new(Pluginable::new(plugin)));
        self
    }

    /// Rolldown options for a single self-contained output file. Dynamic
    /// imports are inlined so nothing is left to load at runtime.
    pub(crate) fn to_bundler_options(&self) -> BundlerOptions {
        let format = match self.format {
            Format::Esm => OutputFormat::Esm,
        };
        let platform = match self.platform {
            Platform::Node => rolldown_common::Platform::Node,
            Platform::Browser => rolldown_common::Platform::Browser,
        };
        BundlerOptions {
            input: Some(vec![InputItem {
                name: Some("index".into()),
                import: self.entry_point.to_string_lossy().into_owned(),
            }]),
            cwd: self.entry_point.parent().map(PathBuf::from),
            file: Some(self.outfile.to_string_lossy().into_owned()),
            format: Some(format),
            platform: Some(platform),
            code_splitting: Some(CodeSplittingMode::Bool(false)),
            ..Default::default()
        }
    }
}
