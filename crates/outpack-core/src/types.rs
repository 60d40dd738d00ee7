//! Shared types used across outpack crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution class of a declared source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionRole {
    /// Platform-level request interceptor, runs before route dispatch.
    Middleware,
    /// Runs in the lightweight distributed edge runtime.
    EdgeFunction,
    /// Runs in the managed Node.js server runtime.
    ServerlessFunction,
}

impl FunctionRole {
    pub fn label(&self) -> &'static str {
        match self {
            FunctionRole::Middleware => "middleware",
            FunctionRole::EdgeFunction => "edge function",
            FunctionRole::ServerlessFunction => "serverless function",
        }
    }

    /// Middleware is plain JavaScript and is copied, not bundled.
    pub fn is_bundled(&self) -> bool {
        !matches!(self, FunctionRole::Middleware)
    }
}

impl fmt::Display for FunctionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A source file as declared in the adapter config, before any path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSource {
    /// Path relative to the project source root.
    pub path: String,
    pub role: FunctionRole,
}

impl DeclaredSource {
    pub fn new(path: impl Into<String>, role: FunctionRole) -> Self {
        Self {
            path: path.into(),
            role,
        }
    }

    /// The file extension without the leading dot, if any.
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.path.rsplit(['/', '\\']).next()?;
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            None
        } else {
            Some(ext)
        }
    }
}

/// Source languages that need a separate compile step and cannot be packaged as-is.
pub const DISALLOWED_SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];
