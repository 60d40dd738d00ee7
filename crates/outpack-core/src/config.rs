//! Adapter configuration parser (`outpack.toml` or `outpack.json`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::PackError;
use crate::types::{DeclaredSource, FunctionRole};

/// Caller-supplied adapter configuration.
///
/// Keys are camelCase so the same document works as TOML or JSON. The image
/// settings sit at the top level and are copied verbatim into the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    #[serde(flatten)]
    pub images: ImagesConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middleware: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub serverless_functions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edge_functions: Vec<String>,
}

/// Image optimization settings written to the manifest's `images` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesConfig {
    #[serde(default = "default_sizes")]
    pub sizes: Vec<u32>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_patterns: Option<Vec<RemotePattern>>,
    /// Seconds.
    #[serde(
        rename = "minimumCacheTTL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_cache_ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<ImageFormat>>,
    #[serde(
        rename = "dangerouslyAllowSVG",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dangerously_allow_svg: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_security_policy: Option<String>,
}

fn default_sizes() -> Vec<u32> {
    vec![640, 750, 828, 1080, 1200]
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            domains: Vec::new(),
            remote_patterns: None,
            minimum_cache_ttl: None,
            formats: None,
            dangerously_allow_svg: None,
            content_security_policy: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathname: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    #[serde(rename = "image/avif")]
    Avif,
    #[serde(rename = "image/webp")]
    Webp,
}

/// Output mode declared by the host site generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Static,
    Server,
    Hybrid,
}

impl FromStr for BuildMode {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(BuildMode::Static),
            "server" => Ok(BuildMode::Server),
            "hybrid" => Ok(BuildMode::Hybrid),
            other => Err(PackError::config(format!(
                "unknown build mode '{other}'. Supported: static, server, hybrid"
            ))),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildMode::Static => "static",
            BuildMode::Server => "server",
            BuildMode::Hybrid => "hybrid",
        })
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::scaffold()
    }
}

impl AdapterConfig {
    /// Load from a `.json` file, or TOML for any other extension.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Minimal config with default image sizes and no functions.
    pub fn scaffold() -> Self {
        AdapterConfig {
            images: ImagesConfig::default(),
            middleware: None,
            serverless_functions: Vec::new(),
            edge_functions: Vec::new(),
        }
    }

    /// Every declared function file with its role, middleware excluded.
    pub fn declared_functions(&self) -> Vec<DeclaredSource> {
        let serverless = self
            .serverless_functions
            .iter()
            .map(|p| DeclaredSource::new(p.as_str(), FunctionRole::ServerlessFunction));
        let edge = self
            .edge_functions
            .iter()
            .map(|p| DeclaredSource::new(p.as_str(), FunctionRole::EdgeFunction));
        serverless.chain(edge).collect()
    }

    /// The declared middleware file, if any.
    pub fn declared_middleware(&self) -> Option<DeclaredSource> {
        self.middleware
            .as_deref()
            .map(|p| DeclaredSource::new(p, FunctionRole::Middleware))
    }

    /// Middleware first, then functions.
    pub fn declared_sources(&self) -> Vec<DeclaredSource> {
        self.declared_middleware()
            .into_iter()
            .chain(self.declared_functions())
            .collect()
    }
}
