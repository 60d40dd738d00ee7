//! Bundler plugin that inlines WebAssembly imports.
//!
//! `import wasm from "./yoga.wasm?module"` resolves to a `wasm-binary` id;
//! loading reads the raw bytes and embeds them as base64 that is decoded
//! into a `Uint8Array` at runtime, so the output is one file with the module
//! inside it.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use outpack_core::PackError;
use regex::Regex;
use rolldown_common::ModuleType;
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext, SharedLoadPluginContext,
};
use tracing::debug;

/// Virtual namespace for resolved WebAssembly files.
pub const WASM_NAMESPACE: &str = "wasm-binary";

const WASM_IMPORT_FILTER: &str = r"(?i)\.wasm(\?module)?$";
const MODULE_QUERY: &str = "?module";

#[derive(Debug, Clone)]
pub struct WasmPlugin {
    filter: Regex,
}

impl WasmPlugin {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            filter: Regex::new(WASM_IMPORT_FILTER)?,
        })
    }

    /// Absolute, normalised path for a wasm import, or `None` to leave the
    /// specifier to default resolution.
    fn resolve(&self, specifier: &str, importer: Option<&str>) -> Option<PathBuf> {
        if !self.filter.is_match(specifier) {
            return None;
        }
        // Nothing to anchor a relative path to.
        let resolve_dir = importer
            .filter(|id| !id.starts_with('\0'))
            .and_then(|id| Path::new(id).parent())?;
        let specifier = specifier.strip_suffix(MODULE_QUERY).unwrap_or(specifier);
        let specifier = Path::new(specifier);
        let joined = if specifier.is_absolute() {
            specifier.to_path_buf()
        } else {
            resolve_dir.join(specifier)
        };
        Some(normalize(&joined))
    }
}

impl Plugin for WasmPlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("wasm")
    }

    async fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> HookResolveIdReturn {
        let Some(path) = self.resolve(args.specifier, args.importer) else {
            return Ok(None);
        };
        debug!(specifier = args.specifier, path = %path.display(), "resolved wasm import");
        Ok(Some(HookResolveIdOutput {
            id: virtual_id(&path).into(),
            ..Default::default()
        }))
    }

    async fn load(&self, _ctx: SharedLoadPluginContext, args: &HookLoadArgs<'_>) -> HookLoadReturn {
        let Some(path) = wasm_path(args.id) else {
            return Ok(None);
        };
        let code = load_wasm(path).await?;
        Ok(Some(HookLoadOutput {
            code: code.into(),
            module_type: Some(ModuleType::Js),
            ..Default::default()
        }))
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }
}

fn virtual_id(path: &Path) -> String {
    format!("\0{WASM_NAMESPACE}:{}", path.display())
}

fn wasm_path(id: &str) -> Option<&Path> {
    id.strip_prefix('\0')?
        .strip_prefix(WASM_NAMESPACE)?
        .strip_prefix(':')
        .map(Path::new)
}

/// Read the file and render it as a module whose default export is its bytes.
async fn load_wasm(path: &Path) -> Result<String, PackError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| PackError::ResourceUnavailable(format!("{}: {err}", path.display())))?;
    debug!(path = %path.display(), bytes = bytes.len(), "loaded wasm module");
    Ok(format!(
        "const fromBase64 = (data) => Uint8Array.from(atob(data), (c) => c.charCodeAt(0));\n\
         export default fromBase64(\"{}\");\n",
        STANDARD.encode(&bytes)
    ))
}

/// Resolve `.` and `..` lexically so one file has one id however it is spelled.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
