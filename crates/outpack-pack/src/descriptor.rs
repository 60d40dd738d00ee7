//! Output locations for declared source files.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use outpack_core::{DeclaredSource, FunctionRole, PackError, PackResult};

/// Directory under the output root that holds every function bundle.
pub const FUNCTIONS_DIR: &str = "functions";
/// Bundle directory name of the single middleware function.
pub const MIDDLEWARE_BUNDLE: &str = "_middleware.func";
/// Runtime config file written next to each entry module.
pub const RUNTIME_CONFIG_FILE: &str = ".vc-config.json";

const BUNDLE_SUFFIX: &str = ".func";
const STRIPPED_EXTENSIONS: &[&str] = &[".js", ".mjs"];

/// One declared source file and where its packaged output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub source_path: PathBuf,
    pub role: FunctionRole,
    /// Source extension without the dot; carried onto the entry file name.
    pub extension: String,
    pub bundle_dir: PathBuf,
    pub entry_file: PathBuf,
    pub config_file: PathBuf,
}

impl FunctionDescriptor {
    /// Derive the descriptor for `source`, declared relative to `source_root`.
    ///
    /// `api/hello.js` lands in `<output_root>/functions/api/hello.func/index.js`.
    /// Middleware always lands in `functions/_middleware.func/index.js`.
    pub fn build(source: &DeclaredSource, source_root: &Path, output_root: &Path) -> PackResult<Self> {
        let relative = contained_relative_path(&source.path)?;
        let extension = source
            .extension()
            .ok_or_else(|| {
                PackError::config(format!(
                    "{} '{}' has no file extension",
                    source.role, source.path
                ))
            })?
            .to_string();

        let functions = output_root.join(FUNCTIONS_DIR);
        let (bundle_dir, entry_name) = match source.role {
            FunctionRole::Middleware => (functions.join(MIDDLEWARE_BUNDLE), "index.js".to_string()),
            FunctionRole::EdgeFunction | FunctionRole::ServerlessFunction => {
                (functions.join(bundle_dir_name(&relative)), format!("index.{extension}"))
            }
        };

        Ok(Self {
            source_path: source_root.join(&relative),
            role: source.role,
            extension,
            entry_file: bundle_dir.join(entry_name),
            config_file: bundle_dir.join(RUNTIME_CONFIG_FILE),
            bundle_dir,
        })
    }

    /// Entry file name inside the bundle directory.
    pub fn entry_name(&self) -> String {
        self.entry_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Build descriptors for every declared source, rejecting colliding bundle directories.
pub fn build_descriptors(
    sources: &[DeclaredSource],
    source_root: &Path,
    output_root: &Path,
) -> PackResult<Vec<FunctionDescriptor>> {
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();
    let mut descriptors = Vec::with_capacity(sources.len());
    for source in sources {
        let descriptor = FunctionDescriptor::build(source, source_root, output_root)?;
        if let Some(previous) = claimed.insert(descriptor.bundle_dir.clone(), source.path.clone()) {
            return Err(PackError::config(format!(
                "'{}' and '{}' both package to {}",
                previous,
                source.path,
                descriptor.bundle_dir.display()
            )));
        }
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}

/// Normalize a declared path and make sure it stays below its root.
fn contained_relative_path(declared: &str) -> PackResult<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(declared).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PackError::config(format!(
                    "function path '{declared}' escapes the output root"
                )));
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(PackError::config(format!("function path '{declared}' is empty")));
    }
    Ok(out)
}

/// `api/hello.js` -> `api/hello.func`; other extensions are kept: `api/x.cjs` -> `api/x.cjs.func`.
fn bundle_dir_name(relative: &Path) -> PathBuf {
    let raw = relative.to_string_lossy();
    let stem = STRIPPED_EXTENSIONS
        .iter()
        .find_map(|ext| raw.strip_suffix(ext))
        .unwrap_or(&raw);
    PathBuf::from(format!("{stem}{BUNDLE_SUFFIX}"))
}
