//! Packaging orchestrator: the configuration stage (`plan`) and the
//! build-completion stage (`materialize`).
//!
//! `plan` runs when the host framework is being configured and tells it
//! where to write static output. `materialize` runs after the host build has
//! finished and drives a run through its phases:
//!
//! `Idle → Validating → Planning → Bundling → Synthesizing → Persisting → Done`
//!
//! Any fatal error moves the run to `Failed`. Nothing is written under the
//! output root before `Bundling`. Within a descriptor the order is bundle
//! directory, entry module, then `.vc-config.json`, and runtime configs are
//! written only once every bundle has succeeded: a failed run leaves no
//! `.vc-config.json` and no `config.json` behind.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use outpack_core::{
    AdapterConfig, BuildMode, BundlingFailure, DISALLOWED_SOURCE_EXTENSIONS, DeclaredSource,
    PackError, PackResult,
};

use crate::bundle::{BundleResult, bundle};
use crate::descriptor::{FunctionDescriptor, build_descriptors};
use crate::manifest::{DeploymentManifest, MANIFEST_FILE};
use crate::runtime::RuntimeConfig;

/// Deployment output root, relative to the project root.
pub const OUTPUT_DIR: &str = ".vercel/output";
/// Static assets directory, relative to the output root.
pub const STATIC_DIR: &str = "static";

/// What the host framework is handed during configuration.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub mode: BuildMode,
}

/// How the host lays out pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildFormat {
    /// `about.astro` becomes `about/index.html`.
    Directory,
}

/// Settings the host framework must apply before it builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostOverride {
    pub out_dir: PathBuf,
    pub build_format: BuildFormat,
}

/// Output of the configuration stage; input to [`materialize`].
#[derive(Debug, Clone)]
pub struct PackagePlan {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub host: HostOverride,
    pub config: AdapterConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagePhase {
    Idle,
    Validating,
    Planning,
    Bundling,
    Synthesizing,
    Persisting,
    Done,
    Failed,
}

impl fmt::Display for PackagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of a successful [`materialize`] run.
#[derive(Debug, Clone)]
pub struct PackageReport {
    /// Packaged functions in declaration order, middleware first.
    pub functions: Vec<BundleResult>,
    pub has_middleware: bool,
    pub manifest_path: PathBuf,
    /// Every phase the run passed through.
    pub phases: Vec<PackagePhase>,
}

/// Configuration stage: check the build mode and declared sources and
/// compute where everything goes.
pub fn plan(ctx: &ProjectContext, config: &AdapterConfig) -> PackResult<PackagePlan> {
    if ctx.mode != BuildMode::Static {
        return Err(PackError::config(format!(
            "only static builds can be packaged (build mode is '{}')",
            ctx.mode
        )));
    }
    validate_sources(config)?;

    let output_root = ctx.root.join(OUTPUT_DIR);
    let host = HostOverride {
        out_dir: output_root.join(STATIC_DIR),
        build_format: BuildFormat::Directory,
    };
    info!(
        root = %ctx.root.display(),
        out_dir = %host.out_dir.display(),
        functions = config.declared_functions().len(),
        middleware = config.middleware.is_some(),
        "planned package"
    );
    Ok(PackagePlan {
        source_root: ctx.root.clone(),
        output_root,
        host,
        config: config.clone(),
    })
}

/// Reject source files that need a compile step before they can be packaged.
pub fn validate_sources(config: &AdapterConfig) -> PackResult<()> {
    for source in config.declared_sources() {
        if let Some(ext) = source.extension()
            && DISALLOWED_SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        {
            return Err(PackError::config(format!(
                "{} '{}' is a .{ext} file; compile it to JavaScript first",
                source.role, source.path
            )));
        }
    }
    Ok(())
}

/// Build-completion stage: bundle every function, write runtime configs,
/// and merge the deployment manifest.
pub async fn materialize(plan: &PackagePlan) -> PackResult<PackageReport> {
    let mut run = PackageRun::default();
    let result = run.execute(plan).await;
    if let Err(err) = &result {
        run.fail(err);
    }
    result
}

#[derive(Debug)]
struct PackageRun {
    phase: PackagePhase,
    history: Vec<PackagePhase>,
}

impl Default for PackageRun {
    fn default() -> Self {
        Self {
            phase: PackagePhase::Idle,
            history: vec![PackagePhase::Idle],
        }
    }
}

impl PackageRun {
    fn enter(&mut self, next: PackagePhase) {
        info!(from = %self.phase, to = %next, "package phase");
        self.phase = next;
        self.history.push(next);
    }

    fn fail(&mut self, err: &PackError) {
        warn!(phase = %self.phase, error = %err, "packaging failed");
        self.phase = PackagePhase::Failed;
        self.history.push(PackagePhase::Failed);
    }

    async fn execute(&mut self, plan: &PackagePlan) -> PackResult<PackageReport> {
        self.enter(PackagePhase::Validating);
        validate_sources(&plan.config)?;

        self.enter(PackagePhase::Planning);
        let middleware = locate_middleware(plan).await;
        let has_middleware = middleware.is_some();
        let sources: Vec<DeclaredSource> = middleware
            .into_iter()
            .chain(plan.config.declared_functions())
            .collect();
        let descriptors = build_descriptors(&sources, &plan.source_root, &plan.output_root)?;

        self.enter(PackagePhase::Bundling);
        let functions = bundle_all(&descriptors).await?;

        self.enter(PackagePhase::Synthesizing);
        for descriptor in &descriptors {
            write_runtime_config(descriptor).await?;
        }

        self.enter(PackagePhase::Persisting);
        let manifest_path = persist_manifest(plan, has_middleware).await?;

        self.enter(PackagePhase::Done);
        Ok(PackageReport {
            functions,
            has_middleware,
            manifest_path,
            phases: self.history.clone(),
        })
    }
}

/// The declared middleware, if it exists on disk. A missing file degrades
/// to "no middleware".
async fn locate_middleware(plan: &PackagePlan) -> Option<DeclaredSource> {
    let declared = plan.config.declared_middleware()?;
    let path = plan.source_root.join(&declared.path);
    match tokio::fs::try_exists(&path).await {
        Ok(true) => Some(declared),
        Ok(false) => {
            let err = PackError::ResourceUnavailable(format!(
                "middleware {} not found",
                path.display()
            ));
            warn!(error = %err, "continuing without middleware");
            None
        }
        Err(e) => {
            let err = PackError::ResourceUnavailable(format!("{}: {e}", path.display()));
            warn!(error = %err, "continuing without middleware");
            None
        }
    }
}

/// Bundle every descriptor concurrently. All tasks settle before failures
/// are reported; outputs that did succeed stay on disk.
async fn bundle_all(descriptors: &[FunctionDescriptor]) -> PackResult<Vec<BundleResult>> {
    let mut tasks = JoinSet::new();
    let mut task_index = HashMap::new();
    for (index, descriptor) in descriptors.iter().cloned().enumerate() {
        let handle = tasks.spawn(async move { bundle(&descriptor).await });
        task_index.insert(handle.id(), index);
    }

    let mut results: Vec<Option<BundleResult>> = vec![None; descriptors.len()];
    let mut failures: Vec<(usize, BundlingFailure)> = Vec::new();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, Ok(result))) => results[task_index[&id]] = Some(result),
            Ok((id, Err(failure))) => {
                warn!(function = %failure.source_path.display(), role = ?failure.role, error = %failure.message, "bundling failed");
                failures.push((task_index[&id], failure));
            }
            Err(err) => {
                let index = task_index[&err.id()];
                let descriptor = &descriptors[index];
                failures.push((
                    index,
                    BundlingFailure {
                        source_path: descriptor.source_path.clone(),
                        role: descriptor.role,
                        message: format!("bundling task failed: {err}"),
                    },
                ));
            }
        }
    }

    if !failures.is_empty() {
        failures.sort_by_key(|(index, _)| *index);
        return Err(PackError::Bundling {
            failures: failures.into_iter().map(|(_, f)| f).collect(),
        });
    }
    Ok(results.into_iter().flatten().collect())
}

async fn write_runtime_config(descriptor: &FunctionDescriptor) -> PackResult<()> {
    let path = &descriptor.config_file;
    let json = RuntimeConfig::synthesize(descriptor)
        .to_json()
        .map_err(|e| PackError::io(path, e.into()))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| PackError::io(path, e))
}

async fn persist_manifest(plan: &PackagePlan, has_middleware: bool) -> PackResult<PathBuf> {
    let path = plan.output_root.join(MANIFEST_FILE);
    let existing = read_prior_manifest(&path).await;
    let manifest =
        DeploymentManifest::merge(existing.as_deref(), &plan.config.images, has_middleware);
    let json = manifest
        .to_json_pretty()
        .map_err(|e| PackError::io(&path, e.into()))?;

    tokio::fs::create_dir_all(&plan.output_root)
        .await
        .map_err(|e| PackError::io(&plan.output_root, e))?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| PackError::io(&path, e))?;
    info!(path = %path.display(), routes = manifest.routes.len(), "manifest written");
    Ok(path)
}

async fn read_prior_manifest(path: &Path) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            let err = PackError::ManifestParse(format!("{}: {e}", path.display()));
            warn!(error = %err, "treating prior manifest as empty");
            None
        }
    }
}
