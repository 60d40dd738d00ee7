//! End-to-end runs of plan + materialize against a temp project.

use std::fs;
use std::path::{Path, PathBuf};

use outpack_core::{AdapterConfig, BuildMode, FunctionRole, ImagesConfig, PackError};
use outpack_pack::{PackagePlan, ProjectContext, materialize, plan};
use serde_json::{Value, json};
use tempfile::TempDir;
use walkdir::WalkDir;

const WASM_BYTES: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn static_plan(root: &Path, config: &AdapterConfig) -> PackagePlan {
    let ctx = ProjectContext {
        root: root.to_path_buf(),
        mode: BuildMode::Static,
    };
    plan(&ctx, config).unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Files under `dir`, relative to it, sorted.
fn tree(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn test_manifest_for_images_only() {
    let project = TempDir::new().unwrap();
    let config = AdapterConfig {
        images: ImagesConfig {
            sizes: vec![320],
            domains: vec!["example.com".into()],
            ..ImagesConfig::default()
        },
        ..AdapterConfig::default()
    };
    let plan = static_plan(project.path(), &config);

    let report = materialize(&plan).await.unwrap();

    let text = fs::read_to_string(&report.manifest_path).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        serde_json::to_string(&value).unwrap(),
        r#"{"version":3,"routes":[{"handle":"filesystem"}],"images":{"sizes":[320],"domains":["example.com"]}}"#
    );
    assert!(text.contains("\n  \"routes\": [\n"));
    assert_eq!(tree(&plan.output_root), vec![PathBuf::from("config.json")]);
}

#[tokio::test]
async fn test_serverless_function_layout() {
    let project = TempDir::new().unwrap();
    write(
        project.path(),
        "api/hello.js",
        "export default function handler(req, res) { res.end('hello'); }\n",
    );
    let config = AdapterConfig {
        serverless_functions: vec!["api/hello.js".into()],
        ..AdapterConfig::default()
    };
    let plan = static_plan(project.path(), &config);

    let report = materialize(&plan).await.unwrap();

    let func = plan.output_root.join("functions/api/hello.func");
    assert_eq!(report.functions.len(), 1);
    assert_eq!(report.functions[0].bundle_dir, func);
    assert_eq!(report.functions[0].entry_file, func.join("index.js"));
    assert_eq!(report.functions[0].role, FunctionRole::ServerlessFunction);
    assert_eq!(
        fs::read_to_string(func.join(".vc-config.json")).unwrap(),
        r#"{"runtime":"nodejs16.x","launcherType":"Nodejs","shouldAddHelpers":true,"handler":"index.js"}"#
    );
    assert_eq!(
        tree(&func),
        vec![PathBuf::from(".vc-config.json"), PathBuf::from("index.js")]
    );
}

#[tokio::test]
async fn test_wasm_is_inlined_into_edge_bundle() {
    let project = TempDir::new().unwrap();
    write(project.path(), "edge/lib/add.wasm", WASM_BYTES);
    write(
        project.path(),
        "edge/add.js",
        "import wasm from './lib/add.wasm?module';\n\
         export const config = { runtime: 'edge' };\n\
         export default async function handler() {\n  \
           const { instance } = await WebAssembly.instantiate(wasm);\n  \
           return new Response(String(instance.exports.add(1, 2)));\n\
         }\n",
    );
    let config = AdapterConfig {
        edge_functions: vec!["edge/add.js".into()],
        ..AdapterConfig::default()
    };
    let plan = static_plan(project.path(), &config);

    let report = materialize(&plan).await.unwrap();

    let func = plan.output_root.join("functions/edge/add.func");
    assert!(report.functions[0].module_count >= 2);
    assert_eq!(
        tree(&func),
        vec![PathBuf::from(".vc-config.json"), PathBuf::from("index.js")]
    );
    let code = fs::read_to_string(func.join("index.js")).unwrap();
    assert!(code.contains("\"AGFzbQEAAAA=\""));
    assert!(!code.contains("add.wasm?module"));
    assert_eq!(
        read_json(&func.join(".vc-config.json")),
        json!({"runtime": "edge", "entrypoint": "index.js"})
    );
}

#[tokio::test]
async fn test_dynamically_imported_wasm_is_inlined() {
    let project = TempDir::new().unwrap();
    write(project.path(), "edge/lib/add.wasm", WASM_BYTES);
    write(
        project.path(),
        "edge/lazy.js",
        "export default async function handler() {\n  \
           const { default: wasm } = await import('./lib/add.wasm?module');\n  \
           return new Response(String(wasm.length));\n\
         }\n",
    );
    let config = AdapterConfig {
        edge_functions: vec!["edge/lazy.js".into()],
        ..AdapterConfig::default()
    };
    let plan = static_plan(project.path(), &config);

    materialize(&plan).await.unwrap();

    let func = plan.output_root.join("functions/edge/lazy.func");
    assert_eq!(
        tree(&func),
        vec![PathBuf::from(".vc-config.json"), PathBuf::from("index.js")]
    );
    let code = fs::read_to_string(func.join("index.js")).unwrap();
    assert!(code.contains("\"AGFzbQEAAAA=\""));
    assert!(!code.contains("import("));
}

#[tokio::test]
async fn test_missing_wasm_fails_only_that_function() {
    let project = TempDir::new().unwrap();
    write(project.path(), "edge/ok.js", "export default () => new Response('ok');\n");
    write(
        project.path(),
        "edge/gone.js",
        "import wasm from './gone.wasm?module';\nexport default () => new Response(String(wasm.length));\n",
    );
    let config = AdapterConfig {
        edge_functions: vec!["edge/ok.js".into(), "edge/gone.js".into()],
        ..AdapterConfig::default()
    };
    let plan = static_plan(project.path(), &config);

    let failures = match materialize(&plan).await.unwrap_err() {
        PackError::Bundling { failures } => failures,
        other => panic!("expected a bundling error, got {other}"),
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].source_path, project.path().join("edge/gone.js"));
    assert!(failures[0].message.contains("resource unavailable"));
    assert!(plan.output_root.join("functions/edge/ok.func/index.js").exists());
}

#[tokio::test]
async fn test_typed_middleware_fails_before_any_output() {
    let project = TempDir::new().unwrap();
    write(project.path(), "middleware.ts", "export default () => {};\n");
    let config = AdapterConfig {
        middleware: Some("middleware.ts".into()),
        ..AdapterConfig::default()
    };
    let ctx = ProjectContext {
        root: project.path().to_path_buf(),
        mode: BuildMode::Static,
    };

    let err = plan(&ctx, &config).unwrap_err();
    assert!(matches!(err, PackError::Configuration(_)));

    // A plan assembled by hand is validated again when materializing.
    let plan = static_plan(project.path(), &AdapterConfig::default());
    let plan = PackagePlan { config, ..plan };
    let err = materialize(&plan).await.unwrap_err();
    assert!(matches!(err, PackError::Configuration(_)));
    assert!(!project.path().join(".vercel").exists());
}

#[tokio::test]
async fn test_prior_manifest_fields_survive() {
    let project = TempDir::new().unwrap();
    write(
        project.path(),
        ".vercel/output/config.json",
        r#"{"foo": 1, "version": 1, "routes": [{"src": "/old"}]}"#,
    );
    let plan = static_plan(project.path(), &AdapterConfig::default());

    materialize(&plan).await.unwrap();

    let manifest = read_json(&plan.output_root.join("config.json"));
    assert_eq!(manifest["foo"], 1);
    assert_eq!(manifest["version"], 3);
    assert_eq!(manifest["routes"], json!([{"handle": "filesystem"}]));
    assert_eq!(manifest["images"]["sizes"], json!([640, 750, 828, 1080, 1200]));
    assert_eq!(manifest["images"]["domains"], json!([]));
}

#[tokio::test]
async fn test_middleware_is_copied_and_routed() {
    let project = TempDir::new().unwrap();
    let source = "export default function middleware(request) { return undefined; }\n";
    write(project.path(), "src/middleware.mjs", source);
    let config = AdapterConfig {
        middleware: Some("src/middleware.mjs".into()),
        ..AdapterConfig::default()
    };
    let plan = static_plan(project.path(), &config);

    let report = materialize(&plan).await.unwrap();

    assert!(report.has_middleware);
    let func = plan.output_root.join("functions/_middleware.func");
    assert_eq!(fs::read_to_string(func.join("index.js")).unwrap(), source);
    assert_eq!(
        read_json(&func.join(".vc-config.json")),
        json!({"runtime": "edge", "entrypoint": "index.js"})
    );
    let manifest = read_json(&plan.output_root.join("config.json"));
    assert_eq!(
        manifest["routes"],
        json!([{"src": "/(.*)", "middlewarePath": "_middleware", "continue": true}])
    );
}

#[tokio::test]
async fn test_both_function_lists_together() {
    let project = TempDir::new().unwrap();
    write(project.path(), "api/node.js", "export default () => 'node';\n");
    write(project.path(), "api/geo.mjs", "export default () => 'edge';\n");
    let config = AdapterConfig {
        serverless_functions: vec!["api/node.js".into()],
        edge_functions: vec!["api/geo.mjs".into()],
        ..AdapterConfig::default()
    };
    let plan = static_plan(project.path(), &config);

    let report = materialize(&plan).await.unwrap();

    let roles: Vec<FunctionRole> = report.functions.iter().map(|f| f.role).collect();
    assert_eq!(roles, vec![FunctionRole::ServerlessFunction, FunctionRole::EdgeFunction]);
    let functions = plan.output_root.join("functions");
    assert_eq!(
        tree(&functions),
        vec![
            PathBuf::from("api/geo.func/.vc-config.json"),
            PathBuf::from("api/geo.func/index.mjs"),
            PathBuf::from("api/node.func/.vc-config.json"),
            PathBuf::from("api/node.func/index.js"),
        ]
    );
    assert_eq!(
        read_json(&functions.join("api/geo.func/.vc-config.json")),
        json!({"runtime": "edge", "entrypoint": "index.mjs"})
    );
}

#[tokio::test]
async fn test_bundling_failure_skips_configs_and_manifest() {
    let project = TempDir::new().unwrap();
    write(project.path(), "api/good.js", "export default () => 'ok';\n");
    write(project.path(), "api/bad.js", "import { x } from './gone.js';\nexport default x;\n");
    let config = AdapterConfig {
        serverless_functions: vec!["api/good.js".into(), "api/bad.js".into()],
        ..AdapterConfig::default()
    };
    let plan = static_plan(project.path(), &config);

    let err = materialize(&plan).await.unwrap_err();

    let failures = match err {
        PackError::Bundling { failures } => failures,
        other => panic!("expected a bundling error, got {other}"),
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].source_path, project.path().join("api/bad.js"));
    assert!(failures[0].message.contains("gone.js"));

    let functions = plan.output_root.join("functions");
    assert!(functions.join("api/good.func/index.js").exists());
    assert!(!functions.join("api/good.func/.vc-config.json").exists());
    assert!(!plan.output_root.join("config.json").exists());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let project = TempDir::new().unwrap();
    write(project.path(), "api/hello.js", "export default () => 'hi';\n");
    let config = AdapterConfig {
        serverless_functions: vec!["api/hello.js".into()],
        ..AdapterConfig::default()
    };
    let plan = static_plan(project.path(), &config);

    let first = materialize(&plan).await.unwrap();
    let manifest = fs::read_to_string(&first.manifest_path).unwrap();
    let second = materialize(&plan).await.unwrap();

    assert_eq!(first.functions[0].sha256, second.functions[0].sha256);
    assert_eq!(fs::read_to_string(&second.manifest_path).unwrap(), manifest);
}
