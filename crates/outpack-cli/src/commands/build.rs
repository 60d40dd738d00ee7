use super::ProjectArgs;

pub async fn build(args: &ProjectArgs) -> anyhow::Result<()> {
    let (ctx, config) = args.load()?;
    let plan = outpack_pack::plan(&ctx, &config)?;
    match outpack_pack::materialize(&plan).await {
        Ok(report) => {
            for function in &report.functions {
                println!(
                    "✓ {} {} ({:.1} KB)",
                    function.role,
                    function.entry_file.display(),
                    function.size_bytes as f64 / 1024.0
                );
                println!("  SHA256: {}", function.sha256);
            }
            println!("✓ Manifest: {}", report.manifest_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("Build failed: {e}");
            Err(e.into())
        }
    }
}
