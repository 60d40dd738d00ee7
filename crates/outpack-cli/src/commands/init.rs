use outpack_core::AdapterConfig;

use super::config_path;

pub fn init(path: &str) -> anyhow::Result<()> {
    let output = config_path(path);
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    std::fs::write(&output, AdapterConfig::scaffold().to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
