use super::ProjectArgs;

pub fn plan(args: &ProjectArgs) -> anyhow::Result<()> {
    let (ctx, config) = args.load()?;
    let plan = outpack_pack::plan(&ctx, &config)?;
    println!("{}", serde_json::to_string_pretty(&plan.host)?);
    Ok(())
}
