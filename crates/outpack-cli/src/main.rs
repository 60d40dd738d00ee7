//! outpack: package a static site build for deployment.
//!
//! ```text
//! outpack init
//! outpack plan --mode static
//! outpack build --config outpack.toml
//! ```

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "outpack",
    about = "outpack: function packaging and manifest synthesis for static sites",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a scaffold outpack.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long, default_value = ".")]
        path: String,
    },
    /// Run the configuration stage and print where the site generator
    /// must write its static output.
    Plan {
        #[command(flatten)]
        project: commands::ProjectArgs,
    },
    /// Package functions and write the deployment manifest.
    ///
    /// Runs after the site generator has written its static output.
    Build {
        #[command(flatten)]
        project: commands::ProjectArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("outpack=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => commands::init::init(&path),
        Commands::Plan { project } => commands::plan::plan(&project),
        Commands::Build { project } => commands::build::build(&project).await,
    }
}
