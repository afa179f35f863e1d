use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nsfs_engine::Session;
use nsfs_mount::{catalog, Config};

/// nsfs - mount a reflected namespace as a filesystem
#[derive(Parser, Debug)]
#[command(name = "nsfs")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Where to mount the hierarchy
    mountpoint: PathBuf,

    /// Optional JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bootstrap module (repeatable; overrides the config and the default set)
    #[arg(long = "module")]
    modules: Vec<String>,

    /// Allow other users to access the mount
    #[arg(long)]
    allow_other: bool,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let bootstrap: Vec<String> = if !args.modules.is_empty() {
        args.modules.clone()
    } else if !config.modules.is_empty() {
        config.modules.clone()
    } else {
        catalog::DEFAULT_BOOTSTRAP
            .iter()
            .map(|s| s.to_string())
            .collect()
    };
    let names: Vec<&str> = bootstrap.iter().map(String::as_str).collect();

    let session = Session::new(Arc::new(catalog::standard()), &names)?;
    nsfs_mount::mount(
        session,
        &args.mountpoint,
        args.allow_other || config.allow_other,
    )?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
