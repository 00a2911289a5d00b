mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use servehub::common::DEFAULT_PROJECT_MANIFEST;
use servehub::HubError;

#[derive(Parser, Debug)]
#[command(
    name = "servehub",
    version,
    about = "Mount, serve and download chain packages from the hub",
    arg_required_else_help = true
)]
struct Args {
    /// Settings file (defaults to ~/.servehub/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project manifest to read and update
    #[arg(long, global = true, default_value = DEFAULT_PROJECT_MANIFEST)]
    manifest: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the packages mounted in the project manifest
    List,
    /// Unmount the package at PATH
    Remove {
        /// The api path the package is mounted at, like `/pirate`
        path: String,
    },
    /// Install a hub package and mount its export
    Add {
        /// The package in the hub like `simple/pirate`
        package: String,
        /// The api path to mount the chain at like `/pirate`
        path: Option<String>,
    },
    /// Download a package's source tree
    Download {
        /// The package in the hub like `simple/pirate`
        package: String,
        /// The local path to download to
        localpath: PathBuf,
    },
    /// Install dependencies and serve every mounted package
    Serve,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<HubError>()
                .map(HubError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let ctx = commands::Context::new(args.config.as_deref(), args.manifest)?;

    match args.command {
        Command::List => commands::list(&ctx),
        Command::Remove { path } => commands::remove(&ctx, &path),
        Command::Add { package, path } => commands::add(&ctx, &package, path.as_deref()).await,
        Command::Download { package, localpath } => {
            commands::download(&ctx, &package, &localpath).await
        }
        Command::Serve => commands::serve(&ctx).await,
    }
}
