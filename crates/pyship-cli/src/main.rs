use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod flows;
mod render;

use flows::{build_request, compare_line, pth_output, run_probe, run_provision};
use render::TerminalRenderer;

#[derive(Parser, Debug)]
#[command(name = "pyship")]
#[command(about = "Provisions an embedded Python runtime for an installed application", long_about = None)]
struct Cli {
    /// Directory holding installed-state records. Defaults to the per-user location.
    #[arg(long, global = true)]
    registry_root: Option<PathBuf>,
    /// Mirror run-log lines to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full provisioning sequence for an install directory.
    Provision(ProvisionArgs),
    /// Report what is installed without changing anything.
    Probe {
        #[arg(long)]
        install_path: PathBuf,
        #[arg(long)]
        registry_id: String,
    },
    /// Compare two dotted version strings.
    Compare { a: String, b: String },
    /// Print the path-configuration file for a runtime version.
    Pth { version: String },
}

#[derive(Args, Debug)]
struct ProvisionArgs {
    #[arg(long)]
    install_path: PathBuf,
    #[arg(long)]
    previous_version: Option<String>,
    #[arg(long)]
    new_version: String,
    #[arg(long)]
    registry_id: String,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("PYSHIP_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let renderer = TerminalRenderer::current();

    match cli.command {
        Commands::Provision(args) => {
            let request = build_request(
                args.install_path,
                args.previous_version,
                args.new_version,
                args.registry_id,
            );
            run_provision(renderer, cli.registry_root, request)?;
        }
        Commands::Probe {
            install_path,
            registry_id,
        } => {
            run_probe(renderer, cli.registry_root, install_path, &registry_id)?;
        }
        Commands::Compare { a, b } => {
            println!("{}", compare_line(&a, &b));
        }
        Commands::Pth { version } => {
            let (file_name, contents) = pth_output(&version)?;
            renderer.print_section(&file_name);
            print!("{contents}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
