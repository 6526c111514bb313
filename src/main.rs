/*!
mcp-kube - kubectl operations as MCP tools.

Wraps a fixed catalog of kubectl actions behind a Model Context Protocol
server speaking over stdio. Every operation shells out to the `kubectl`
binary on PATH and normalizes its output into one uniform response shape.

Usage:
  mcp-kube serve                                  # stdio MCP server
  mcp-kube catalog [--json]                       # list supported operations
  mcp-kube exec list-pods --param namespace=kube-system
  mcp-kube -k ~/.kube/staging exec get-current-context

The kubeconfig override resolves from --kubeconfig first, then the
MCP_KUBE_KUBECONFIG environment variable.
*/

mod cmd;
mod kubectl;
mod mcp;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const KUBECONFIG_ENV: &str = "MCP_KUBE_KUBECONFIG";

#[derive(Parser)]
#[command(name = "mcp-kube", version, about = "kubectl operations as MCP tools")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). Logs go to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Kubeconfig file passed to every kubectl invocation.
    #[arg(short = 'k', long, global = true, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the operation catalog over stdio as MCP tools.
    Serve(cmd::ServeArgs),
    /// Print the operation catalog.
    Catalog(cmd::CatalogArgs),
    /// Run a single operation directly.
    Exec(cmd::ExecArgs),
}

fn resolve_kubeconfig(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| {
        std::env::var(KUBECONFIG_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

fn main() {
    let cli = Cli::parse();
    utils::init_logging(utils::derive_level(cli.verbose, cli.quiet));

    let kubeconfig = resolve_kubeconfig(cli.kubeconfig);

    let result = match cli.command {
        Commands::Serve(args) => cmd::execute_serve(args, kubeconfig),
        Commands::Catalog(args) => cmd::execute_catalog(args),
        Commands::Exec(args) => cmd::execute_exec(args, kubeconfig),
    };

    if let Err(e) = result {
        crate::log_error!("{e:#}");
        std::process::exit(1);
    }
}
