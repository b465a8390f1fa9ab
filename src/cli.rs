use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "noop-lifecycle")]
#[command(
    about = "Blank the create/update/delete functions of terraform provider resources",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Project root holding the Go module
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file (defaults to the nearest .noop-lifecycle.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Render modified files without writing them
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Increase verbosity level (can be repeated: -v, -vv)
    /// -v: Log every match site
    /// -vv: Trace everything
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    Cli::parse()
}
