use clap::Parser;
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "rtw", version = VERSION, about = "Regression test results dashboard TUI")]
pub struct Cli {
    /// Report JSON produced by the regression test runner
    pub report: PathBuf,

    /// Reload interval in seconds
    #[arg(short, long, default_value_t = 30)]
    pub interval: u64,

    /// Number of recent commits to display (defaults to all in the report)
    #[arg(short, long)]
    pub commits: Option<usize>,

    /// Commit details URL prefix, or a template containing "{commit}"
    #[arg(long)]
    pub commit_url: Option<String>,

    /// Disable desktop notifications
    #[arg(long)]
    pub no_notify: bool,

    /// Write debug logs to the state directory
    #[arg(short, long)]
    pub verbose: bool,
}
