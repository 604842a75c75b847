//! CLI argument parsing (spec §6): a single `--config / -c` flag.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "infobserver", version, about = "Continuous harvesting and YARA-based triage of public text content")]
pub struct Cli {
    /// Path to the YAML configuration document.
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,
}
