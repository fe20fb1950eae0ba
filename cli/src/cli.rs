//! CLI argument definitions for the `xcfg` tool.
//!
//! Kept apart from the entrypoint so the argument surface can be tested
//! without running any command.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Build and load xcfg configuration packages.
#[derive(Parser, Debug)]
#[command(name = "xcfg")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build and load xcfg configuration packages.\n\n",
    "A package bundles the system definition of one node with the device ",
    "definitions it needs, together with a manifest naming the node. ",
    "Packages are zip archives with the .xcfg extension.\n\n",
    "Settings are read from --config, or from xcfg.toml in the current ",
    "directory when present.",
))]
#[command(after_help = concat!(
    "EXIT STATUS:\n",
    "  0  success\n",
    "  1  invalid path\n",
    "  2  invalid reference\n",
    "  3  incomplete package\n",
    "  4  I/O failure\n",
    "  5  malformed manifest\n",
    "  78 invalid configuration\n\n",
    "EXAMPLES:\n",
    "  Build a package for node ECU_A:\n",
    "    $ xcfg build -s system.json -n ECU_A -o ecu_a.xcfg\n\n",
    "  Extract and validate it:\n",
    "    $ xcfg load ecu_a.xcfg -t out/",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file [default: ./xcfg.toml when present].
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Suppress progress output (warnings and errors still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build a package for one node of a system definition.
    Build(BuildArgs),

    /// Extract a package and resolve its members.
    Load(LoadArgs),
}

/// Arguments for the build command.
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// JSON system definition holding the node and all devices.
    #[arg(short, long, value_name = "FILE")]
    pub system_definition: Utf8PathBuf,

    /// Name of the node to package.
    #[arg(short, long, value_name = "NAME")]
    pub node: String,

    /// Package to create; must end in .xcfg and not exist yet.
    #[arg(short, long, value_name = "FILE")]
    pub output: Utf8PathBuf,

    /// Directory for the staging directory [default: next to the package].
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<Utf8PathBuf>,
}

/// Arguments for the load command.
#[derive(Parser, Debug, Clone)]
pub struct LoadArgs {
    /// Package to load.
    #[arg(value_name = "PACKAGE")]
    pub package: Utf8PathBuf,

    /// Directory to extract into; its previous contents are deleted.
    #[arg(short, long, value_name = "DIR")]
    pub target_dir: Utf8PathBuf,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
