//! `xcfg` CLI entrypoint.
//!
//! Builds and loads configuration packages. Diagnostics are always printed;
//! set `RUST_LOG=xcfg=debug` to also log the individual steps.

use clap::Parser;
use xcfg_cli::cli::Cli;
use xcfg_cli::commands::run;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let exit_code = run(&cli, &mut std::io::stdout(), &mut std::io::stderr());
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
