//! Command execution for the `xcfg` tool.
//!
//! Output goes through injected writers so tests can capture it. Results
//! (the resolved paths of a load) go to stdout; progress, warnings and
//! errors go to stderr.

use crate::cli::{BuildArgs, Cli, Command, LoadArgs};
use crate::error::{CliError, Result};
use log::debug;
use std::io::Write;
use xcfg::manifest::Manifest;
use xcfg::{BuildRequest, Diagnostics, PackageConfig, build_package, load_package};
use xcfg_common::read_system_definition;

/// Run the parsed command and return the process exit status.
pub fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    let result = execute(cli, stdout, stderr);
    exit_code_for_run_result(result, stderr)
}

fn execute(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<i32> {
    let config = resolve_config(cli)?;
    match &cli.command {
        Command::Build(args) => run_build(args, &config, cli.quiet, stderr),
        Command::Load(args) => Ok(run_load(args, &config, cli.quiet, stdout, stderr)),
    }
}

/// Load `--config`, or `xcfg.toml` from the working directory if present.
fn resolve_config(cli: &Cli) -> Result<PackageConfig> {
    if let Some(path) = &cli.config {
        return Ok(PackageConfig::load_from(path.as_std_path())?);
    }
    let cwd = std::env::current_dir().map_err(CliError::CurrentDir)?;
    Ok(PackageConfig::discover(&cwd)?)
}

fn run_build(
    args: &BuildArgs,
    config: &PackageConfig,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<i32> {
    let system_definition = read_system_definition(args.system_definition.as_std_path())?;
    debug!(
        "read {} node(s) and {} device(s) from {}",
        system_definition.nodes().len(),
        system_definition.devices().len(),
        args.system_definition
    );

    let manifest = Manifest::new(args.node.as_str());
    let request = BuildRequest::new(args.output.as_std_path(), &system_definition, &manifest)
        .with_temp_dir(args.temp_dir.as_deref().map(camino::Utf8Path::as_std_path));

    let outcome = build_package(&request, config);
    report_diagnostics(&outcome.diagnostics, stderr);
    if outcome.is_ok() && !quiet {
        write_stderr_line(
            stderr,
            format!("Built {} for node {}.", args.output, args.node),
        );
    }
    Ok(outcome.status_code())
}

fn run_load(
    args: &LoadArgs,
    config: &PackageConfig,
    quiet: bool,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    let outcome = load_package(
        args.package.as_std_path(),
        args.target_dir.as_std_path(),
        config,
    );
    report_diagnostics(&outcome.diagnostics, stderr);
    if let Ok(loaded) = &outcome.result {
        if !quiet {
            write_stderr_line(
                stderr,
                format!("Loaded {} into {}.", args.package, args.target_dir),
            );
        }
        write_stdout_line(stdout, format!("node: {}", loaded.manifest.node_name()));
        write_stdout_line(
            stdout,
            format!(
                "system definition: {}",
                loaded.system_definition_path.display()
            ),
        );
        write_stdout_line(
            stdout,
            format!(
                "device definitions: {}",
                loaded.device_definition_path.display()
            ),
        );
    }
    outcome.status_code()
}

fn report_diagnostics(diagnostics: &Diagnostics, stderr: &mut dyn Write) {
    if !diagnostics.is_clean() {
        write_stderr_line(stderr, diagnostics);
    }
}

fn exit_code_for_run_result(result: Result<i32>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            err.exit_code()
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

fn write_stdout_line(stdout: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stdout, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}
