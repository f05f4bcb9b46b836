// crates/hongd-cli/src/main.rs
// ============================================================================
// Module: HONGD CLI Entry Point
// Description: Command dispatcher for name translation and directory admin.
// Purpose: Provide a localized CLI over the HONGD resolver and directory.
// Dependencies: clap, hongd-config, hongd-core, thiserror, tracing-subscriber
// ============================================================================

//! ## Overview
//! `hongd xlate` prints every external form of a name. `hongd add` and
//! `hongd delete` manage directory records. Exit codes follow `sysexits`:
//! unparseable names exit 64, undecodable printable names 65, deletes that
//! match nothing 66, and directory failures 69. All user-facing strings are
//! routed through the i18n catalog.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::ArgGroup;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use hongd_cli::t;
use hongd_cli::xlate::ReportFormat;
use hongd_cli::xlate::describe_name;
use hongd_cli::xlate::root_extend;
use hongd_config::ConfiguredDirectory;
use hongd_config::HongdConfig;
use hongd_core::ResolverContext;
use hongd_core::decode_internal;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Command line usage error.
const EX_USAGE: u8 = 64;
/// Input data was incorrect.
const EX_DATAERR: u8 = 65;
/// Input did not exist.
const EX_NOINPUT: u8 = 66;
/// Service unavailable.
const EX_UNAVAILABLE: u8 = 69;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "hongd", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Raise log verbosity (repeatable); `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a name into its external forms.
    Xlate(XlateCommand),
    /// Register a human name for a GDP name.
    Add(AddCommand),
    /// Remove a human name from the directory.
    Delete(DeleteCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `xlate`.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("format").args(["b64", "hex", "file_name", "old_form"])))]
struct XlateCommand {
    /// Name to translate: 64 hex digits, a printable name, or a human name.
    name: String,
    /// Print only the printable (base64) name.
    #[arg(short = 'b', long)]
    b64: bool,
    /// Print only the hex name.
    #[arg(short = 'x', long)]
    hex: bool,
    /// Print only the storage file name root.
    #[arg(short = 'f', long)]
    file_name: bool,
    /// Print only the legacy SHA-256 form.
    #[arg(short = 'o', long)]
    old_form: bool,
    /// Optional config file path (defaults to hongd.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl XlateCommand {
    /// Returns the selected report format.
    const fn format(&self) -> ReportFormat {
        if self.b64 {
            ReportFormat::Printable
        } else if self.hex {
            ReportFormat::Hex
        } else if self.file_name {
            ReportFormat::FileName
        } else if self.old_form {
            ReportFormat::OldForm
        } else {
            ReportFormat::Summary
        }
    }
}

/// Arguments for `add`.
#[derive(Args, Debug)]
struct AddCommand {
    /// Human name; undotted names are prefixed with the name root.
    hname: String,
    /// Printable GDP name.
    pname: String,
    /// Suppress informational messages.
    #[arg(short, long)]
    quiet: bool,
    /// Optional config file path (defaults to hongd.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `delete`.
#[derive(Args, Debug)]
struct DeleteCommand {
    /// Human name; undotted names are prefixed with the name root.
    hname: String,
    /// Suppress informational messages.
    #[arg(short, long)]
    quiet: bool,
    /// Optional config file path (defaults to hongd.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to hongd.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
    /// Process exit status.
    status: u8,
}

impl CliError {
    /// Constructs a [`CliError`] that exits with `EX_UNAVAILABLE`.
    const fn new(message: String) -> Self {
        Self::with_status(message, EX_UNAVAILABLE)
    }

    /// Constructs a [`CliError`] with an explicit exit status.
    const fn with_status(message: String, status: u8) -> Self {
        Self {
            message,
            status,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::from(EX_USAGE));
    };

    match command {
        Commands::Xlate(command) => command_xlate(&command),
        Commands::Add(command) => command_add(&command),
        Commands::Delete(command) => command_delete(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints top-level help to stdout.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

/// Installs the stderr log subscriber.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false);
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}

// ============================================================================
// SECTION: Xlate Command
// ============================================================================

/// Executes the `xlate` command.
fn command_xlate(command: &XlateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let ctx = config.resolver().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "directory rejected; resolving without it");
        ResolverContext::without_directory(config.names.resolver_settings())
    });
    if ctx.initialize().is_err() {
        tracing::info!("directory unavailable; continuing without it");
    }
    let report = describe_name(&ctx, &command.name).map_err(|err| {
        CliError::with_status(t!("xlate.parse_failed", name = command.name, error = err), EX_USAGE)
    })?;
    ctx.shutdown();
    write_stdout_line(&report.render(command.format()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Directory Commands
// ============================================================================

/// Executes the `add` command.
fn command_add(command: &AddCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let name = decode_internal(&command.pname).map_err(|err| {
        let mut message = t!("add.decode_failed", name = command.pname, error = err);
        message.push('\n');
        message.push_str(&t!("add.decode_hint"));
        CliError::with_status(message, EX_DATAERR)
    })?;
    let hname = root_extend(&command.hname, config.names.root.as_deref());
    let directory = open_directory(&config, command.quiet)?;
    if !command.quiet {
        write_info(&t!("add.adding", hname = hname, pname = command.pname))?;
    }
    directory
        .ensure_schema()
        .map_err(|err| CliError::new(t!("directory.schema_failed", error = err)))?;
    directory
        .insert(&hname, &name)
        .map_err(|err| CliError::new(t!("add.failed", error = err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `delete` command.
fn command_delete(command: &DeleteCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let hname = root_extend(&command.hname, config.names.root.as_deref());
    let directory = open_directory(&config, command.quiet)?;
    if !command.quiet {
        write_info(&t!("delete.deleting", hname = hname))?;
    }
    let rows = directory
        .delete(&hname)
        .map_err(|err| CliError::new(t!("delete.failed", error = err)))?;
    if rows == 0 {
        if !command.quiet {
            write_info(&t!("delete.no_rows"))?;
        }
        return Ok(ExitCode::from(EX_NOINPUT));
    }
    if !command.quiet {
        write_info(&t!("delete.deleted", rows = rows))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Opens the configured directory or fails with `EX_UNAVAILABLE`.
fn open_directory(config: &HongdConfig, quiet: bool) -> CliResult<ConfiguredDirectory> {
    let directory = config
        .open_directory()
        .map_err(|err| CliError::new(t!("directory.open_failed", error = err)))?
        .ok_or_else(|| CliError::new(t!("directory.none")))?;
    if !quiet {
        write_info(&t!("directory.using", backend = directory.backend().describe()))?;
    }
    Ok(directory)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = HongdConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration, falling back to defaults when no file is present.
fn load_config(path: Option<&Path>) -> CliResult<HongdConfig> {
    HongdConfig::load_or_default(path)
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Writes an informational line to stderr.
fn write_info(message: &str) -> CliResult<()> {
    write_stderr_line(message).map_err(|err| CliError::new(output_error("stderr", &err)))
}

/// Formats an output stream error.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns its exit code.
fn emit_error(err: &CliError) -> ExitCode {
    let _ = write_stderr_line(&err.message);
    ExitCode::from(err.status)
}
