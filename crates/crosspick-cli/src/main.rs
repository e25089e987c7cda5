use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use crosspick_core::config::{Backend, Config, OutputFormat};
use crosspick_core::{Color, PickError};
use log::{info, warn};
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

/// Exit status when the environment cannot support picking at all.
const FATAL: u8 = 1;
/// Exit status when the click was taken but no colour could be read.
const COLOR_GRAB_FAILED: u8 = 3;

#[derive(Parser)]
#[command(
    name = "crosspick",
    about = "Click anywhere on screen and print the color of that pixel",
    version,
    disable_help_flag = true
)]
struct Cli {
    #[command(flatten)]
    opts: PickOpts,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct PickOpts {
    /// Output format (hex, json — overrides config)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Copy the hex value to the clipboard
    #[arg(short, long)]
    clipboard: bool,

    /// Display server (auto, x11, wayland — overrides config)
    #[arg(short, long)]
    backend: Option<Backend>,

    /// X display to use instead of $DISPLAY (implies --backend x11)
    #[arg(short, long)]
    display: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or modify configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set a config value
    Set {
        /// Key=value pair (e.g. format=json)
        pair: String,
    },
    /// Reset config to defaults
    Reset,
    /// Show config file path
    Path,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // The banner goes out before any display is touched.
    if help_requested(std::env::args_os()) {
        print_banner();
        return ExitCode::from(FATAL);
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(FATAL)
        }
    }
}

/// Any argument starting with `-h`, or `--help`.
fn is_help_arg(arg: &OsStr) -> bool {
    let bytes = arg.as_encoded_bytes();
    bytes.starts_with(b"-h") || bytes == b"--help"
}

/// Check the arguments after the program name for a help request.
fn help_requested(args: impl IntoIterator<Item = OsString>) -> bool {
    args.into_iter().skip(1).any(|a| is_help_arg(&a))
}

fn print_banner() {
    eprintln!("crosspick {}", env!("CARGO_PKG_VERSION"));
    eprintln!("{}", Cli::command().render_help());
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = Config::config_path();

    match cli.command {
        Some(Commands::Config { action }) => {
            cmd_config(&config_path, action)?;
            Ok(ExitCode::SUCCESS)
        }
        None => cmd_pick(&config_path, cli.opts),
    }
}

/// Picking never fails because of the config file.
fn pick_config(path: &Path) -> Config {
    Config::load_from(path).unwrap_or_else(|e| {
        warn!(
            "ignoring {}: {:#}",
            path.display(),
            anyhow::Error::from(e)
        );
        Config::default()
    })
}

fn select_backend(opts: &PickOpts, config: &Config) -> Backend {
    match (opts.backend, &opts.display) {
        (Some(Backend::Wayland), Some(display)) => {
            warn!("--display {display} has no effect on the wayland backend");
            Backend::Wayland
        }
        (_, Some(_)) => Backend::X11,
        (Some(backend), None) => backend,
        (None, None) => config.backend,
    }
}

/// Exit status for a pick that did not produce a colour.
fn exit_status(err: &PickError) -> u8 {
    if err.is_fatal() {
        FATAL
    } else {
        COLOR_GRAB_FAILED
    }
}

fn cmd_pick(config_path: &Path, opts: PickOpts) -> Result<ExitCode> {
    let config = pick_config(config_path);
    let server = select_backend(&opts, &config).resolve()?;
    info!("picking from {server}");

    let result = crosspick_core::pick(server, opts.display.as_deref());
    let picked = result.as_ref().ok().copied();
    let status = report(
        result,
        opts.format.unwrap_or(config.format),
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )?;

    if let Some(color) = picked {
        if opts.clipboard || config.copy_to_clipboard {
            crosspick_core::clipboard::copy_text(&color.hex())
                .context("failed to copy to clipboard")?;
            info!("copied {color} to clipboard");
        }
    }

    Ok(ExitCode::from(status))
}

/// Write the outcome of a pick and return the exit status.
///
/// Only a colour ever reaches `out`; failures get one line on `err`.
fn report(
    result: Result<Color, PickError>,
    format: OutputFormat,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<u8> {
    match result {
        Ok(color) => {
            print_color(&color, format, out, err)?;
            Ok(0)
        }
        Err(e) => {
            let status = exit_status(&e);
            let prefix = if status == FATAL { "error: " } else { "" };
            writeln!(err, "{prefix}{:#}", anyhow::Error::from(e))?;
            Ok(status)
        }
    }
}

fn print_color(
    color: &Color,
    format: OutputFormat,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<()> {
    match format {
        OutputFormat::Hex => {
            writeln!(out, "{}", color.hex())?;
            out.flush()?;
            writeln!(err, "{}", color.decimal())?;
        }
        OutputFormat::Json => {
            writeln!(out, "{}", color.to_json()?)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn cmd_config(config_path: &Path, action: Option<ConfigAction>) -> Result<()> {
    let action = action.unwrap_or(ConfigAction::Show);
    match action {
        ConfigAction::Show => {
            let config = Config::load_from(config_path).context("failed to load config")?;
            println!("{}", config.display());
        }
        ConfigAction::Set { pair } => {
            let mut config = Config::load_from(config_path).context("failed to load config")?;
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("invalid format. use: key=value"))?;
            config
                .set_value(key.trim(), value.trim())
                .map_err(|e| anyhow::anyhow!(e))?;
            config.save_to(config_path)?;
            eprintln!("set {key} = {value}");
        }
        ConfigAction::Reset => {
            Config::default().save_to(config_path)?;
            eprintln!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}
