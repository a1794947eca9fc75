use super::host::Host;
use super::init::{InitArgs, init_config};
use super::update::{UpdateArgs, UpdateStatus, process_update};
use crate::misc::ColorMode;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::ffi::OsString;
use std::io::Write;

/// Log target for command dispatch
const LOG_TARGET: &str = "run";

#[derive(Parser, Debug)]
#[command(name = "profile-banner", version, about = "Refresh the uptime and GitHub statistics shown in a profile banner")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// When to color log output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute the statistics and patch the banner documents (default)
    Update(UpdateArgs),

    /// Write the default configuration file
    Init(InitArgs),
}

/// Parse `args` and run the selected command, reporting the exit code through `host`.
pub async fn run<H, I, T>(host: &mut H, args: I)
where
    H: Host,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                let _ = write!(host.error(), "{}", e.render());
                UpdateStatus::NoDocuments.exit_code()
            } else {
                let _ = write!(host.output(), "{}", e.render());
                0
            };
            host.exit(code);
            return;
        }
    };

    init_logging(cli.verbose, cli.color);

    let code = match cli.command {
        Some(Command::Init(args)) => match init_config(host, &args) {
            Ok(()) => 0,
            Err(e) => {
                let _ = writeln!(host.error(), "error: {e:#}");
                1
            }
        },
        Some(Command::Update(args)) => run_update(host, &args).await,
        None => run_update(host, &UpdateArgs::default()).await,
    };

    host.exit(code);
}

async fn run_update<H: Host>(host: &mut H, args: &UpdateArgs) -> i32 {
    match process_update(host, args).await {
        Ok(status) => status.exit_code(),
        Err(e) => {
            log::error!(target: LOG_TARGET, "Update failed: {e:#}");
            let _ = writeln!(host.error(), "error: {e:#}");
            UpdateStatus::NoDocuments.exit_code()
        }
    }
}

fn init_logging(verbose: u8, color: ColorMode) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // Tests call `run` repeatedly, only the first initialization takes effect
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .write_style(color.write_style())
        .try_init();
}
