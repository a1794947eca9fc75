use super::host::Host;
use crate::Result;
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use anyhow::bail;
use camino::Utf8PathBuf;
use clap::Args;
use std::io::Write;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the configuration file
    #[arg(long, short, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub output: Utf8PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Write the default configuration so it can be edited.
pub fn init_config<H: Host>(host: &mut H, args: &InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!("'{}' already exists, use --force to overwrite it", args.output);
    }

    Config::save_default(&args.output)?;
    let _ = writeln!(host.output(), "wrote default configuration to {}", args.output);
    Ok(())
}
