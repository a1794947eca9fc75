//! Color mode configuration for diagnostics.

use clap::ValueEnum;
use env_logger::WriteStyle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Always,
    Never,
    #[default]
    Auto,
}

impl ColorMode {
    #[must_use]
    pub const fn write_style(self) -> WriteStyle {
        match self {
            Self::Always => WriteStyle::Always,
            Self::Never => WriteStyle::Never,
            Self::Auto => WriteStyle::Auto,
        }
    }
}
