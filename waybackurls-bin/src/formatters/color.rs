//! Defines the colors used in the diagnostics of the CLI.
//!
//! All diagnostics go to stderr, so colors are only enabled if stderr is a
//! terminal (and `NO_COLOR` is not set).

use console::Style;
use log::Level;

/// Color for the `[LEVEL]` prefix of a log message
pub(crate) fn color_for_level(level: Level) -> Style {
    let style = Style::new().for_stderr();
    match level {
        Level::Error => style.color256(197).bold(),
        Level::Warn => style.yellow().bright(),
        Level::Info => style.color256(2).bright(),
        Level::Debug => style.blue().bright(),
        Level::Trace => style.dim(),
    }
}

/// Style of the start-up banner
pub(crate) fn banner_style() -> Style {
    Style::new().for_stderr().color256(82).bold()
}
