//! Defines the colors used in the output of the CLI.

use std::sync::LazyLock;

use console::Style;
use log::Level;

pub(crate) static BOLD: LazyLock<Style> = LazyLock::new(|| Style::new().bold());
pub(crate) static DIM: LazyLock<Style> = LazyLock::new(|| Style::new().dim());

pub(crate) static GREEN: LazyLock<Style> = LazyLock::new(|| Style::new().green().bright());
pub(crate) static YELLOW: LazyLock<Style> = LazyLock::new(|| Style::new().yellow().bright());
pub(crate) static RED: LazyLock<Style> = LazyLock::new(|| Style::new().red().bright());

// Used for debug log messages
pub(crate) static BLUE: LazyLock<Style> = LazyLock::new(|| Style::new().blue().bright());

pub(crate) fn color_for_level(level: Level) -> &'static Style {
    match level {
        Level::Error => &RED,
        Level::Warn => &YELLOW,
        Level::Info => &GREEN,
        Level::Debug | Level::Trace => &BLUE,
    }
}
