//! Terminal presentation for the CLI
//!
//! Color is decided once per run from the `--color` flag and the
//! environment:
//! - `--color=always` / `--color=never` win outright
//! - in `auto` mode, `NO_COLOR` (any value) or `CLICOLOR=0` or `TERM=dumb`
//!   turn color off, `CLICOLOR_FORCE` turns it on, and otherwise the
//!   terminal's own capabilities decide
//!
//! Without color, status markers fall back to bracketed ASCII tags so logs
//! and pipes stay readable.

use std::env;
use std::fmt;

use console::style;

/// The `--color` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// Outcome markers printed in front of status lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
    Warning,
    Info,
}

/// Decides how status lines look
#[derive(Debug, Clone, Copy)]
pub struct Console {
    use_color: bool,
}

impl Console {
    pub fn new(choice: ColorChoice) -> Self {
        let use_color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => detect_color_support(),
        };
        Self { use_color }
    }

    /// A console that never colors, for tests and pipes
    pub fn plain() -> Self {
        Self { use_color: false }
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// The marker for a status
    pub fn marker(&self, status: Status) -> String {
        if !self.use_color {
            return match status {
                Status::Ok => "[OK]",
                Status::Failed => "[ERR]",
                Status::Warning => "[WARN]",
                Status::Info => "[INFO]",
            }
            .to_string();
        }
        let styled = match status {
            Status::Ok => style("✔").green(),
            Status::Failed => style("✘").red(),
            Status::Warning => style("!").yellow(),
            Status::Info => style("•").cyan(),
        };
        styled.force_styling(true).to_string()
    }

    /// A status line: marker, space, message
    pub fn line(&self, status: Status, message: impl fmt::Display) -> String {
        format!("{} {}", self.marker(status), message)
    }

    /// Emphasized text, bold when colored
    pub fn heading(&self, text: &str) -> String {
        if self.use_color {
            style(text).bold().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

fn detect_color_support() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
        return true;
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    console::Term::stdout().features().colors_supported()
}
