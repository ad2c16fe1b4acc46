//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.
//! Notifications go to stderr so stdout stays machine-readable.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use hubctl_core::{DeviceState, Notification, Notifier, Severity};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Device state, green for ON and dimmed for OFF.
pub fn paint_state(state: DeviceState, color: bool) -> String {
    if !color {
        return state.to_string();
    }
    match state {
        DeviceState::On => state.green().bold().to_string(),
        DeviceState::Off => state.dimmed().to_string(),
        DeviceState::Unknown => state.yellow().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are
/// key/value blocks rather than tables.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

// ── Notifications & progress ─────────────────────────────────────────

/// Shows notifications and loading spinners on stderr.
///
/// Successes print title and description. Failures print only the
/// title: the error itself follows as a diagnostic. Lines are written
/// with any running spinner suspended.
#[derive(Debug, Clone)]
pub struct TerminalNotifier {
    progress: MultiProgress,
    color: bool,
    quiet: bool,
}

impl TerminalNotifier {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self {
            progress: MultiProgress::new(),
            color,
            quiet,
        }
    }

    /// Start a spinner; it disappears on `finish_and_clear`.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let spinner = self.progress.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓", "✓"]));
        }
        spinner.set_message(message.to_owned());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    /// Informational line on stderr, hidden by `--quiet`.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.eprintln(message);
        }
    }

    fn eprintln(&self, line: &str) {
        self.progress.suspend(|| {
            let _ = writeln!(io::stderr().lock(), "{line}");
        });
    }

    fn line(&self, n: &Notification) -> Option<String> {
        match n.severity {
            Severity::Success if self.quiet => None,
            Severity::Success if self.color => Some(format!(
                "{} {} {}",
                "✓".green(),
                n.title.bold(),
                n.description
            )),
            Severity::Success => Some(format!("✓ {} {}", n.title, n.description)),
            Severity::Error if self.color => Some(format!("{} {}", "✗".red(), n.title.red())),
            Severity::Error => Some(format!("✗ {}", n.title)),
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        if let Some(line) = self.line(&notification) {
            self.eprintln(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_notifications() {
        let notifier = TerminalNotifier::new(false, false);
        assert_eq!(
            notifier
                .line(&Notification::success("Logged out", "You have been successfully logged out."))
                .as_deref(),
            Some("✓ Logged out You have been successfully logged out.")
        );
        assert_eq!(
            notifier
                .line(&Notification::error("Login failed", "bad credentials"))
                .as_deref(),
            Some("✗ Login failed")
        );
    }

    #[test]
    fn quiet_hides_success_only() {
        let notifier = TerminalNotifier::new(false, true);
        assert!(notifier.line(&Notification::success("Device activated", "Lamp is now ON")).is_none());
        assert!(notifier.line(&Notification::error("Failed to toggle device", "")).is_some());
    }

    #[test]
    fn uncolored_state_is_wire_form() {
        assert_eq!(paint_state(DeviceState::On, false), "ON");
        assert_eq!(paint_state(DeviceState::Off, false), "OFF");
    }
}
