//! Shared helpers for command handlers.

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::Path;

use dialoguer::Input;
use hubctl_core::{Hub, LineScanner, PayloadScanner};
use secrecy::SecretString;

use crate::error::CliError;
use crate::output::TerminalNotifier;

/// Run `fut` behind a spinner that is cleared before returning.
pub async fn with_spinner<F, T>(ui: &TerminalNotifier, message: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = ui.spinner(message);
    let out = fut.await;
    spinner.finish_and_clear();
    out
}

/// Refresh the board, failing with a hint when there is no session.
pub async fn load_devices(hub: &Hub, ui: &TerminalNotifier) -> Result<(), CliError> {
    require_session(hub)?;
    with_spinner(ui, "Loading devices...", hub.refresh_devices()).await?;
    Ok(())
}

pub fn require_session(hub: &Hub) -> Result<(), CliError> {
    if hub.is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotLoggedIn)
    }
}

/// Ask for a value on an interactive terminal; `None` when stdin is piped.
pub fn prompt_text(prompt: &str) -> Result<Option<String>, CliError> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }
    let value: String = Input::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(CliError::prompt)?;
    Ok(Some(value))
}

/// Ask for a password without echo; `None` when stdin is piped.
pub fn prompt_password(prompt: &str) -> Result<Option<SecretString>, CliError> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }
    let password = rpassword::prompt_password(prompt).map_err(CliError::prompt)?;
    Ok(Some(SecretString::from(password)))
}

/// First line of stdin, without the line terminator.
pub fn read_password_stdin() -> Result<SecretString, CliError> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "no password on stdin".into(),
        });
    }
    Ok(SecretString::from(password.to_owned()))
}

/// Pull a device ID out of QR decoder output: a file, or stdin for `-`.
pub fn scan_device_id(source: &Path) -> Result<String, CliError> {
    let id = if source == Path::new("-") {
        LineScanner::new(io::stdin().lock()).scan()?
    } else {
        LineScanner::new(BufReader::new(File::open(source)?)).scan()?
    };
    Ok(id)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn scan_reads_first_payload_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\n  dev-123  \nignored").unwrap();

        assert_eq!(scan_device_id(file.path()).unwrap(), "dev-123");
    }

    #[test]
    fn scan_of_missing_file_is_io_error() {
        let err = scan_device_id(Path::new("/nonexistent/hubctl-scan.txt")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
