// QR scanning collaborator.
//
// Camera access is out of scope: something else decodes the label and
// we only consume the text it produced.

use std::io::BufRead;

use crate::error::CoreError;

/// Produces the device ID encoded on a device label.
pub trait PayloadScanner {
    fn scan(&mut self) -> Result<String, CoreError>;
}

/// Reads the first non-blank line from a text source, such as the
/// output of `zbarimg --raw` or a file holding the payload.
pub struct LineScanner<R> {
    reader: R,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> PayloadScanner for LineScanner<R> {
    fn scan(&mut self) -> Result<String, CoreError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| CoreError::Storage {
                    message: format!("failed to read scanner output: {e}"),
                })?;
            if read == 0 {
                return Err(CoreError::validation(
                    "id",
                    "scanner produced no device ID",
                ));
            }
            let payload = line.trim();
            if !payload.is_empty() {
                return Ok(payload.to_owned());
            }
        }
    }
}
