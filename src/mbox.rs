use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, SiftError};

/// Reader for mboxo-style archives: a line beginning `From ` starts a new
/// message, body lines beginning `>From ` are unescaped by stripping one `>`.
///
/// Holds the underlying reader for the duration of the scan; not restartable
/// without reopening.
pub struct MboxReader<R: BufRead> {
    reader: R,
    current_line: Vec<u8>,
    message_count: u64,
    saw_content: bool,
    eof: bool,
    /// A `From ` line for the next message is already in `current_line`.
    has_pending_from: bool,
}

impl MboxReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> MboxReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            current_line: Vec::new(),
            message_count: 0,
            saw_content: false,
            eof: false,
            has_pending_from: false,
        }
    }

    /// Read the next raw message, excluding its `From ` separator line.
    ///
    /// Returns `Ok(None)` at end of archive. A non-empty file that never
    /// produces a separator line is a format error.
    pub fn read_message(&mut self) -> Result<Option<Vec<u8>>> {
        if self.eof {
            return Ok(None);
        }

        if !self.has_pending_from {
            loop {
                self.current_line.clear();
                let bytes_read = self.reader.read_until(b'\n', &mut self.current_line)?;

                if bytes_read == 0 {
                    self.eof = true;
                    if self.message_count == 0 && self.saw_content {
                        return Err(SiftError::Format(
                            "no mbox separator line found in non-empty file".to_string(),
                        ));
                    }
                    return Ok(None);
                }

                if !self.current_line.iter().all(|b| b.is_ascii_whitespace()) {
                    self.saw_content = true;
                }

                if self.current_line.starts_with(b"From ") {
                    break;
                }
            }
        }

        self.has_pending_from = false;

        let mut content = Vec::new();
        loop {
            self.current_line.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.current_line)?;

            if bytes_read == 0 {
                self.eof = true;
                break;
            }

            if self.current_line.starts_with(b"From ") {
                // Separator for the next message, keep it for the next call.
                self.has_pending_from = true;
                break;
            }

            // mboxo unescaping
            if self.current_line.starts_with(b">From ") {
                content.extend_from_slice(&self.current_line[1..]);
            } else {
                content.extend_from_slice(&self.current_line);
            }
        }

        // Drop the blank-line separator preceding the next message.
        while content.ends_with(b"\n\n") || content.ends_with(b"\r\n\r\n") {
            content.pop();
        }

        self.message_count += 1;
        Ok(Some(content))
    }

    /// Messages yielded so far.
    pub fn message_count(&self) -> u64 {
        self.message_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(data: &str) -> Vec<Vec<u8>> {
        let mut reader = MboxReader::new(Cursor::new(data.as_bytes()));
        let mut out = Vec::new();
        while let Some(msg) = reader.read_message().unwrap() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_two_messages() {
        let data = "From a@example.com Wed Dec 25 12:00:00 2024\n\
                    Subject: One\n\n\
                    From b@example.com Wed Dec 25 12:01:00 2024\n\
                    Subject: Two\n\nbody\n";
        let messages = collect(data);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with(b"Subject: One"));
        assert!(messages[1].starts_with(b"Subject: Two"));
    }

    #[test]
    fn test_from_unescaping() {
        let data = "From a@example.com\nSubject: X\n\n>From the body\n";
        let messages = collect(data);
        assert_eq!(messages.len(), 1);
        assert!(
            String::from_utf8_lossy(&messages[0]).contains("\nFrom the body"),
            "escaped From line should be unescaped"
        );
    }

    #[test]
    fn test_empty_file_yields_nothing() {
        let mut reader = MboxReader::new(Cursor::new(b"" as &[u8]));
        assert!(reader.read_message().unwrap().is_none());
        assert_eq!(reader.message_count(), 0);
    }

    #[test]
    fn test_non_mbox_file_is_format_error() {
        let mut reader = MboxReader::new(Cursor::new(b"just some text\nno separator\n" as &[u8]));
        match reader.read_message() {
            Err(SiftError::Format(_)) => {}
            other => panic!("expected format error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_exact_message_count() {
        let mut data = String::new();
        for i in 0..5 {
            data.push_str(&format!("From x{i}@example.com\nSubject: {i}\n\nbody {i}\n\n"));
        }
        assert_eq!(collect(&data).len(), 5);
    }
}
