/// Counters and warnings accumulated over one run.
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    /// Messages yielded by the archive reader.
    pub parsed: u64,
    /// Records discarded by the exclusion filter (including year filtering).
    pub filtered: u64,
    /// Rows written to the output file, excluding the header row.
    pub written: u64,
    /// Non-fatal problems, in the order they occurred.
    pub warnings: Vec<String>,
    /// The output file may be incomplete (write failed partway).
    pub output_truncated: bool,
}

impl RunReport {
    pub fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "parsed {} messages, excluded {}, wrote {} rows ({} warnings)",
            self.parsed,
            self.filtered,
            self.written,
            self.warnings.len()
        );
        if self.output_truncated {
            summary.push_str(" [output truncated]");
        }
        summary
    }
}
