//! Import statistics tracking.

/// Counters for a single import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Non-blank lines read from the file
    pub lines: usize,
    /// Lines that produced an offer
    pub imported: usize,
    /// Lines rejected by the parser or by validation
    pub skipped: usize,
}

impl ImportStats {
    pub fn record_imported(&mut self) {
        self.lines += 1;
        self.imported += 1;
    }

    pub fn record_skipped(&mut self) {
        self.lines += 1;
        self.skipped += 1;
    }
}
