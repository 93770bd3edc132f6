use serde::Serialize;
use std::fmt;

/// Outcome for a single input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileAction {
    /// Size was at or below the threshold; copied verbatim.
    CopiedBelowThreshold,
    /// Handed to the convert tool, which succeeded.
    Converted,
    /// Handed to the convert tool, which failed or could not be launched.
    ConversionFailed,
    /// Above the threshold but not an image; copied verbatim.
    CopiedNonImage,
    /// Nothing to do: source and destination are the same file, or the
    /// entry could not be classified (e.g. a dangling symlink).
    Skipped,
}

/// Tally of everything a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompressReport {
    pub copied_below_threshold: u64,
    pub converted: u64,
    pub conversion_failed: u64,
    pub copied_non_image: u64,
    pub skipped: u64,
    pub directories: u64,
    pub subtrees_copied: u64,
    pub bytes_in: u64,
}

impl CompressReport {
    pub fn record(&mut self, action: FileAction, size: u64) {
        self.bytes_in += size;
        match action {
            FileAction::CopiedBelowThreshold => self.copied_below_threshold += 1,
            FileAction::Converted => self.converted += 1,
            FileAction::ConversionFailed => self.conversion_failed += 1,
            FileAction::CopiedNonImage => self.copied_non_image += 1,
            FileAction::Skipped => self.skipped += 1,
        }
    }

    pub fn files(&self) -> u64 {
        self.copied_below_threshold
            + self.converted
            + self.conversion_failed
            + self.copied_non_image
            + self.skipped
    }
}

impl fmt::Display for CompressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processed {} file(s) ({} bytes):", self.files(), self.bytes_in)?;
        writeln!(f, "  converted:              {}", self.converted)?;
        writeln!(f, "  conversion failures:    {}", self.conversion_failed)?;
        writeln!(f, "  copied (below minsize): {}", self.copied_below_threshold)?;
        writeln!(f, "  copied (non-image):     {}", self.copied_non_image)?;
        writeln!(f, "  skipped:                {}", self.skipped)?;
        write!(
            f,
            "  directories: {}, subtrees copied whole: {}",
            self.directories, self.subtrees_copied
        )
    }
}
