// compress-pics/src/config.rs

use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_CONVERT_PROGRAM: &str = "convert";

/// Environment variable naming the convert binary, read through clap.
pub const CONVERT_PROGRAM_ENV: &str = "COMPRESS_PICS_CONVERT";

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressSettings {
    /// Files at or below this many bytes are copied untouched.
    pub min_size: u64,
    /// Descend into subdirectories instead of copying them whole.
    pub recursive: bool,
    pub convert: ConvertSettings,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            min_size: 0,
            recursive: false,
            convert: ConvertSettings::default(),
        }
    }
}

impl CompressSettings {
    pub fn trace_loaded(&self) {
        info!(
            min_size = self.min_size,
            recursive = self.recursive,
            program = %self.convert.program.display(),
            "Loaded compression settings"
        );
        debug!(?self, "Compression settings (full debug)");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSettings {
    pub program: PathBuf,
    /// Passed verbatim between the input and output paths.
    pub args: Vec<String>,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_CONVERT_PROGRAM),
            args: Vec::new(),
        }
    }
}
