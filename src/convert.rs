//! # convert: the seam to the external image-conversion tool
//!
//! The compressor never talks to ImageMagick directly; it goes through the
//! [`Converter`] trait. [`CommandConverter`] is the real implementation and
//! spawns `<program> <input> <args...> <output>` as a blocking child process.
//! Tests substitute the `mockall`-generated `MockConverter`.

use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use tracing::{debug, warn};

use crate::config::ConvertSettings;

/// What happened when the convert tool ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertOutcome {
    Success,
    /// The tool ran but exited non-zero (`None` when killed by a signal).
    Failed(Option<i32>),
    /// The tool could not be started at all.
    NotLaunched,
}

impl ConvertOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConvertOutcome::Success)
    }
}

/// Converts one image file into another.
///
/// Implementations report failures through [`ConvertOutcome`] instead of an
/// error: a broken conversion must never stop the rest of the tree.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Converter {
    fn convert(&self, input: &Path, output: &Path) -> ConvertOutcome;
}

/// Runs an external program (ImageMagick `convert` by default).
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandConverter {
    pub fn new(settings: &ConvertSettings) -> Self {
        Self {
            program: settings.program.clone(),
            args: settings.args.clone(),
        }
    }

    /// Builds the command line without running it.
    pub fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(input).args(&self.args).arg(output);
        cmd
    }
}

impl Converter for CommandConverter {
    fn convert(&self, input: &Path, output: &Path) -> ConvertOutcome {
        debug!(
            program = %self.program.display(),
            args = ?self.args,
            input = %input.display(),
            output = %output.display(),
            "Launching convert tool"
        );

        match self.command(input, output).status() {
            Ok(s) if s.success() => ConvertOutcome::Success,
            Ok(s) => {
                warn!(
                    program = %self.program.display(),
                    input = %input.display(),
                    "Convert tool exited with non-zero status: {}", s
                );
                ConvertOutcome::Failed(s.code())
            }
            Err(e) => {
                warn!(
                    error = ?e,
                    program = %self.program.display(),
                    input = %input.display(),
                    "Failed to launch convert tool"
                );
                ConvertOutcome::NotLaunched
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(args: &[&str]) -> CommandConverter {
        CommandConverter::new(&ConvertSettings {
            program: PathBuf::from("convert"),
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    #[test]
    fn command_places_args_between_input_and_output() {
        let conv = converter(&["-quality", "80", "-strip"]);
        let cmd = conv.command(Path::new("in dir/a.jpg"), Path::new("out/a.jpg"));

        assert_eq!(cmd.get_program(), "convert");
        let argv: Vec<_> = cmd.get_args().collect();
        assert_eq!(
            argv,
            ["in dir/a.jpg", "-quality", "80", "-strip", "out/a.jpg"]
        );
    }

    #[test]
    fn missing_program_is_reported_not_raised() {
        let conv = CommandConverter::new(&ConvertSettings {
            program: PathBuf::from("definitely-not-a-real-convert-binary"),
            args: vec![],
        });
        assert_eq!(
            conv.convert(Path::new("a.png"), Path::new("b.png")),
            ConvertOutcome::NotLaunched
        );
    }
}
