//! Mirror an input tree into an output tree, handing large images to the
//! convert tool and copying everything else.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::CompressSettings;
use crate::convert::Converter;
use crate::detect::image_kind;
use crate::error::{CompressError, Result};
use crate::fsops::{copy_file, copy_tree, create_directory, same_file};
use crate::report::{CompressReport, FileAction};

pub struct Compressor<C: Converter> {
    settings: CompressSettings,
    converter: C,
    report: CompressReport,
    /// Canonical output directory, never descended into while walking.
    output_root: Option<PathBuf>,
}

impl<C: Converter> Compressor<C> {
    pub fn new(settings: CompressSettings, converter: C) -> Self {
        Self {
            settings,
            converter,
            report: CompressReport::default(),
            output_root: None,
        }
    }

    pub fn report(&self) -> &CompressReport {
        &self.report
    }

    pub fn into_report(self) -> CompressReport {
        self.report
    }

    /// Compresses `input` (file or directory) into `output`, which defaults
    /// to `input` itself for an in-place run.
    pub fn compress_path(&mut self, input: &Path, output: Option<&Path>) -> Result<()> {
        let output = output.unwrap_or(input);
        let meta = match fs::metadata(input) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CompressError::MissingInput(input.to_path_buf()))
            }
            Err(e) => return Err(CompressError::io(input, e)),
        };

        if meta.is_file() {
            let outfile = match (output.is_dir(), input.file_name()) {
                (true, Some(name)) => output.join(name),
                _ => output.to_path_buf(),
            };
            self.compress_file(input, &outfile)?;
        } else {
            create_directory(output)?;
            if !same_file(input, output) {
                self.output_root = fs::canonicalize(output).ok();
            }
            self.compress_dir(input, output)?;
        }
        Ok(())
    }

    /// Copies or converts a single file, depending on its size and content.
    pub fn compress_file(&mut self, infile: &Path, outfile: &Path) -> Result<FileAction> {
        let insize = fs::metadata(infile)
            .map_err(|e| CompressError::io(infile, e))?
            .len();
        let min_size = self.settings.min_size;

        let action = if insize <= min_size {
            info!(
                path = %infile.display(),
                size = insize,
                min_size,
                "Skipping {}: Size {} <= {}", infile.display(), insize, min_size
            );
            self.copy_unless_same(infile, outfile, FileAction::CopiedBelowThreshold)?
        } else if let Some(kind) = image_kind(infile).map_err(|e| CompressError::io(infile, e))? {
            debug!(path = %infile.display(), ?kind, "Detected image");
            let outcome = self.converter.convert(infile, outfile);
            if outcome.is_success() {
                info!(
                    path = %infile.display(),
                    out = %outfile.display(),
                    "Compressed {} into {}", infile.display(), outfile.display()
                );
                FileAction::Converted
            } else {
                warn!(
                    path = %infile.display(),
                    out = %outfile.display(),
                    ?outcome,
                    "Conversion of {} did not succeed", infile.display()
                );
                FileAction::ConversionFailed
            }
        } else {
            let action = self.copy_unless_same(infile, outfile, FileAction::CopiedNonImage)?;
            info!(
                path = %infile.display(),
                "Directly copied non-image file: {}", infile.display()
            );
            action
        };

        self.report.record(action, insize);
        Ok(action)
    }

    /// Processes every entry of `indir` in listing order, mirroring it into
    /// `outdir`.
    pub fn compress_dir(&mut self, indir: &Path, outdir: &Path) -> Result<()> {
        create_directory(outdir)?;
        self.report.directories += 1;

        let entries = fs::read_dir(indir).map_err(|e| CompressError::io(indir, e))?;
        for entry_res in entries {
            let entry = entry_res.map_err(|e| CompressError::io(indir, e))?;
            let name = entry.file_name();
            let inpath = indir.join(&name);
            let outpath = outdir.join(&name);

            // Follows symlinks, so links to files are compressed like files.
            match fs::metadata(&inpath) {
                Ok(meta) if meta.is_file() => {
                    self.compress_file(&inpath, &outpath)?;
                }
                Ok(meta) if meta.is_dir() => {
                    if self.is_output_root(&inpath) {
                        debug!(path = %inpath.display(), "Skipping output directory inside input tree");
                        continue;
                    }
                    if self.settings.recursive {
                        self.compress_dir(&inpath, &outpath)?;
                    } else if same_file(&inpath, &outpath) {
                        debug!(path = %inpath.display(), "Subdirectory already in place");
                    } else {
                        copy_tree(&inpath, &outpath, self.output_root.as_deref())?;
                        self.report.subtrees_copied += 1;
                        info!(
                            path = %inpath.display(),
                            out = %outpath.display(),
                            "Copied subdirectory {} to {}", inpath.display(), outpath.display()
                        );
                    }
                }
                Ok(_) => {
                    warn!(path = %inpath.display(), "Skipping entry that is neither file nor directory");
                    self.report.record(FileAction::Skipped, 0);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(path = %inpath.display(), "Skipping dangling symlink");
                    self.report.record(FileAction::Skipped, 0);
                }
                Err(e) => return Err(CompressError::io(&inpath, e)),
            }
        }

        info!(
            path = %indir.display(),
            out = %outdir.display(),
            "Compressed directory {} into {}", indir.display(), outdir.display()
        );
        Ok(())
    }

    fn copy_unless_same(
        &self,
        infile: &Path,
        outfile: &Path,
        action: FileAction,
    ) -> Result<FileAction> {
        if same_file(infile, outfile) {
            debug!(path = %infile.display(), "Source and destination are the same file");
            return Ok(FileAction::Skipped);
        }
        copy_file(infile, outfile)?;
        Ok(action)
    }

    fn is_output_root(&self, path: &Path) -> bool {
        match (&self.output_root, fs::canonicalize(path)) {
            (Some(root), Ok(canonical)) => *root == canonical,
            _ => false,
        }
    }
}
