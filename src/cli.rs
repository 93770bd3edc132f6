//! Command-line surface for compress-pics.
//!
//! Known flags are parsed by clap wherever they appear. Every other token is
//! collected verbatim, in order, and handed to the convert tool, so
//! `compress-pics -quality 80 -d pics -r -strip` runs
//! `convert <in> -quality 80 -strip <out>` for each large image. Everything
//! after a literal `--` is forwarded untouched.
//! The compression logic itself lives in [`crate::compress`].

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::Level;

use crate::compress::Compressor;
use crate::config::CONVERT_PROGRAM_ENV;
use crate::convert::CommandConverter;
use crate::load_config::{resolve_settings, Overrides};
use crate::report::CompressReport;

/// CLI for compress-pics: mirror a tree, compressing large images.
#[derive(Parser, Debug)]
#[clap(
    name = "compress-pics",
    version,
    about = "Compress pics using the convert tool. Excess args are passed to convert."
)]
pub struct Cli {
    /// Input file/directory
    #[clap(short = 'd', long = "data", value_name = "PATH")]
    pub data: PathBuf,

    /// Output file/directory. Default: same as input file/directory
    #[clap(short = 'o', long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Minimum size of a file to compress (in bytes). Default: 0
    #[clap(short = 'm', long = "minsize", value_name = "BYTES")]
    pub minsize: Option<u64>,

    /// Recursively process subdirectories if input is a directory
    #[clap(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Increase verbosity (-v per-file decisions, -vv everything)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Optional YAML settings file
    #[clap(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Convert tool to invoke. Default: convert
    #[clap(long = "convert-program", env = CONVERT_PROGRAM_ENV, value_name = "PATH")]
    pub convert_program: Option<PathBuf>,

    /// Arguments passed verbatim to the convert tool, filled by [`split_args`].
    #[clap(skip)]
    pub convert_args: Vec<String>,
}

/// Long options that take a value, with their short spelling if any.
const VALUE_OPTIONS: &[(&str, Option<char>)] = &[
    ("--data", Some('d')),
    ("--out", Some('o')),
    ("--minsize", Some('m')),
    ("--config", Some('c')),
    ("--convert-program", None),
];

const SWITCHES: &[&str] = &["--recursive", "--verbose", "--help", "--version"];

/// Short switches, which may be clustered (`-rv`, `-vv`).
const SWITCH_CHARS: &[char] = &['r', 'v', 'h', 'V'];

impl Cli {
    /// Parses known flags from anywhere in `args` and forwards the rest.
    /// Prints usage and exits on error, like [`Parser::parse_from`].
    pub fn parse_known<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_known(args).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse_known<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let (known, forwarded) = split_args(args);
        let mut cli = Self::try_parse_from(known)?;
        cli.convert_args = forwarded
            .into_iter()
            .map(|arg| {
                arg.into_string().map_err(|bad| {
                    clap::Error::raw(
                        ErrorKind::InvalidUtf8,
                        format!(
                            "convert argument is not valid UTF-8: {}\n",
                            bad.to_string_lossy()
                        ),
                    )
                })
            })
            .collect::<std::result::Result<_, _>>()?;
        Ok(cli)
    }
}

/// Splits argv into the tokens clap understands and the tokens meant for
/// the convert tool.
///
/// The first token (the program name) always stays on the known side.
/// Option values are re-attached as `--long=value` so values starting with
/// `-` survive clap. The legacy `-rec` becomes `--recursive`. Short options
/// taking a value are only recognised on their own (`-d pics`), so convert
/// options such as `-density` are forwarded rather than split.
pub fn split_args<I, T>(args: I) -> (Vec<OsString>, Vec<OsString>)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::<OsString>::into);
    let mut known: Vec<OsString> = args.next().into_iter().collect();
    let mut forwarded = Vec::new();

    while let Some(arg) = args.next() {
        let Some(text) = arg.to_str() else {
            forwarded.push(arg);
            continue;
        };

        if text == "--" {
            forwarded.extend(args.by_ref());
            break;
        }
        if text == "-rec" {
            known.push(OsString::from("--recursive"));
            continue;
        }
        if let Some(long) = value_option(text) {
            if text.contains('=') {
                known.push(arg);
            } else if let Some(value) = args.next() {
                let mut joined = OsString::from(long);
                joined.push("=");
                joined.push(value);
                known.push(joined);
            } else {
                // clap reports the missing value.
                known.push(arg);
            }
            continue;
        }
        if SWITCHES.contains(&text) || is_switch_cluster(text) {
            known.push(arg);
            continue;
        }
        forwarded.push(arg);
    }

    (known, forwarded)
}

fn value_option(arg: &str) -> Option<&'static str> {
    VALUE_OPTIONS.iter().find_map(|&(long, short)| {
        let is_long = arg
            .strip_prefix(long)
            .map_or(false, |rest| rest.is_empty() || rest.starts_with('='));
        let is_short = short.map_or(false, |c| {
            let mut chars = arg.chars();
            chars.next() == Some('-') && chars.next() == Some(c) && chars.next().is_none()
        });
        (is_long || is_short).then_some(long)
    })
}

fn is_switch_cluster(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some(rest) if !rest.is_empty() && !rest.starts_with('-') => {
            rest.chars().all(|c| SWITCH_CHARS.contains(&c))
        }
        _ => false,
    }
}

pub fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// Extracted CLI logic entrypoint for integration tests and main()
pub fn run(cli: Cli) -> Result<CompressReport> {
    tracing::info!("compress_started");

    let overrides = Overrides {
        min_size: cli.minsize,
        recursive: cli.recursive,
        program: cli.convert_program,
        args: cli.convert_args,
    };
    let settings = resolve_settings(cli.config.as_deref(), overrides)?;

    let converter = CommandConverter::new(&settings.convert);
    let mut compressor = Compressor::new(settings, converter);
    compressor
        .compress_path(&cli.data, cli.out.as_deref())
        .with_context(|| format!("Failed to compress {}", cli.data.display()))?;

    let report = compressor.into_report();
    tracing::info!(?report, "Compression complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_known(args.iter().copied()).expect("args should parse")
    }

    #[test]
    fn unknown_args_are_forwarded_in_order() {
        let cli = parse(&[
            "compress-pics", "-d", "pics", "-m", "1000", "-quality", "80", "-resize", "50%",
        ]);
        assert_eq!(cli.data, PathBuf::from("pics"));
        assert_eq!(cli.minsize, Some(1000));
        assert_eq!(cli.convert_args, ["-quality", "80", "-resize", "50%"]);
    }

    #[test]
    fn known_flags_between_forwarded_args_are_honoured() {
        let cli = parse(&[
            "compress-pics", "-d", "in", "-quality", "80", "-rec", "-v", "-strip",
        ]);
        assert_eq!(cli.data, PathBuf::from("in"));
        assert!(cli.recursive);
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.convert_args, ["-quality", "80", "-strip"]);
    }

    #[test]
    fn required_data_may_follow_forwarded_args() {
        let cli = parse(&["compress-pics", "-quality", "80", "-d", "in"]);
        assert_eq!(cli.data, PathBuf::from("in"));
        assert_eq!(cli.convert_args, ["-quality", "80"]);
    }

    #[test]
    fn unknown_long_flags_are_forwarded() {
        let cli = parse(&["compress-pics", "-d", "pics", "--some-future-flag", "x"]);
        assert_eq!(cli.convert_args, ["--some-future-flag", "x"]);
    }

    #[test]
    fn double_dash_forwards_everything_after_it() {
        let cli = parse(&["compress-pics", "-d", "pics", "--", "-v", "-rec", "-d", "x"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.recursive);
        assert_eq!(cli.data, PathBuf::from("pics"));
        assert_eq!(cli.convert_args, ["-v", "-rec", "-d", "x"]);
    }

    #[test]
    fn option_values_may_start_with_a_dash_or_use_equals() {
        let cli = parse(&["compress-pics", "--data=pics", "-o", "-odd-name", "--minsize=5"]);
        assert_eq!(cli.data, PathBuf::from("pics"));
        assert_eq!(cli.out, Some(PathBuf::from("-odd-name")));
        assert_eq!(cli.minsize, Some(5));
        assert!(cli.convert_args.is_empty());
    }

    #[test]
    fn convert_options_sharing_a_short_letter_are_forwarded() {
        let cli = parse(&["compress-pics", "-d", "pics", "-density", "300", "-rotate", "90"]);
        assert_eq!(cli.data, PathBuf::from("pics"));
        assert!(!cli.recursive);
        assert_eq!(cli.convert_args, ["-density", "300", "-rotate", "90"]);
    }

    #[test]
    fn legacy_rec_spelling_sets_recursive() {
        let cli = parse(&["compress-pics", "-d", "pics", "-rec", "-v"]);
        assert!(cli.recursive);
        assert_eq!(cli.verbose, 1);
        assert!(cli.convert_args.is_empty());
    }

    #[test]
    fn output_defaults_to_none_and_verbosity_counts() {
        let cli = parse(&["compress-pics", "--data", "in", "-vv"]);
        assert_eq!(cli.out, None);
        assert_eq!(cli.verbose, 2);
        assert_eq!(log_level(cli.verbose), Level::DEBUG);
        assert_eq!(log_level(0), Level::WARN);
    }

    #[test]
    fn data_is_required() {
        assert!(Cli::try_parse_known(["compress-pics", "-m", "10", "-quality", "80"]).is_err());
    }

    #[test]
    fn missing_option_value_is_an_error() {
        assert!(Cli::try_parse_known(["compress-pics", "-d", "pics", "-m"]).is_err());
    }
}
