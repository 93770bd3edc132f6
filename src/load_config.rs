use crate::config::CompressSettings;
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StaticConfig {
    #[serde(default)]
    min_size: Option<u64>,
    #[serde(default)]
    recursive: Option<bool>,
    #[serde(default)]
    convert: ConvertSection,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConvertSection {
    #[serde(default)]
    program: Option<PathBuf>,
    #[serde(default)]
    args: Option<Vec<String>>,
}

/// Values given on the command line (or through the environment via clap).
/// `None`/empty means "not given", so the config file or defaults apply.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub min_size: Option<u64>,
    pub recursive: bool,
    pub program: Option<PathBuf>,
    pub args: Vec<String>,
}

/// Loads a YAML settings file. Keys that are absent keep their defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CompressSettings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    let static_conf: StaticConfig = if config_content.trim().is_empty() {
        StaticConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => conf,
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    let mut settings = CompressSettings::default();
    if let Some(min_size) = static_conf.min_size {
        settings.min_size = min_size;
    }
    if let Some(recursive) = static_conf.recursive {
        settings.recursive = recursive;
    }
    if let Some(program) = static_conf.convert.program {
        settings.convert.program = program;
    }
    if let Some(args) = static_conf.convert.args {
        settings.convert.args = args;
    }

    info!(config_path = ?path_ref, "Config file parsed successfully");
    Ok(settings)
}

/// Layers command-line overrides on top of the config file (if any) and the
/// built-in defaults.
pub fn resolve_settings(config: Option<&Path>, overrides: Overrides) -> Result<CompressSettings> {
    let mut settings = match config {
        Some(path) => load_config(path)?,
        None => CompressSettings::default(),
    };

    if let Some(min_size) = overrides.min_size {
        settings.min_size = min_size;
    }
    if overrides.recursive {
        settings.recursive = true;
    }
    if let Some(program) = overrides.program {
        settings.convert.program = program;
    }
    if !overrides.args.is_empty() {
        settings.convert.args = overrides.args;
    }

    settings.trace_loaded();
    Ok(settings)
}
