use config as config_rs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use codecloak_core::workspace::DEFAULT_SOURCE_SUFFIXES;

/// Default mapping artifact name, resolved inside the project directory.
pub const DEFAULT_MAPPING_FILE: &str = "codecloak-mapping.txt";

/// Optional JSON configuration file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub mapping_file: Option<String>,
    pub packages: Vec<String>,
    pub package_renames: BTreeMap<String, String>,
    pub reserved_words: Vec<String>,
    pub source_suffixes: Option<Vec<String>>,
    pub manifest: Option<String>,
}

/// Fully resolved settings for one obfuscation session.
#[derive(Debug)]
pub struct ObfuscateSettings {
    pub project: PathBuf,
    pub mapping_file: PathBuf,
    /// Explicit working set. Empty means whole-tree package discovery.
    pub packages: Vec<String>,
    pub package_renames: BTreeMap<String, String>,
    pub reserved_words: Vec<String>,
    pub source_suffixes: Vec<String>,
    pub manifest: Option<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(#[from] config_rs::ConfigError),
}

/// Resolve the session settings. Precedence, lowest to highest: built-in
/// defaults, the JSON config file, `CODECLOAK_*` environment variables,
/// command-line flags. Relative mapping and manifest paths are resolved
/// against the project directory.
pub fn load_settings(
    project: PathBuf,
    mapping: Option<PathBuf>,
    config_path: Option<PathBuf>,
    packages: Vec<String>,
    manifest: Option<PathBuf>,
    dry_run: bool,
) -> Result<ObfuscateSettings, ConfigError> {
    let file = match &config_path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_json::from_str::<FileConfig>(&content)?
        }
        None => FileConfig::default(),
    };

    // Layered scalar settings: defaults, file, env, CLI flags.
    let mut builder = config_rs::Config::builder()
        .set_default("mapping_file", DEFAULT_MAPPING_FILE)?
        .set_override_option("mapping_file", file.mapping_file.clone())?
        .set_override_option("manifest", file.manifest.clone())?;

    if let Ok(path) = std::env::var("CODECLOAK_MAPPING") {
        builder = builder.set_override("mapping_file", path)?;
    }
    if let Ok(path) = std::env::var("CODECLOAK_MANIFEST") {
        builder = builder.set_override("manifest", path)?;
    }

    builder = builder
        .set_override_option(
            "mapping_file",
            mapping.map(|p| p.to_string_lossy().into_owned()),
        )?
        .set_override_option(
            "manifest",
            manifest.map(|p| p.to_string_lossy().into_owned()),
        )?;

    let cfg = builder.build()?;

    let mapping_file = resolve_against(&project, &cfg.get::<String>("mapping_file")?);
    let manifest = match cfg.get::<String>("manifest") {
        Ok(path) => Some(resolve_against(&project, &path)),
        Err(config_rs::ConfigError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    let packages = if packages.is_empty() {
        file.packages
    } else {
        packages
    };
    let source_suffixes = file.source_suffixes.unwrap_or_else(|| {
        DEFAULT_SOURCE_SUFFIXES
            .iter()
            .map(|s| s.to_string())
            .collect()
    });

    Ok(ObfuscateSettings {
        project,
        mapping_file,
        packages,
        package_renames: file.package_renames,
        reserved_words: file.reserved_words,
        source_suffixes,
        manifest,
        dry_run,
    })
}

fn resolve_against(project: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        project.join(path)
    }
}
