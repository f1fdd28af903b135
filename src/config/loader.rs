//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::SiteConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Relative directories in the file are resolved against the file's own
/// directory, so a site can be started from any working directory.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;

    if let Some(base) = path.parent() {
        resolve_paths(&mut config, base);
    }
    Ok(config)
}

/// Parse and validate configuration text without touching the filesystem.
pub fn parse_config(content: &str) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn resolve_paths(config: &mut SiteConfig, base: &Path) {
    let resolve = |dir: &mut String| {
        let path = Path::new(dir.as_str());
        if path.is_relative() {
            *dir = base.join(path).to_string_lossy().into_owned();
        }
    };

    resolve(&mut config.site.root);
    if let Some(subsite) = config.site.subsite.as_mut() {
        resolve(subsite);
    }
    if let Some(framework) = config.site.framework_dir.as_mut() {
        resolve(framework);
    }
    for module in &mut config.modules {
        resolve(&mut module.path);
    }
}
