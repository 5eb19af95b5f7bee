use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Default layout file name when none is given.
pub const DEFAULT_CONFIG: &str = "config.ini";

/// Directory holding `config`. A bare file name lives in `.`.
pub fn config_dir(config: &Path) -> &Path {
    config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Make `config` absolute against the current working directory.
pub fn absolutize(config: &Path) -> Result<PathBuf> {
    std::path::absolute(config)
        .with_context(|| format!("Failed to resolve config path {}", config.display()))
}

/// Switch the working directory to the config file's directory, so relative
/// paths inside the layout resolve next to it. Returns the absolute config path.
pub fn enter_config_dir(config: &Path) -> Result<PathBuf> {
    let absolute = absolutize(config)?;
    let dir = config_dir(&absolute);
    env::set_current_dir(dir)
        .with_context(|| format!("Failed to enter config directory {}", dir.display()))?;
    debug!(target: "touchjoy::config", dir = %dir.display(), "Working directory set");
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_lives_in_current_dir() {
        assert_eq!(config_dir(Path::new("config.ini")), Path::new("."));
        assert_eq!(config_dir(Path::new("pads/config.ini")), Path::new("pads"));
        assert_eq!(config_dir(Path::new("/pads/a.ini")), Path::new("/pads"));
    }

    #[test]
    fn absolutize_joins_relative_paths_onto_cwd() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(
            absolutize(Path::new("pads/config.ini")).unwrap(),
            cwd.join("pads").join("config.ini")
        );
        let abs = cwd.join("x.ini");
        assert_eq!(absolutize(&abs).unwrap(), abs);
    }
}
