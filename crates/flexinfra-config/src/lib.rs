pub mod error;
pub mod model;

pub use error::*;
pub use model::{InfraConfig, ProviderEntry, ProviderKind, ServerEntry};

use std::path::{Path, PathBuf};

const CANDIDATES: [&str; 2] = ["infra.local.yaml", "infra.yaml"];

/// flexinfra's global config directory (`~/.config/flexinfra`)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("flexinfra"))
}

/// Find the infrastructure file
///
/// Search order:
/// 1. `FLEXINFRA_CONFIG_PATH` env var (direct path)
/// 2. current directory: infra.local.yaml, infra.yaml
/// 3. `./.flexinfra/`: same order
/// 4. `~/.config/flexinfra/infra.yaml` (global)
pub fn find_infra_file() -> Result<PathBuf> {
    // 1. direct path
    if let Ok(config_path) = std::env::var("FLEXINFRA_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "FLEXINFRA_CONFIG_PATH points at missing file {}",
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;

    // 2. current directory
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. ./.flexinfra/
    let local_dir = current_dir.join(".flexinfra");
    if local_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = local_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    // 4. global
    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("infra.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::InfraFileNotFound)
}

/// Parse an infrastructure file
pub fn load_infra_file(path: &Path) -> Result<InfraConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_infra(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    tracing::debug!(
        "Loaded {} with {} providers, {} servers",
        path.display(),
        config.providers.len(),
        config.servers.len()
    );
    Ok(config)
}

/// Parse infrastructure YAML
pub fn parse_infra(content: &str) -> std::result::Result<InfraConfig, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Find and parse the infrastructure file
pub fn load() -> Result<(PathBuf, InfraConfig)> {
    let path = find_infra_file()?;
    let config = load_infra_file(&path)?;
    Ok((path, config))
}
