use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Infrastructure file not found. Checked:\n\
        - current directory: infra.local.yaml, infra.yaml\n\
        - ./.flexinfra/ directory\n\
        - ~/.config/flexinfra/infra.yaml\n\
        Set FLEXINFRA_CONFIG_PATH to point at a file directly"
    )]
    InfraFileNotFound,

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
