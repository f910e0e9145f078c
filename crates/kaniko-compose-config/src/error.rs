use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("home directory not found (set DOCKER_CONFIG or pass --docker-config)")]
    HomeDirNotFound,

    #[error("failed to read env file: {path}\nreason: {message}")]
    EnvFile { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::HomeDirNotFound => "Could not resolve the registry credentials directory.\n\
                 \n\
                 Hint:\n\
                 1. Set DOCKER_CONFIG to the directory containing config.json\n\
                 2. Or pass --docker-config path/to/.docker"
                .to_string(),
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
