use std::path::PathBuf;
use thiserror::Error;

/// 宛先イメージの重複情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateImage {
    pub image: String,
    pub count: usize,
    /// 同じイメージを指定しているサービス（マニフェスト順）
    pub services: Vec<String>,
}

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("compose file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse compose file: {path}\nreason: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {path}\nreason: {message}")]
    Io { path: PathBuf, message: String },

    #[error("no services found in compose file")]
    NoServices,

    #[error("duplicate destination images: {}", format_duplicates(.0))]
    DuplicateImages(Vec<DuplicateImage>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown service: {0}")]
    UnknownService(String),
}

fn format_duplicates(duplicates: &[DuplicateImage]) -> String {
    duplicates
        .iter()
        .map(|d| format!("{} (used {} times)", d.image, d.count))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ComposeError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            ComposeError::NotFound(path) => {
                format!(
                    "Compose file not found: {}\n\
                     \n\
                     Hint:\n\
                     1. Run in the directory that contains docker-compose.yml\n\
                     2. Or pass the path explicitly: --compose-file path/to/docker-compose.yml\n\
                     3. Or set COMPOSE_FILE",
                    path.display()
                )
            }
            ComposeError::DuplicateImages(duplicates) => {
                let mut message = String::from("Destination images must be unique per run:\n");
                for d in duplicates {
                    message.push_str(&format!(
                        "  - {} is used {} times (services: {})\n",
                        d.image,
                        d.count,
                        d.services.join(", ")
                    ));
                }
                message.push_str("\nNothing was built.");
                message
            }
            ComposeError::NoServices => {
                "No `services` section found in the compose file.".to_string()
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ComposeError>;
