use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::Spawn { program, .. } => {
                format!(
                    "{}\n\
                     \n\
                     Hint:\n\
                     1. Make sure {} is installed and on PATH\n\
                     2. Or choose another engine: --engine docker",
                    self, program
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
