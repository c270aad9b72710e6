use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ErdError {
    #[error("entity '{0}' has no position")]
    MissingPosition(String),

    #[error("entity '{0}' is not defined in the schema")]
    UnknownEntity(String),

    #[error("position given for undefined entity '{0}'")]
    OrphanPosition(String),

    #[error("entity '{0}' is defined more than once")]
    DuplicateEntity(String),

    #[error("invalid waypoint coordinate '{0}' (expected a number or source|target|mid|min|max with an optional +N/-N offset)")]
    InvalidCoordinate(String),

    #[error("failed to parse {what}: {message}")]
    Config { what: &'static str, message: String },

    #[error("diagram failed validation with {0} error(s)")]
    Validation(usize),

    #[error("render failed: {0}")]
    Render(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ErdError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ErdError> = std::result::Result<T, E>;
