use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid JSON in {}: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("module '{0}' already exists in manifest")]
    ModuleExists(String),

    #[error("failed to parse {}: {message}", path.display())]
    MalformedXml { path: PathBuf, message: String },

    #[error("no solution file found under {}", .0.display())]
    NoSolution(PathBuf),

    #[error("usage: {0}")]
    Usage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SkillError {
    /// Stable identifier reported alongside the message in JSON error output.
    pub fn kind(&self) -> &'static str {
        match self {
            SkillError::NotFound(_) => "not_found",
            SkillError::InvalidJson { .. } => "invalid_json",
            SkillError::InvalidManifest(_) => "invalid_manifest",
            SkillError::ModuleExists(_) => "duplicate_module",
            SkillError::MalformedXml { .. } => "malformed_xml",
            SkillError::NoSolution(_) => "no_solution",
            SkillError::Usage(_) => "usage",
            SkillError::Io(_) => "io",
            SkillError::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, SkillError>;
