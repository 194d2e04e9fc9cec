// Errors raised while loading dashboard artifacts
use crate::domain::dashboard::Notice;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("artifact '{name}' not found at {}", path.display())]
    MissingArtifact { name: String, path: PathBuf },

    #[error("malformed artifact '{artifact}': {reason}")]
    MalformedInput { artifact: String, reason: String },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DashboardError {
    pub fn malformed(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        DashboardError::MalformedInput {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }

    /// Name of the file the error is about.
    pub fn artifact(&self) -> String {
        match self {
            DashboardError::MissingArtifact { name, .. } => name.clone(),
            DashboardError::MalformedInput { artifact, .. } => artifact.clone(),
            DashboardError::Io { path, .. } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    pub fn to_notice(&self) -> Notice {
        let message = match self {
            DashboardError::MissingArtifact { name, .. } => {
                format!("{name} was not found. Generate it from the analysis notebooks and reload.")
            }
            other => other.to_string(),
        };
        Notice {
            artifact: self.artifact(),
            message,
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
