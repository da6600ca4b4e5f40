use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The marmot installation is incomplete: {} not found", .path.display())]
    VendorMissing { path: PathBuf },

    #[error("Refusing to extract '{entry}': it would escape {}", .destination.display())]
    UnsafeArchiveEntry { entry: String, destination: PathBuf },

    #[error("The extracted project has no {}", .path.display())]
    WebXmlMissing { path: PathBuf },

    #[error("Invalid answer for '{key}': {reason}")]
    InvalidAnswer { key: String, reason: String },

    #[error("Failed to write {}: {source}", .path.display())]
    RcWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScaffoldError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScaffoldError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ScaffoldResult<T> = Result<T, ScaffoldError>;
