//! Errors surfaced to the viewer's user interface.

use thiserror::Error;

use crate::data_structures::scene_graph::NodeId;

/// Why a load attempt ended without replacing the scene.
///
/// All variants are terminal for the attempt only. The previously displayed
/// scene stays intact and the loader is ready for the next selection.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file event carried no file.
    #[error("no file selected")]
    NoFileSelected,
    /// The file's extension or declared media type is not accepted.
    #[error(
        "unsupported file type {} for {name}",
        .media_type.as_deref().unwrap_or("(undeclared)")
    )]
    UnsupportedFileType {
        name: String,
        media_type: Option<String>,
    },
    /// A previous selection is still being parsed.
    #[error("a load is already in progress")]
    LoadInProgress,
    /// The parser, the file handle or the GPU upload failed.
    #[error("failed to load {name}: {source:#}")]
    ParseFailure { name: String, source: anyhow::Error },
    /// The attempt finished after it was cancelled or superseded. Its result
    /// is discarded.
    #[error("load of {name} was cancelled")]
    Cancelled { name: String },
}

impl LoadError {
    /// Short text suitable for an alert or status line.
    pub fn notice(&self) -> String {
        match self {
            Self::NoFileSelected => "No file selected".to_string(),
            Self::UnsupportedFileType { name, .. } => {
                format!("{name} is not a supported 3D file")
            }
            Self::LoadInProgress => "Another file is still loading".to_string(),
            Self::ParseFailure { name, .. } => format!("Could not load {name}"),
            Self::Cancelled { name } => format!("Loading {name} was cancelled"),
        }
    }
}

/// A GPU resource that could not be released while its node was removed.
/// The node is detached regardless.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to dispose {name} of node {node}: {reason}")]
pub struct DisposalWarning {
    pub node: NodeId,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(String),
    /// A value is outside its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}
