//! Loading source documents from disk.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::domain::errors::BundlesError;

/// Raw source text split into lines, read once and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub lines: Vec<String>,
}

impl SourceDocument {
    /// Split on line feeds only. Carriage returns stay attached to their line.
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            path: path.into(),
            lines: text.split('\n').map(str::to_owned).collect(),
        }
    }

    /// Read the file at `path`, failing with an open or read error.
    pub fn read(path: &Path) -> Result<Self, BundlesError> {
        let mut file = File::open(path).map_err(|source| BundlesError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(|source| BundlesError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let document = Self::from_text(path, &text);
        tracing::debug!(
            path = %path.display(),
            lines = document.lines.len(),
            "read source"
        );
        Ok(document)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
