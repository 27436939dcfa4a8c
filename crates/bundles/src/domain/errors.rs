//! Domain-specific errors.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::infra::toolchain::ToolchainError;

/// Class of a located source diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Syntax,
    Value,
    IllegalChar,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "SyntaxError",
            DiagnosticKind::Value => "ValueError",
            DiagnosticKind::IllegalChar => "IllegalChar",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexing or validation failure tied to a source line.
///
/// `label` carries the bundle that was open when the error was found, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: usize,
    pub label: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        line: usize,
        label: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            line,
            label: label.map(str::to_owned),
            message: message.into(),
        }
    }

    pub fn syntax(line: usize, label: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Syntax, line, label, message)
    }

    pub fn value(line: usize, label: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Value, line, label, message)
    }

    pub fn illegal_char(line: usize, label: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::IllegalChar, line, label, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind)?;
        if let Some(label) = &self.label {
            write!(f, "in {label}, ")?;
        }
        write!(f, "on line {}\n\t{}", self.line, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Every way a compilation run can fail. The first error aborts the run.
#[derive(Debug, Error)]
pub enum BundlesError {
    #[error(transparent)]
    Diagnostic(#[from] Diagnostic),

    #[error("IOError: Unable to open {}.", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IOError: Unable to read {}.", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IOError: Unable to create scratch directory {}.", .path.display())]
    ScratchDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IOError: Unable to create {}.", .path.display())]
    CreateSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IOError: Unable to write to {}.", .path.display())]
    WriteSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IOError: Unable to remove scratch directory {}.", .path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("BuildError: Unable to compile {}.", .path.display())]
    Build {
        path: PathBuf,
        #[source]
        source: ToolchainError,
    },

    #[error("TemplateError: {message}")]
    Template { message: String },
}

impl BundlesError {
    /// Returns the located diagnostic when the failure came from lexing.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            BundlesError::Diagnostic(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }
}
