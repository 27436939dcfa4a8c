//! External compiler invocation.

use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::infra::config::Build;

/// Failure to turn generated source into an executable.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("failed to spawn compiler '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("compiler '{program}' exited with status {status}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// An opaque build command: `<program> <args...> -o <output> <source>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    program: String,
    args: Vec<String>,
}

impl Toolchain {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(build: &Build) -> Self {
        Self::new(build.compiler(), build.args())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Assemble the command without running it.
    pub fn command(&self, source: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg("-o").arg(output).arg(source);
        cmd
    }

    /// Run the compiler to completion. Its stderr is kept for the failure report.
    pub fn compile(&self, source: &Path, output: &Path) -> Result<(), ToolchainError> {
        tracing::debug!(
            program = %self.program,
            args = ?self.args,
            source = %source.display(),
            output = %output.display(),
            "invoking compiler"
        );

        let result = self
            .command(source, output)
            .output()
            .map_err(|source| ToolchainError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        if !stderr.trim().is_empty() {
            tracing::debug!(program = %self.program, "compiler stderr:\n{stderr}");
        }

        if result.status.success() {
            Ok(())
        } else {
            Err(ToolchainError::Failed {
                program: self.program.clone(),
                status: result.status,
                stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_places_output_before_source() {
        let toolchain = Toolchain::new("go", vec!["build".into()]);
        let cmd = toolchain.command(Path::new("temp/temp.go"), Path::new("tasks"));
        let args: Vec<_> = cmd
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(cmd.get_program(), "go");
        assert_eq!(args, ["build", "-o", "tasks", "temp/temp.go"]);
    }

    #[test]
    fn reports_missing_program() {
        let toolchain = Toolchain::new("bundles-no-such-compiler", Vec::new());
        let err = toolchain
            .compile(Path::new("src.rs"), Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, ToolchainError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn reports_unsuccessful_exit() {
        let toolchain = Toolchain::new("false", Vec::new());
        let err = toolchain
            .compile(Path::new("src.rs"), Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, ToolchainError::Failed { .. }));
    }
}
