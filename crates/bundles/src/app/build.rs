//! Persisting generated source and driving the external compiler.

use std::env::consts::EXE_SUFFIX;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::errors::BundlesError;
use crate::infra::config::Build;
use crate::infra::toolchain::Toolchain;

const FALLBACK_NAME: &str = "bundles";

/// Paths produced by a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub source_path: PathBuf,
    pub executable: PathBuf,
}

/// Writes dispatcher source into a scratch directory and compiles it.
#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
    toolchain: Toolchain,
    scratch_dir: PathBuf,
    source_file: String,
}

impl BuildOrchestrator {
    pub fn new(toolchain: Toolchain, scratch_dir: impl Into<PathBuf>, source_file: &str) -> Self {
        Self {
            toolchain,
            scratch_dir: scratch_dir.into(),
            source_file: source_file.to_owned(),
        }
    }

    pub fn from_config(build: &Build) -> Self {
        Self::new(
            Toolchain::from_config(build),
            build.scratch_dir(),
            &build.source_file(),
        )
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn source_path(&self) -> PathBuf {
        self.scratch_dir.join(&self.source_file)
    }

    /// Write `code` to the scratch source file, replacing any previous run's output.
    pub fn persist(&self, code: &str) -> Result<PathBuf, BundlesError> {
        if !self.scratch_dir.exists() {
            fs::create_dir_all(&self.scratch_dir).map_err(|source| BundlesError::ScratchDir {
                path: self.scratch_dir.clone(),
                source,
            })?;
        }

        let path = self.source_path();
        let mut file = File::create(&path).map_err(|source| BundlesError::CreateSource {
            path: path.clone(),
            source,
        })?;
        file.write_all(code.as_bytes())
            .map_err(|source| BundlesError::WriteSource {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), bytes = code.len(), "persisted dispatcher source");
        Ok(path)
    }

    /// Persist `code` and compile it into `out_dir`, naming the binary after `input`.
    pub fn build(
        &self,
        code: &str,
        input: &Path,
        out_dir: &Path,
    ) -> Result<BuildArtifact, BundlesError> {
        let source_path = self.persist(code)?;
        let executable = out_dir.join(executable_name(input));

        self.toolchain
            .compile(&source_path, &executable)
            .map_err(|source| BundlesError::Build {
                path: source_path.clone(),
                source,
            })?;

        tracing::info!(
            executable = %executable.display(),
            compiler = self.toolchain.program(),
            "built executable"
        );
        Ok(BuildArtifact {
            source_path,
            executable,
        })
    }

    /// Remove the scratch directory and everything in it.
    pub fn clean(&self) -> Result<(), BundlesError> {
        if !self.scratch_dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&self.scratch_dir).map_err(|source| BundlesError::Clean {
            path: self.scratch_dir.clone(),
            source,
        })?;
        tracing::debug!(path = %self.scratch_dir.display(), "removed scratch directory");
        Ok(())
    }
}

/// First word of the input's file stem plus the platform executable suffix.
pub fn executable_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = stem.split_whitespace().next().unwrap_or(FALLBACK_NAME);
    format!("{name}{EXE_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::infra::toolchain::ToolchainError;

    #[test]
    fn names_executable_after_first_word_of_stem() {
        assert_eq!(
            executable_name(Path::new("dir/morning.bndl")),
            format!("morning{EXE_SUFFIX}")
        );
        assert_eq!(
            executable_name(Path::new("my tasks.txt")),
            format!("my{EXE_SUFFIX}")
        );
        assert_eq!(
            executable_name(Path::new("plain")),
            format!("plain{EXE_SUFFIX}")
        );
        assert_eq!(
            executable_name(Path::new("/")),
            format!("bundles{EXE_SUFFIX}")
        );
    }

    #[test]
    fn persist_creates_scratch_dir_and_overwrites() -> Result<(), BundlesError> {
        let temp = tempfile::tempdir().unwrap();
        let scratch = temp.path().join("nested/temp");
        let orchestrator =
            BuildOrchestrator::new(Toolchain::new("rustc", Vec::new()), &scratch, "dispatch.rs");

        orchestrator.persist("first run, longer text")?;
        let path = orchestrator.persist("second")?;

        assert_eq!(path, scratch.join("dispatch.rs"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        Ok(())
    }

    #[test]
    fn spawn_failure_is_a_build_error_and_keeps_scratch() {
        let temp = tempfile::tempdir().unwrap();
        let orchestrator = BuildOrchestrator::new(
            Toolchain::new("bundles-no-such-compiler", Vec::new()),
            temp.path().join("temp"),
            "dispatch.rs",
        );

        let err = orchestrator
            .build("fn main() {}", Path::new("tasks.bndl"), temp.path())
            .unwrap_err();
        match err {
            BundlesError::Build { path, source } => {
                assert!(path.ends_with("dispatch.rs"));
                assert!(matches!(source, ToolchainError::Spawn { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(temp.path().join("temp/dispatch.rs").exists());
    }

    #[cfg(unix)]
    #[test]
    fn successful_build_reports_artifact_paths() -> Result<(), BundlesError> {
        let temp = tempfile::tempdir().unwrap();
        let orchestrator = BuildOrchestrator::new(
            Toolchain::new("true", Vec::new()),
            temp.path().join("temp"),
            "dispatch.rs",
        );

        let artifact = orchestrator.build("fn main() {}", Path::new("work day.bndl"), temp.path())?;
        assert_eq!(artifact.source_path, temp.path().join("temp/dispatch.rs"));
        assert_eq!(artifact.executable, temp.path().join("work"));

        orchestrator.clean()?;
        assert!(!temp.path().join("temp").exists());
        Ok(())
    }

    #[test]
    fn scratch_dir_blocked_by_file_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let orchestrator = BuildOrchestrator::new(
            Toolchain::new("rustc", Vec::new()),
            blocker.join("temp"),
            "dispatch.rs",
        );

        let err = orchestrator.persist("fn main() {}").unwrap_err();
        assert!(matches!(err, BundlesError::ScratchDir { .. }));
    }
}
