//! End-to-end compilation: read, lex, generate, build.

use std::path::Path;

use crate::app::build::{BuildArtifact, BuildOrchestrator};
use crate::app::codegen::{DispatchProgram, Generator};
use crate::app::lexer::Lexer;
use crate::app::source::SourceDocument;
use crate::app::validate::ValueRules;
use crate::domain::errors::BundlesError;
use crate::domain::model::Bundle;
use crate::infra::config::Config;

/// What a compile run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The source held no bundles; nothing was generated or built.
    Skipped,
    Built(BuildArtifact),
}

/// Wires the pipeline stages together from configuration.
#[derive(Debug)]
pub struct Compiler {
    lexer: Lexer,
    generator: Generator,
    orchestrator: BuildOrchestrator,
    template: String,
}

impl Compiler {
    pub fn new(
        lexer: Lexer,
        generator: Generator,
        orchestrator: BuildOrchestrator,
        template: impl Into<String>,
    ) -> Self {
        Self {
            lexer,
            generator,
            orchestrator,
            template: template.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, BundlesError> {
        Ok(Self::new(
            Lexer::new(ValueRules::from_config(&config.validation)),
            Generator::new()?,
            BuildOrchestrator::from_config(&config.build),
            config.codegen.template(),
        ))
    }

    pub fn orchestrator(&self) -> &BuildOrchestrator {
        &self.orchestrator
    }

    /// Read and validate `path` without generating anything.
    pub fn check(&self, path: &Path) -> Result<Vec<Bundle>, BundlesError> {
        let document = SourceDocument::read(path)?;
        Ok(self.lexer.tokenize(&document.lines)?)
    }

    /// Lower a validated source into its intermediate representation.
    pub fn lower(&self, path: &Path) -> Result<DispatchProgram, BundlesError> {
        let bundles = self.check(path)?;
        Ok(DispatchProgram::lower(source_name(path), bundles))
    }

    /// Render the dispatcher source, or `None` when the source has no bundles.
    pub fn generate(&self, path: &Path) -> Result<Option<String>, BundlesError> {
        let program = self.lower(path)?;
        if program.is_empty() {
            return Ok(None);
        }
        self.generator.render(&program, &self.template).map(Some)
    }

    /// Run the whole pipeline, placing the executable in `out_dir`.
    pub fn compile(&self, path: &Path, out_dir: &Path) -> Result<CompileOutcome, BundlesError> {
        let Some(code) = self.generate(path)? else {
            tracing::info!(path = %path.display(), "no bundles found; skipping build");
            return Ok(CompileOutcome::Skipped);
        };
        let artifact = self.orchestrator.build(&code, path, out_dir)?;
        Ok(CompileOutcome::Built(artifact))
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use crate::app::codegen::DEFAULT_TEMPLATE;
    use crate::infra::toolchain::Toolchain;

    fn compiler(scratch: &Path, program: &str) -> Compiler {
        Compiler::new(
            Lexer::default(),
            Generator::new().unwrap(),
            BuildOrchestrator::new(Toolchain::new(program, Vec::new()), scratch, "dispatch.rs"),
            DEFAULT_TEMPLATE,
        )
    }

    #[test]
    fn comment_only_source_skips_build() -> Result<(), BundlesError> {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("empty.bndl");
        fs::write(&source, "# nothing to do\n\n").unwrap();

        let compiler = compiler(&temp.path().join("temp"), "bundles-no-such-compiler");
        let outcome = compiler.compile(&source, temp.path())?;

        assert_eq!(outcome, CompileOutcome::Skipped);
        assert!(!temp.path().join("temp").exists());
        Ok(())
    }

    #[test]
    fn generation_is_byte_identical_across_runs() -> Result<(), BundlesError> {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("tasks.bndl");
        fs::write(&source, "build:\nshell, echo x\n").unwrap();

        let compiler = compiler(&temp.path().join("temp"), "rustc");
        let first = compiler.generate(&source)?.unwrap();
        let second = compiler.generate(&source)?.unwrap();
        assert_eq!(first, second);
        assert!(first.contains("launch(\"shell\", \"echo x\");"));
        Ok(())
    }

    #[test]
    fn lexer_errors_stop_before_generation() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("broken.bndl");
        fs::write(&source, "shell, ls\n").unwrap();

        let compiler = compiler(&temp.path().join("temp"), "rustc");
        let err = compiler.compile(&source, temp.path()).unwrap_err();
        assert_eq!(
            err.diagnostic().map(ToString::to_string).as_deref(),
            Some("SyntaxError: on line 1\n\tUnlabelled bundle.")
        );
        assert!(!temp.path().join("temp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn compile_runs_toolchain_on_persisted_source() -> Result<(), BundlesError> {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("daily.bndl");
        fs::write(&source, "start:\nshell, echo morning\n").unwrap();

        let compiler = compiler(&temp.path().join("temp"), "true");
        let outcome = compiler.compile(&source, temp.path())?;

        let CompileOutcome::Built(artifact) = outcome else {
            panic!("expected a build");
        };
        assert_eq!(artifact.executable, temp.path().join("daily"));
        let written = fs::read_to_string(artifact.source_path).unwrap();
        assert!(written.contains("\"start\" => {"));
        Ok(())
    }

    #[test]
    fn lower_keeps_source_file_name() -> Result<(), BundlesError> {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("ir.bndl");
        fs::write(&source, "a:\nshell, ls\n").unwrap();

        let program = compiler(temp.path(), "rustc").lower(&source)?;
        assert_eq!(program.source, "ir.bndl");
        assert_eq!(program.cases.len(), 1);
        assert_eq!(program.cases[0].calls[0].value, "ls");
        Ok(())
    }
}
