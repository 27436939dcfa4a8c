use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Check every sample source under demos/ and print its dispatcher
    Demo {
        /// Build executables instead of printing generated source
        #[arg(long)]
        build: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Demo { build } => run_demos(build)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run").arg("--workspace");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn run_demos(build: bool) -> Result<()> {
    let root = workspace_root()?;
    let demos = demo_sources(&root.join("demos"));
    if demos.is_empty() {
        anyhow::bail!("no .bndl sources found under {}", root.join("demos").display());
    }

    for source in demos {
        println!("== {}", source.display());
        let mut cmd = Command::new("cargo");
        cmd.current_dir(&root)
            .args(["run", "--quiet", "-p", "bundles", "--"])
            .arg(&source)
            .arg("--out-dir")
            .arg(root.join("target/demos"));
        if !build {
            cmd.arg("--emit-source");
        }
        let status = cmd
            .status()
            .with_context(|| format!("failed to run bundles on {}", source.display()))?;
        if !status.success() {
            anyhow::bail!("bundles failed on {}", source.display());
        }
    }
    Ok(())
}

fn workspace_root() -> Result<PathBuf> {
    let metadata = MetadataCommand::new()
        .no_deps()
        .exec()
        .context("failed to read cargo metadata")?;
    Ok(metadata.workspace_root.into_std_path_buf())
}

fn demo_sources(dir: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "bndl"))
        .collect();
    sources.sort();
    sources
}
