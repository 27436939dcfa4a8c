use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bundles::app::codegen::DispatchProgram;
use bundles::infra::config::Config;
use bundles::{CompileOutcome, Compiler};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

/// Compile a Bundles source file into a launcher executable.
///
/// Run the produced executable with a bundle label to launch that bundle's items.
#[derive(Parser, Debug)]
#[command(name = "bundles", author, version, about, long_about)]
struct Cli {
    /// Source file to compile
    #[arg(value_name = "SOURCE")]
    source: Option<PathBuf>,

    /// Directory the executable is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Lex and validate only
    #[arg(long, conflicts_with_all = ["emit_source", "emit_ir"])]
    check: bool,

    /// Print the generated dispatcher source instead of building
    #[arg(long, conflicts_with = "emit_ir")]
    emit_source: bool,

    /// Print the bundle intermediate representation as JSON
    #[arg(long)]
    emit_ir: bool,

    /// Built-in template name or path to a template file
    #[arg(long, value_name = "NAME|PATH")]
    template: Option<String>,

    /// Remove the scratch directory after a successful build
    #[arg(long)]
    clean: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage problems are not compilation failures.
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
    };
    bundles::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "compilation failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "bundles", &mut io::stdout());
        return Ok(());
    }

    let Some(source) = cli.source else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let mut config = Config::load()?;
    if let Some(template) = cli.template {
        config.codegen.set_template(template);
    }
    let compiler = Compiler::from_config(&config)?;

    if cli.check {
        let bundles = compiler.check(&source)?;
        let items: usize = bundles.iter().map(|bundle| bundle.items.len()).sum();
        println!(
            "{}: {} bundle(s), {} item(s)",
            source.display(),
            bundles.len(),
            items
        );
        return Ok(());
    }

    if cli.emit_ir {
        let program: DispatchProgram = compiler.lower(&source)?;
        let json = serde_json::to_string_pretty(&program)
            .context("failed to serialize intermediate representation")?;
        println!("{json}");
        return Ok(());
    }

    if cli.emit_source {
        if let Some(code) = compiler.generate(&source)? {
            print!("{code}");
        }
        return Ok(());
    }

    match compiler.compile(&source, &cli.out_dir)? {
        CompileOutcome::Skipped => {
            tracing::info!("nothing to build");
        }
        CompileOutcome::Built(artifact) => {
            if cli.clean {
                compiler.orchestrator().clean()?;
            }
            println!("Built {}", artifact.executable.display());
        }
    }
    Ok(())
}
