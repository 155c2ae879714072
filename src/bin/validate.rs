//! Corpus Validator CLI
//!
//! Validates every configured sample against its schema and audits the
//! corpus for unresolvable references.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use corpus_schemas::{audit_references, CorpusConfig, RunOutcome, ValidationContext, ValidationRunner};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "corpus-validate")]
#[command(about = "Validate sample documents against the schema corpus")]
struct Cli {
    /// Repository root (overrides corpus.root)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Config file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the validation cases in order, stopping at the first failure
    Run {
        /// Only run cases whose sample or schema path contains this
        #[arg(long)]
        case: Option<String>,
    },

    /// Resolve every $ref in the corpus and report problems
    CheckRefs,

    /// List the configured cases
    Cases,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = CorpusConfig::load_from(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.corpus.root = root;
    }

    match cli.command.unwrap_or(Commands::Run { case: None }) {
        Commands::Run { case } => {
            let cases: Vec<_> = match &case {
                Some(needle) => config.cases.iter().filter(|c| c.matches(needle)).cloned().collect(),
                None => config.cases.clone(),
            };
            if cases.is_empty() {
                return Err("No cases selected".into());
            }

            let context = ValidationContext::from_config(&config)?;
            let runner = ValidationRunner::new(&context);
            let outcome = runner.run(&cases, &mut io::stdout().lock(), &mut io::stderr().lock())?;

            Ok(matches!(outcome, RunOutcome::Passed { .. }))
        }

        Commands::CheckRefs => {
            let context = ValidationContext::from_config(&config)?;
            let report = audit_references(&context)?;

            println!(
                "Checked {} references in {} documents",
                report.references, report.documents
            );
            for finding in &report.findings {
                println!("  ❌ {}", finding);
            }
            if report.is_clean() {
                println!("✅ All references resolve");
            }
            Ok(report.is_clean())
        }

        Commands::Cases => {
            for (i, case) in config.cases.iter().enumerate() {
                println!("{:>3}. {}", i + 1, case);
            }
            Ok(true)
        }
    }
}
