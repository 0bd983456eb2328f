//! `page-patch`: apply editor form fields to a page document.
//!
//! Usage:
//!   page-patch [--config <file.toml>] apply '<fields-json>'
//!   page-patch [--config <file.toml>] normalize
//!
//! The document is read from stdin. The new document is written to stdout.
//! Set `RUST_LOG=page_patch=debug` to see ignored patch entries.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use page_patch::cli::{apply_form_fields, normalize_document, CliError};
use page_patch::{EditorConfig, PageEditor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "page-patch")]
#[command(about = "Apply editor form fields to a page document read from stdin")]
struct Cli {
    /// Editor configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply form fields and print the new document
    Apply {
        /// Fields as a JSON object or an array of [name, value] pairs
        fields: String,
    },
    /// Print the keyed working form of the document
    Normalize,
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("page_patch=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<String, CliError> {
    let config = match cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    let mut doc = String::new();
    io::stdin().read_to_string(&mut doc)?;

    match cli.command {
        Commands::Apply { fields } => {
            let editor = PageEditor::new(&config);
            apply_form_fields(doc.trim(), &fields, &editor)
        }
        Commands::Normalize => normalize_document(doc.trim(), &config.registry()),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };
    init_logging();

    match run(cli) {
        Ok(result) => {
            let mut stdout = io::stdout();
            if let Err(e) = writeln!(stdout, "{result}") {
                eprintln!("{e}");
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}
