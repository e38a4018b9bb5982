use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fillbib::{process_document, resolve_keys, FetchOptions, ProcessOptions, Sources};
use log::info;
use std::io;
use std::path::PathBuf;

/// Query ADS and INSPIRE for the citations of a LaTeX document and fill its BibTeX file
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    record: RecordArgs,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fill the bibliography of a compiled document from its .aux file
    Process {
        /// The LaTeX document (the .tex extension is optional)
        tex_file: PathBuf,
        /// BibTeX file to fill instead of the one named by \bibliography
        #[arg(short, long)]
        bib: Option<PathBuf>,
        /// Rewrite journal names to canonical abbreviations (off by default)
        #[arg(short = 'j', long, overrides_with = "no_canonicalize_journals")]
        canonicalize_journals: bool,
        /// Leave journal names as fetched
        #[arg(long, overrides_with = "canonicalize_journals")]
        no_canonicalize_journals: bool,
        /// Replace arXiv bibcodes in the document with their published bibcodes (off by default)
        #[arg(short = 'r', long, overrides_with = "no_replace_preprints")]
        replace_preprints: bool,
        /// Keep arXiv bibcodes in the document and the database
        #[arg(long, overrides_with = "replace_preprints")]
        no_replace_preprints: bool,
    },
    /// Print the records of the given keys to stdout
    Resolve {
        /// Citation keys (ADS bibcodes or INSPIRE texkeys)
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// Options shaping the records returned by INSPIRE
#[derive(Args)]
struct RecordArgs {
    /// Build INSPIRE records from their metadata instead of the BibTeX export
    #[arg(short, long, global = true)]
    generate: bool,
    /// Truncate author lists longer than this with "and others"
    #[arg(long, global = true, default_value_t = 10)]
    max_authors: usize,
    /// Authors listed before "and others" (defaults to --max-authors)
    #[arg(long, global = true)]
    shown_authors: Option<usize>,
    /// Use "arXiv:<id>" as the journal of records without one
    #[arg(long, global = true)]
    arxiv_journal: bool,
}

impl RecordArgs {
    fn fetch_options(&self, replace_preprints: bool) -> FetchOptions {
        FetchOptions {
            replace_preprints,
            generate: self.generate,
            max_authors: self.max_authors,
            shown_authors: self.shown_authors,
            arxiv_journal: self.arxiv_journal,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let sources = Sources::from_env().context("Failed to set up the HTTP client")?;

    match cli.command {
        Command::Process {
            tex_file,
            bib,
            canonicalize_journals,
            no_canonicalize_journals,
            replace_preprints,
            no_replace_preprints,
        } => {
            let options = ProcessOptions {
                bib_file: bib,
                canonicalize_journals: canonicalize_journals && !no_canonicalize_journals,
                fetch: cli.record.fetch_options(replace_preprints && !no_replace_preprints),
            };
            let report = process_document(&tex_file, &sources, &options)
                .with_context(|| format!("Failed to fill the bibliography of {:?}", tex_file))?;
            if let Some(bib_file) = &report.bib_file {
                info!("Bibliography written to {:?}", bib_file);
            }
        }
        Command::Resolve { keys } => {
            let options = cli.record.fetch_options(false);
            let stdout = io::stdout();
            let stderr = io::stderr();
            let report = resolve_keys(&keys, &sources, &options, &mut stdout.lock(), &mut stderr.lock())?;
            if report.found.is_empty() {
                anyhow::bail!("None of the {} key(s) could be resolved", keys.len());
            }
        }
    }

    Ok(())
}
