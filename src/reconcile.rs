use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::bibliography::{canonicalize_file, BibDatabase, JOURNAL_ABBREVIATIONS};
use crate::error::FillbibError;
use crate::latex::{append_extension, aux_path_for, parse_aux_file, rewrite_document, tex_path_for};
use crate::sources::{FetchOptions, Lookup, Sources};

/// Options for filling the bibliography of one document.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Use this database instead of the one declared in the aux file
    pub bib_file: Option<PathBuf>,
    /// Run the journal-name pass over the database afterwards
    pub canonicalize_journals: bool,
    pub fetch: FetchOptions,
}

/// What happened to each key during a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub bib_file: Option<PathBuf>,
    /// Keys already present in the database
    pub existing: Vec<String>,
    pub found: Vec<String>,
    pub not_found: Vec<String>,
    /// Keys whose lookup or write failed
    pub failed: Vec<String>,
    /// (preprint key, published key) pairs
    pub replacements: Vec<(String, String)>,
    /// Occurrences rewritten in the document
    pub document_replacements: usize,
    pub journals_canonicalized: bool,
}

/// `refs` and `refs.bib` both name `refs.bib`.
pub fn bib_path(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == "bib" => path.to_path_buf(),
        _ => append_extension(path, "bib"),
    }
}

/// Fill the bibliography of a compiled document from its aux file.
///
/// `tex_file` may be given with or without the `.tex` extension.
pub fn process_document(tex_file: &Path, sources: &Sources, options: &ProcessOptions) -> Result<Report, FillbibError> {
    let aux_file = aux_path_for(tex_file);
    let aux = parse_aux_file(&aux_file)?;
    let bib_file = match &options.bib_file {
        Some(path) => bib_path(path),
        None => aux.bibliography_file()?,
    };

    info!("Seek: {:?}", aux.citations);
    let mut report = {
        let mut database = BibDatabase::open(&bib_file)?;
        info!("Have: {:?}", database.keys());
        fill_database(&mut database, aux.citations.iter(), sources, &options.fetch)
    };
    report.bib_file = Some(bib_file.clone());

    if options.fetch.replace_preprints && !report.replacements.is_empty() {
        report.document_replacements = rewrite_document(&tex_path_for(tex_file), &report.replacements)?;
    }
    if options.canonicalize_journals {
        report.journals_canonicalized = canonicalize_file(&bib_file, JOURNAL_ABBREVIATIONS)?;
    }

    info!(
        "{} found, {} not found, {} failed, {} already present",
        report.found.len(),
        report.not_found.len(),
        report.failed.len(),
        report.existing.len()
    );
    Ok(report)
}

/// Fetch and append every key the database does not already hold.
///
/// Failures are logged per key and never stop the run.
pub fn fill_database<'a>(
    database: &mut BibDatabase,
    keys: impl IntoIterator<Item = &'a String>,
    sources: &Sources,
    options: &FetchOptions,
) -> Report {
    let mut report = Report::default();

    for key in keys {
        if database.contains(key) {
            report.existing.push(key.clone());
            continue;
        }

        let source = sources.for_key(key);
        match source.fetch(key, options) {
            Ok(Lookup::Found(record)) => match database.append(&record.key, &record.text) {
                Ok(_) => {
                    info!("{} found: {}", source.name(), key);
                    report.found.push(key.clone());
                    if let Some(preprint) = record.replaces {
                        report.replacements.push((preprint, record.key));
                    }
                }
                Err(e) => {
                    warn!("Could not write {} to {:?}: {}", key, database.path(), e);
                    report.failed.push(key.clone());
                }
            },
            Ok(Lookup::NotFound(reason)) => {
                warn!("{} not found: {} ({})", source.name(), key, reason);
                report.not_found.push(key.clone());
            }
            Err(e) => {
                warn!("{} lookup failed for {}: {}", source.name(), key, e);
                report.failed.push(key.clone());
            }
        }
    }

    report
}

/// Look up keys without touching any database: records go to `out`, notices to `err`.
pub fn resolve_keys(
    keys: &[String],
    sources: &Sources,
    options: &FetchOptions,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<Report, FillbibError> {
    let mut report = Report::default();

    for key in keys {
        let source = sources.for_key(key);
        match source.fetch(key, options) {
            Ok(Lookup::Found(record)) => {
                writeln!(out, "{}", record.text.trim_end()).map_err(|e| FillbibError::io("<stdout>", e))?;
                report.found.push(key.clone());
                if let Some(preprint) = record.replaces {
                    report.replacements.push((preprint, record.key));
                }
            }
            Ok(Lookup::NotFound(reason)) => {
                writeln!(err, "{} not found: {} ({})", source.name(), key, reason)
                    .map_err(|e| FillbibError::io("<stderr>", e))?;
                report.not_found.push(key.clone());
            }
            Err(e) => {
                writeln!(err, "{} lookup failed for {}: {}", source.name(), key, e)
                    .map_err(|e| FillbibError::io("<stderr>", e))?;
                report.failed.push(key.clone());
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bib_path_adds_extension_once() {
        assert_eq!(bib_path(Path::new("refs")), PathBuf::from("refs.bib"));
        assert_eq!(bib_path(Path::new("dir/refs.bib")), PathBuf::from("dir/refs.bib"));
    }
}
