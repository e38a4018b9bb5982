use log::{debug, info};
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::bibliography::BIBTEX_ENTRY_REGEX;
use crate::error::FillbibError;

/// Entry types that never carry a citation key.
const NON_RECORD_TYPES: &[&str] = &["comment", "string", "preamble"];

/// Keys of the records already present in `content`.
pub fn scan_keys(content: &str) -> BTreeSet<String> {
    BIBTEX_ENTRY_REGEX
        .captures_iter(content)
        .filter(|caps| {
            let entry_type = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
            !NON_RECORD_TYPES.contains(&entry_type.as_str())
        })
        .filter_map(|caps| caps.get(2).map(|m| m.as_str().to_string()))
        .collect()
}

/// Keys already present in a `.bib` file. A missing file has no keys.
pub fn existing_keys(bib_file: &Path) -> Result<BTreeSet<String>, FillbibError> {
    match fs::read_to_string(bib_file) {
        Ok(content) => Ok(scan_keys(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeSet::new()),
        Err(e) => Err(FillbibError::io(bib_file, e)),
    }
}

/// BibTeX compares keys without regard to case.
fn fold_key(key: &str) -> String {
    key.to_lowercase()
}

/// Append-only handle on a bibliography database for the length of one run.
#[derive(Debug)]
pub struct BibDatabase {
    path: PathBuf,
    file: File,
    keys: BTreeSet<String>,
    folded: BTreeSet<String>,
}

impl BibDatabase {
    /// Scan the existing keys and open the file for appending, creating it if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FillbibError> {
        let path = path.into();
        let keys = existing_keys(&path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| FillbibError::io(&path, e))?;
        debug!("Opened {:?} with {} existing record(s)", path, keys.len());
        let folded = keys.iter().map(|key| fold_key(key)).collect();
        Ok(Self {
            path,
            file,
            keys,
            folded,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Case-insensitive, so `Abbott:2016BLZ` matches a stored `Abbott:2016blz`.
    pub fn contains(&self, key: &str) -> bool {
        self.folded.contains(&fold_key(key))
    }

    pub fn keys(&self) -> &BTreeSet<String> {
        &self.keys
    }

    /// Append a record verbatim. Returns `false` without writing if the key is already present.
    pub fn append(&mut self, key: &str, record: &str) -> Result<bool, FillbibError> {
        if self.contains(key) {
            info!("Skipping {}: already in {:?}", key, self.path);
            return Ok(false);
        }
        let mut text = String::with_capacity(record.len() + 2);
        text.push('\n');
        text.push_str(record.trim_end());
        text.push('\n');
        self.file
            .write_all(text.as_bytes())
            .map_err(|e| FillbibError::io(&self.path, e))?;
        self.keys.insert(key.to_string());
        self.folded.insert(fold_key(key));
        Ok(true)
    }
}
