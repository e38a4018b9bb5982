use log::{debug, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FillbibError;
use crate::latex::{append_extension, AUX_INPUT_REGEX, BIBDATA_REGEX, CITATION_REGEX};

/// Entries injected by revtex (and `\nocite{*}`) that are not real citations.
pub const CONTROL_KEYS: &[&str] = &[
    "REVTEX41Control",
    "apsrev41Control",
    "REVTEX42Control",
    "apsrev42Control",
    "*",
];

/// Citation data collected from a compiled document's `.aux` file(s).
#[derive(Debug, Clone, Default)]
pub struct AuxData {
    /// Path of the top-level aux file
    pub aux_file: PathBuf,
    /// Unique citation keys, control entries removed
    pub citations: BTreeSet<String>,
    /// Database names from `\bibdata`, in declaration order
    pub bibdata: Vec<String>,
}

impl AuxData {
    /// Resolve the `.bib` file the document declares.
    ///
    /// revtex adds a `<basename>Notes` database for footnotes; it is never the target.
    /// Relative names resolve against the aux file's directory.
    pub fn bibliography_file(&self) -> Result<PathBuf, FillbibError> {
        let notes = self
            .aux_file
            .file_stem()
            .map(|stem| format!("{}Notes", stem.to_string_lossy()))
            .unwrap_or_default();

        let name = self
            .bibdata
            .iter()
            .find(|name| **name != notes)
            .ok_or_else(|| FillbibError::NoBibliographyDeclared(self.aux_file.clone()))?;

        let name = name.strip_suffix(".bib").unwrap_or(name);
        let dir = self.aux_file.parent().unwrap_or_else(|| Path::new(""));
        Ok(append_extension(&dir.join(name), "bib"))
    }
}

/// Parse an aux file, following `\@input` lines written for `\include`d files.
pub fn parse_aux_file(aux_file: &Path) -> Result<AuxData, FillbibError> {
    let mut data = AuxData {
        aux_file: aux_file.to_path_buf(),
        ..Default::default()
    };
    let content = fs::read_to_string(aux_file).map_err(|e| FillbibError::io(aux_file, e))?;
    let mut visited = vec![aux_file.to_path_buf()];
    scan_aux(aux_file, &content, &mut data, &mut visited);

    for control in CONTROL_KEYS {
        data.citations.remove(*control);
    }
    Ok(data)
}

/// Collect citations and bibdata from one aux file's content into `data`.
pub fn scan_aux_content(content: &str, data: &mut AuxData) {
    for cap in CITATION_REGEX.captures_iter(content) {
        let keys = cap.get(1).map_or("", |m| m.as_str());
        data.citations.extend(
            keys.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from),
        );
    }

    for cap in BIBDATA_REGEX.captures_iter(content) {
        let names = cap.get(1).map_or("", |m| m.as_str());
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if !data.bibdata.iter().any(|n| n == name) {
                data.bibdata.push(name.to_string());
            }
        }
    }
}

fn scan_aux(aux_file: &Path, content: &str, data: &mut AuxData, visited: &mut Vec<PathBuf>) {
    scan_aux_content(content, data);

    let base_dir = aux_file.parent().unwrap_or_else(|| Path::new(""));
    for cap in AUX_INPUT_REGEX.captures_iter(content) {
        let child = base_dir.join(cap.get(1).map_or("", |m| m.as_str()));
        if visited.contains(&child) {
            continue;
        }
        visited.push(child.clone());

        match fs::read_to_string(&child) {
            Ok(child_content) => {
                debug!("Scanning included aux file {:?}", child);
                scan_aux(&child, &child_content, data, visited);
            }
            Err(e) => warn!("Skipping unreadable aux file {:?}: {}", child, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_splits_and_trims_keys() {
        let mut data = AuxData::default();
        scan_aux_content(
            "\\citation{2016PhRvL.116f1102A, Abbott:2016blz}\n\\citation{Abbott:2016blz}\n",
            &mut data,
        );
        assert_eq!(data.citations.len(), 2);
        assert!(data.citations.contains("2016PhRvL.116f1102A"));
        assert!(data.citations.contains("Abbott:2016blz"));
    }

    #[test]
    fn test_bibliography_file_skips_revtex_notes() {
        let data = AuxData {
            aux_file: PathBuf::from("dir/paper.aux"),
            citations: BTreeSet::new(),
            bibdata: vec!["paperNotes".to_string(), "refs".to_string()],
        };
        assert_eq!(data.bibliography_file().unwrap(), PathBuf::from("dir/refs.bib"));
    }

    #[test]
    fn test_bibliography_file_missing_is_an_error() {
        let data = AuxData {
            aux_file: PathBuf::from("paper.aux"),
            ..Default::default()
        };
        assert!(matches!(
            data.bibliography_file(),
            Err(FillbibError::NoBibliographyDeclared(_))
        ));
    }

    #[test]
    fn test_only_notes_database_is_an_error() {
        let data = AuxData {
            aux_file: PathBuf::from("paper.aux"),
            citations: BTreeSet::new(),
            bibdata: vec!["paperNotes".to_string()],
        };
        assert!(data.bibliography_file().is_err());
    }
}
