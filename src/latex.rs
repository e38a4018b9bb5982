pub mod aux;
pub mod document;

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

pub use aux::{parse_aux_file, scan_aux_content, AuxData, CONTROL_KEYS};
pub use document::{replace_identifiers, rewrite_document};

// Commonly used regex patterns compiled once
pub(crate) static CITATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\citation\{([^}]*)\}").expect("Invalid citation regex pattern")
});
pub(crate) static BIBDATA_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\bibdata\{([^}]*)\}").expect("Invalid bibdata regex pattern")
});
pub(crate) static AUX_INPUT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\@input\{([^}]*)\}").expect("Invalid aux input regex pattern")
});

/// Strip a trailing `.tex` so `paper` and `paper.tex` name the same document.
pub fn document_basename(tex_file: &Path) -> PathBuf {
    match tex_file.extension() {
        Some(ext) if ext == "tex" => tex_file.with_extension(""),
        _ => tex_file.to_path_buf(),
    }
}

/// The `.aux` file LaTeX writes next to the document.
pub fn aux_path_for(tex_file: &Path) -> PathBuf {
    append_extension(&document_basename(tex_file), "aux")
}

/// The document itself, with the `.tex` extension restored.
pub fn tex_path_for(tex_file: &Path) -> PathBuf {
    append_extension(&document_basename(tex_file), "tex")
}

/// Append an extension without replacing dotted names like `paper.v2`.
pub(crate) fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
