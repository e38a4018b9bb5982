pub mod database;
pub mod journals;

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Range;

pub use database::{existing_keys, BibDatabase};
pub use journals::{canonicalize, canonicalize_file, JOURNAL_ABBREVIATIONS};

pub(crate) static BIBTEX_ENTRY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([a-zA-Z]+)\s*\{\s*([^,\s]+)\s*,").expect("Invalid BibTeX entry regex pattern")
});

/// A BibTeX record. Fields keep insertion order so rendered output is reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    pub key: String,
    pub entry_type: String,
    pub fields: Vec<(String, String)>,
}

/// Builder for BibEntry to allow for cleaner creation
pub struct BibEntryBuilder {
    entry: BibEntry,
}

impl BibEntryBuilder {
    /// Create a new BibEntryBuilder with the required key and entry type
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            entry: BibEntry::new(key, entry_type),
        }
    }

    /// Add a field to the BibEntry
    pub fn field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.entry.set(field, value);
        self
    }

    /// Add a field only when a value is present
    pub fn field_opt(self, field: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.field(field, value),
            None => self,
        }
    }

    /// Build the BibEntry
    pub fn build(self) -> BibEntry {
        self.entry
    }
}

impl BibEntry {
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: Vec::new(),
        }
    }

    /// Create a new BibEntry using the builder pattern
    pub fn builder(key: impl Into<String>, entry_type: impl Into<String>) -> BibEntryBuilder {
        BibEntryBuilder::new(key, entry_type)
    }

    /// Set a field, replacing an existing value in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for BibEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}{{{}", self.entry_type, self.key)?;
        for (name, value) in &self.fields {
            if value.contains('"') {
                write!(f, ",\n    {} = {{{}}}", name, value)?;
            } else {
                write!(f, ",\n    {} = \"{}\"", name, value)?;
            }
        }
        writeln!(f, "\n}}")
    }
}

/// Entry type and key from the first record header in `text`.
pub fn record_header(text: &str) -> Option<(&str, &str)> {
    let caps = BIBTEX_ENTRY_REGEX.captures(text)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Swap the key of the first record header in `text`.
pub fn replace_record_key(text: &str, new_key: &str) -> Option<String> {
    let caps = BIBTEX_ENTRY_REGEX.captures(text)?;
    let key = caps.get(2)?;
    let mut output = String::with_capacity(text.len() + new_key.len());
    output.push_str(&text[..key.start()]);
    output.push_str(new_key);
    output.push_str(&text[key.end()..]);
    Some(output)
}

/// Byte ranges of the `@type{...}` blocks in a `.bib` file, found by brace matching.
///
/// Unterminated blocks run to the end of the text.
pub fn record_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('@') {
        let start = pos + offset;
        let Some(open) = text[start..].find('{').map(|i| start + i) else {
            break;
        };
        // `@type` must be followed directly by the opening brace
        if !text[start + 1..open].trim().chars().all(|c| c.is_ascii_alphabetic()) {
            pos = start + 1;
            continue;
        }

        let mut depth = 0usize;
        let mut end = text.len();
        for (i, &b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        spans.push(start..end);
        pos = end;
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_field_order() {
        let entry = BibEntry::builder("Abbott:2016blz", "article")
            .field("author", "Abbott, B. P. and others")
            .field("title", "{Observation}")
            .field_opt("doi", None::<String>)
            .field("year", "2016")
            .build();
        let names: Vec<&str> = entry.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["author", "title", "year"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut entry = BibEntry::new("k", "article");
        entry.set("journal", "A");
        entry.set("year", "2020");
        entry.set("journal", "B");
        assert_eq!(entry.get("journal"), Some("B"));
        assert_eq!(entry.fields[0].0, "journal");
    }

    #[test]
    fn test_display_renders_bibtex() {
        let entry = BibEntry::builder("Key:2020ab", "article")
            .field("title", "{A title}")
            .field("note", "say \"hi\"")
            .build();
        assert_eq!(
            entry.to_string(),
            "@article{Key:2020ab,\n    title = \"{A title}\",\n    note = {say \"hi\"}\n}\n"
        );
    }

    #[test]
    fn test_record_header_and_key_replacement() {
        let text = "@ARTICLE{2016PhRvL.116f1102A,\n  author = {{Abbott}, B.~P.},\n}";
        assert_eq!(record_header(text), Some(("ARTICLE", "2016PhRvL.116f1102A")));
        let swapped = replace_record_key(text, "2016arXiv160203837T").unwrap();
        assert!(swapped.starts_with("@ARTICLE{2016arXiv160203837T,"));
        assert!(swapped.contains("{{Abbott}, B.~P.}"));
    }

    #[test]
    fn test_record_spans_match_braces() {
        let text = "% comment\n@article{a,\n title = {{Nested} title}\n}\n\n@book{b, year = {2001}}\n";
        let spans = record_spans(text);
        assert_eq!(spans.len(), 2);
        assert!(text[spans[0].clone()].ends_with("title}\n}"));
        assert_eq!(&text[spans[1].clone()], "@book{b, year = {2001}}");
    }

    #[test]
    fn test_record_spans_skip_stray_at_signs() {
        let text = "mail me @ home\n@misc{c, note = {x@y}}";
        let spans = record_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].clone()], "@misc{c, note = {x@y}}");
    }
}
