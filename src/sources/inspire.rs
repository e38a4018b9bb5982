//! INSPIRE-HEP record fetcher.
//!
//! Keys are looked up with a `texkeys:` search on the literature API. The record is either the
//! vendor BibTeX export or generated from the JSON metadata.

use log::{debug, info};
use reqwest::blocking::Client;
use serde_json::Value;

use super::{FetchOptions, FetchedRecord, Lookup, RecordSource};
use crate::bibliography::{replace_record_key, BibEntry, BibEntryBuilder};
use crate::error::FillbibError;

pub const INSPIRE_BASE_URL: &str = "https://inspirehep.net";

pub struct InspireSource {
    client: Client,
    base_url: String,
}

impl InspireSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn search(&self, key: &str, format: Option<&str>) -> Result<String, FillbibError> {
        let url = format!("{}/api/literature", self.base_url);
        let query = format!("texkeys:\"{}\"", key);
        let mut request = self.client.get(&url).query(&[("q", query.as_str())]);
        if let Some(format) = format {
            request = request.query(&[("format", format)]);
        }

        let response = request.send()?;
        if !response.status().is_success() {
            return Err(FillbibError::ApiError(format!(
                "INSPIRE returned status {}",
                response.status()
            )));
        }
        Ok(response.text()?)
    }
}

impl RecordSource for InspireSource {
    fn name(&self) -> &str {
        "INSPIRE"
    }

    fn fetch(&self, key: &str, options: &FetchOptions) -> Result<Lookup, FillbibError> {
        info!("Querying INSPIRE for {}", key);
        let json: Value = serde_json::from_str(&self.search(key, None)?)?;

        let total = hit_count(&json);
        if total != Some(1) {
            return Ok(Lookup::NotFound(match total {
                Some(n) => format!("INSPIRE returned {} hits", n),
                None => "INSPIRE response has no hit count".to_string(),
            }));
        }

        if options.generate {
            let Some(metadata) = json.pointer("/hits/hits/0/metadata") else {
                return Ok(Lookup::NotFound("INSPIRE hit has no metadata".to_string()));
            };
            let entry = generate_entry(key, metadata, options);
            debug!("Generated {} field(s) for {}", entry.fields.len(), key);
            return Ok(Lookup::Found(FetchedRecord {
                key: key.to_string(),
                text: entry.to_string(),
                replaces: None,
            }));
        }

        let export = self.search(key, Some("bibtex"))?;
        let Some(at) = export.find('@') else {
            return Ok(Lookup::NotFound("empty INSPIRE BibTeX export".to_string()));
        };
        match replace_record_key(&export[at..], key) {
            Some(text) => Ok(Lookup::Found(FetchedRecord {
                key: key.to_string(),
                text: format!("{}\n", text.trim_end()),
                replaces: None,
            })),
            None => Ok(Lookup::NotFound("unparseable INSPIRE BibTeX export".to_string())),
        }
    }
}

/// Number of records matched by a search, from `hits.total`.
pub fn hit_count(json: &Value) -> Option<u64> {
    json.pointer("/hits/total").and_then(Value::as_u64)
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Strings and numbers both appear for years and page data.
fn text_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn strings_at(value: &Value, list: &str, field: &str) -> Vec<String> {
    value
        .get(list)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field).and_then(Value::as_str))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Join author names, truncating with `and others` past `max_authors`.
pub fn format_authors(names: &[String], max_authors: usize, shown_authors: Option<usize>) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    if names.len() <= max_authors {
        return Some(names.join(" and "));
    }
    let shown = shown_authors.unwrap_or(max_authors).min(max_authors);
    if shown == 0 {
        return Some("others".to_string());
    }
    Some(format!("{} and others", names[..shown].join(" and ")))
}

fn entry_type(metadata: &Value) -> &'static str {
    let types: Vec<&str> = metadata
        .get("document_type")
        .and_then(Value::as_array)
        .map(|types| types.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    if types.contains(&"conference paper") {
        "inproceedings"
    } else if types.contains(&"book") {
        "book"
    } else if types.contains(&"thesis") {
        "phdthesis"
    } else {
        "article"
    }
}

fn pages(publication: &Value) -> Option<String> {
    let start = text_at(publication, "/page_start");
    let end = text_at(publication, "/page_end");
    match (start, end) {
        (Some(start), Some(end)) if start != end => Some(format!("{}--{}", start, end)),
        (start, _) => text_at(publication, "/artid").or(start),
    }
}

/// Year and month from a `YYYY-MM-DD` (or shorter) preprint date.
fn preprint_year_month(date: &str) -> (Option<String>, Option<String>) {
    let mut parts = date.split('-');
    let year = parts
        .next()
        .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
        .map(String::from);
    let month = parts
        .next()
        .and_then(|m| m.parse::<u32>().ok())
        .filter(|m| (1..=12).contains(m))
        .map(|m| m.to_string());
    match year {
        Some(year) => (Some(year), month),
        None => (None, None),
    }
}

/// Build a record from an INSPIRE literature `metadata` object.
pub fn generate_entry(key: &str, metadata: &Value, options: &FetchOptions) -> BibEntry {
    let authors = strings_at(metadata, "authors", "full_name");
    let collaborations = strings_at(metadata, "collaborations", "value");
    let arxiv_id = str_at(metadata, "/arxiv_eprints/0/value");

    let publication = metadata
        .get("publication_info")
        .and_then(Value::as_array)
        .and_then(|infos| infos.iter().find(|info| str_at(info, "/journal_title").is_some()));
    let journal = publication.and_then(|p| str_at(p, "/journal_title")).map(String::from);

    let mut builder = BibEntryBuilder::new(key, entry_type(metadata))
        .field_opt("author", format_authors(&authors, options.max_authors, options.shown_authors))
        .field_opt(
            "collaboration",
            (!collaborations.is_empty()).then(|| collaborations.join(", ")),
        )
        .field_opt("title", str_at(metadata, "/titles/0/title").map(|t| format!("{{{}}}", t)));

    if let Some(arxiv_id) = arxiv_id {
        builder = builder
            .field("eprint", arxiv_id)
            .field("archivePrefix", "arXiv")
            .field_opt("primaryClass", str_at(metadata, "/arxiv_eprints/0/categories/0"));
    }

    builder = builder.field_opt("doi", str_at(metadata, "/dois/0/value"));

    match (journal, publication) {
        (Some(journal), Some(publication)) => {
            builder = builder
                .field("journal", journal)
                .field_opt("volume", text_at(publication, "/journal_volume"))
                .field_opt("number", text_at(publication, "/journal_issue"))
                .field_opt("pages", pages(publication));
        }
        _ if options.arxiv_journal => {
            builder = builder.field_opt("journal", arxiv_id.map(|id| format!("arXiv:{}", id)));
        }
        _ => {}
    }

    let year = publication.and_then(|p| text_at(p, "/year"));
    builder = match year {
        Some(year) => builder.field("year", year),
        None => {
            let (year, month) = str_at(metadata, "/preprint_date")
                .map(preprint_year_month)
                .unwrap_or((None, None));
            builder.field_opt("year", year).field_opt("month", month)
        }
    };

    builder.build()
}
