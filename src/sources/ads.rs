//! NASA ADS (Astrophysics Data System) record fetcher.
//!
//! The abstract page's export view embeds the BibTeX record in a `<textarea>`; no API token
//! is needed for it.

use log::info;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::blocking::Client;
use reqwest::StatusCode;

use super::{FetchOptions, FetchedRecord, Lookup, RecordSource};
use crate::bibliography::{record_header, replace_record_key};
use crate::error::FillbibError;

pub const ADS_BASE_URL: &str = "https://ui.adsabs.harvard.edu";

static NUMERIC_ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").expect("Invalid numeric entity regex pattern")
});

pub struct AdsSource {
    client: Client,
    base_url: String,
}

impl AdsSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn export_url(&self, key: &str) -> String {
        format!("{}/abs/{}/exportcitation", self.base_url, key)
    }
}

impl RecordSource for AdsSource {
    fn name(&self) -> &str {
        "ADS"
    }

    fn fetch(&self, key: &str, options: &FetchOptions) -> Result<Lookup, FillbibError> {
        let url = self.export_url(key);
        info!("Querying ADS for {}", key);
        let response = self.client.get(&url).send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound(format!("ADS has no abstract page for {}", key)));
        }
        if !response.status().is_success() {
            return Err(FillbibError::ApiError(format!("ADS returned status {}", response.status())));
        }

        let html = response.text()?;
        let Some(bibtex) = extract_bibtex(&html) else {
            return Ok(Lookup::NotFound("no BibTeX export in ADS response".to_string()));
        };
        Ok(reconcile_key(key, bibtex, options))
    }
}

/// ADS bibcodes for arXiv preprints carry `arXiv` as their journal code, e.g. `2016arXiv160203837T`.
pub fn is_preprint_key(key: &str) -> bool {
    key.get(4..9) == Some("arXiv")
}

/// Pull the BibTeX record out of the export page markup.
pub fn extract_bibtex(html: &str) -> Option<String> {
    let start = html.find("<textarea")?;
    let body_start = start + html[start..].find('>')? + 1;
    let body_end = body_start + html[body_start..].find("</textarea>")?;
    let body = unescape_html(&html[body_start..body_end]);
    let at = body.find('@')?;
    Some(format!("{}\n", body[at..].trim_end()))
}

/// Decode the entities ADS emits inside the export textarea.
pub fn unescape_html(text: &str) -> String {
    let named = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ");
    let numeric = NUMERIC_ENTITY_REGEX.replace_all(&named, |caps: &Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    // last, so `&amp;lt;` decodes to `&lt;` and not `<`
    numeric.replace("&amp;", "&")
}

/// Check the returned record's key against the requested one.
///
/// A preprint key answered with a published record either gets its own key written back into
/// the record, or (with `replace_preprints`) keeps the published key and reports the swap.
pub fn reconcile_key(requested: &str, bibtex: String, options: &FetchOptions) -> Lookup {
    let Some((_, returned)) = record_header(&bibtex) else {
        return Lookup::NotFound("unparseable BibTeX header in ADS response".to_string());
    };
    let returned = returned.to_string();

    if returned == requested {
        return Lookup::Found(FetchedRecord {
            key: returned,
            text: bibtex,
            replaces: None,
        });
    }

    if !is_preprint_key(requested) {
        return Lookup::NotFound(format!("ADS returned {} for {}", returned, requested));
    }

    if options.replace_preprints {
        info!("{} has been published as {}", requested, returned);
        Lookup::Found(FetchedRecord {
            key: returned,
            text: bibtex,
            replaces: Some(requested.to_string()),
        })
    } else {
        match replace_record_key(&bibtex, requested) {
            Some(text) => Lookup::Found(FetchedRecord {
                key: requested.to_string(),
                text,
                replaces: None,
            }),
            None => Lookup::NotFound("unparseable BibTeX header in ADS response".to_string()),
        }
    }
}
