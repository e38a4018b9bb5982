pub mod ads;
pub mod inspire;

use log::debug;
use reqwest::blocking::Client;

use crate::error::FillbibError;

pub use ads::AdsSource;
pub use inspire::InspireSource;

/// Shared flags that shape what the fetchers return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Keep the published key the ADS returns for a preprint key, and report the replacement
    pub replace_preprints: bool,
    /// Build INSPIRE records from the JSON metadata instead of the vendor BibTeX export
    pub generate: bool,
    /// Author lists longer than this are truncated with `and others`
    pub max_authors: usize,
    /// Names kept when truncating; defaults to `max_authors`
    pub shown_authors: Option<usize>,
    /// Use `arXiv:<id>` as the journal of generated records that have none
    pub arxiv_journal: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            replace_preprints: false,
            generate: false,
            max_authors: 10,
            shown_authors: None,
            arxiv_journal: false,
        }
    }
}

/// A record ready to be appended to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRecord {
    /// Key the record is stored under
    pub key: String,
    /// BibTeX text, with the header carrying `key`
    pub text: String,
    /// Preprint key this published record supersedes
    pub replaces: Option<String>,
}

/// Outcome of a lookup that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(FetchedRecord),
    NotFound(String),
}

/// A remote service that resolves citation keys to BibTeX records.
///
/// `Err` means the service could not be asked (network or HTTP failure); `Ok(NotFound)`
/// means it answered without a usable record.
pub trait RecordSource {
    /// The name used in diagnostics (e.g., "ADS", "INSPIRE").
    fn name(&self) -> &str;

    fn fetch(&self, key: &str, options: &FetchOptions) -> Result<Lookup, FillbibError>;
}

/// Which service a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Bibcodes such as `2016PhRvL.116f1102A`
    Ads,
    /// Texkeys such as `Abbott:2016blz`
    Inspire,
}

/// Keys starting with a digit are ADS bibcodes, everything else goes to INSPIRE.
pub fn classify(key: &str) -> SourceKind {
    if key.starts_with(|c: char| c.is_ascii_digit()) {
        SourceKind::Ads
    } else {
        SourceKind::Inspire
    }
}

/// Both fetchers, sharing one blocking HTTP client.
pub struct Sources {
    pub ads: AdsSource,
    pub inspire: InspireSource,
}

impl Sources {
    pub fn new(client: Client, ads_base_url: impl Into<String>, inspire_base_url: impl Into<String>) -> Self {
        Self {
            ads: AdsSource::new(client.clone(), ads_base_url),
            inspire: InspireSource::new(client, inspire_base_url),
        }
    }

    /// Build the fetchers, honouring `ADS_BASE_URL` and `INSPIRE_BASE_URL` overrides.
    pub fn from_env() -> Result<Self, FillbibError> {
        let client = Client::builder()
            .user_agent(concat!("fillbib/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let ads_base = std::env::var("ADS_BASE_URL").unwrap_or_else(|_| ads::ADS_BASE_URL.to_string());
        let inspire_base =
            std::env::var("INSPIRE_BASE_URL").unwrap_or_else(|_| inspire::INSPIRE_BASE_URL.to_string());
        debug!("Using ADS at {} and INSPIRE at {}", ads_base, inspire_base);
        Ok(Self::new(client, ads_base, inspire_base))
    }

    pub fn for_key(&self, key: &str) -> &dyn RecordSource {
        match classify(key) {
            SourceKind::Ads => &self.ads,
            SourceKind::Inspire => &self.inspire,
        }
    }
}
