//! Fill a LaTeX document's BibTeX database from ADS and INSPIRE.
//!
//! The keys a document cites are read from its `.aux` file, the ones missing from the
//! `.bib` file are looked up remotely, and the records are appended.

pub mod bibliography;
pub mod error;
pub mod latex;
pub mod reconcile;
pub mod sources;

pub use error::FillbibError;
pub use reconcile::{fill_database, process_document, resolve_keys, ProcessOptions, Report};
pub use sources::{classify, FetchOptions, FetchedRecord, Lookup, RecordSource, SourceKind, Sources};
