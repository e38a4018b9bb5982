//! Journal-name canonicalization for a whole `.bib` file.
//!
//! ADS exports journals as AAS macros (`\prd`) and INSPIRE uses its own abbreviations; both
//! are mapped onto one table. Records that carry a publisher journal also lose the arXiv
//! fields the publisher record duplicates.

use log::info;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;

use crate::bibliography::record_spans;
use crate::error::FillbibError;

/// Ordered (variant, canonical) pairs, applied in turn as substring replacements.
///
/// A variant that is the prefix of another (`\apj` of `\apjl`, `Astrophys.J.` of
/// `Astrophys.J.Lett.`) comes after it. No canonical name contains a variant.
pub static JOURNAL_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Monthly Notices of the Royal Astronomical Society", "Mon. Not. R. Astron. Soc."),
    ("Mon. Not. Roy. Astron. Soc.", "Mon. Not. R. Astron. Soc."),
    ("Mon.Not.Roy.Astron.Soc.", "Mon. Not. R. Astron. Soc."),
    ("\\mnras", "Mon. Not. R. Astron. Soc."),
    ("The Astrophysical Journal Letters", "Astrophys. J. Lett."),
    ("The Astrophysical Journal Supplement Series", "Astrophys. J. Suppl."),
    ("The Astrophysical Journal", "Astrophys. J."),
    ("\\apjl", "Astrophys. J. Lett."),
    ("\\apjs", "Astrophys. J. Suppl."),
    ("\\apj", "Astrophys. J."),
    ("Astrophys. J. Suppl. Ser.", "Astrophys. J. Suppl."),
    ("Astrophys.J.Lett.", "Astrophys. J. Lett."),
    ("Astrophys.J.Suppl.", "Astrophys. J. Suppl."),
    ("Astrophys.J.", "Astrophys. J."),
    ("Annu. Rev. Astron. Astrophys.", "Ann. Rev. Astron. Astrophys."),
    ("Ann.Rev.Astron.Astrophys.", "Ann. Rev. Astron. Astrophys."),
    ("\\araa", "Ann. Rev. Astron. Astrophys."),
    ("Astronomy and Astrophysics", "Astron. Astrophys."),
    ("Astron.Astrophys.", "Astron. Astrophys."),
    ("\\aap", "Astron. Astrophys."),
    ("Astron.J.", "Astron. J."),
    ("\\aj", "Astron. J."),
    ("Publ.Astron.Soc.Pac.", "Publ. Astron. Soc. Pac."),
    ("\\pasp", "Publ. Astron. Soc. Pac."),
    ("Physical Review Letters", "Phys. Rev. Lett."),
    ("Phys.Rev.Lett.", "Phys. Rev. Lett."),
    ("\\prl", "Phys. Rev. Lett."),
    ("Physical Review D", "Phys. Rev. D"),
    ("Phys.Rev.D", "Phys. Rev. D"),
    ("\\prd", "Phys. Rev. D"),
    ("Phys.Rev.A", "Phys. Rev. A"),
    ("\\pra", "Phys. Rev. A"),
    ("Phys.Rev.E", "Phys. Rev. E"),
    ("\\pre", "Phys. Rev. E"),
    ("Physics Reports", "Phys. Rept."),
    ("Phys.Rept.", "Phys. Rept."),
    ("\\physrep", "Phys. Rept."),
    ("Phys.Lett.B", "Phys. Lett. B"),
    ("Nucl.Phys.B", "Nucl. Phys. B"),
    ("Eur.Phys.J.C", "Eur. Phys. J. C"),
    ("\\nat", "Nature"),
    ("Journal of Cosmology and Astroparticle Physics", "JCAP"),
    ("J. Cosmol. Astropart. Phys.", "JCAP"),
    ("\\jcap", "JCAP"),
    ("Classical and Quantum Gravity", "Class. Quant. Grav."),
    ("Class. Quantum Grav.", "Class. Quant. Grav."),
    ("Class.Quant.Grav.", "Class. Quant. Grav."),
    ("Living Reviews in Relativity", "Living Rev. Rel."),
    ("Living Rev. Relativ.", "Living Rev. Rel."),
    ("Living Rev.Rel.", "Living Rev. Rel."),
    ("General Relativity and Gravitation", "Gen. Rel. Grav."),
    ("Gen. Relativ. Gravit.", "Gen. Rel. Grav."),
    ("Gen.Rel.Grav.", "Gen. Rel. Grav."),
];

static JOURNAL_FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^(?P<lead>[ \t]*journal[ \t]*=[ \t]*)(?P<value>.*?)(?P<tail>[ \t]*,?[ \t]*\r?)$")
        .expect("Invalid journal field regex pattern")
});
static ARXIV_FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:eprint|archiveprefix|primaryclass)[ \t]*=.*(?:\r?\n|$)")
        .expect("Invalid arXiv field regex pattern")
});

/// Split a field value into (opening delimiters, inner text, closing delimiters).
fn unwrap_value(value: &str) -> Option<(&str, &str, &str)> {
    let close = match value.chars().next()? {
        '"' => '"',
        '{' => '}',
        _ => return None,
    };
    if value.len() < 2 || !value.ends_with(close) {
        return None;
    }
    let inner = &value[1..value.len() - 1];
    // `{{Name}}` and `"{Name}"` protect the name from case changes; look through one more layer
    let depth = if inner.len() >= 2 && inner.starts_with('{') && inner.ends_with('}') {
        2
    } else {
        1
    };
    Some((&value[..depth], &value[depth..value.len() - depth], &value[value.len() - depth..]))
}

/// Replace every occurrence of `variant` in `value`.
///
/// A variant ending in a letter only matches when no letter follows it, so `\apj` leaves
/// `\apjl` alone and `Phys.Rev.A` leaves `Phys.Rev.Applied` alone.
fn replace_variant(value: &str, variant: &str, canonical: &str) -> String {
    if !variant.ends_with(|c: char| c.is_ascii_alphabetic()) {
        return value.replace(variant, canonical);
    }
    let mut output = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = rest.find(variant) {
        let after = &rest[at + variant.len()..];
        output.push_str(&rest[..at]);
        if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
            output.push_str(variant);
        } else {
            output.push_str(canonical);
        }
        rest = after;
    }
    output.push_str(rest);
    output
}

/// Apply the table to one journal value, in table order.
fn canonical_value(value: &str, table: &[(&str, &str)]) -> String {
    table.iter().fold(value.to_string(), |value, (variant, canonical)| {
        if value.contains(variant) {
            replace_variant(&value, variant, canonical)
        } else {
            value
        }
    })
}

/// Journal name of a record, without delimiters.
fn journal_of(record: &str) -> Option<String> {
    let caps = JOURNAL_FIELD_REGEX.captures(record)?;
    let value = caps.name("value")?.as_str();
    unwrap_value(value).map(|(_, inner, _)| inner.trim().to_string())
}

/// Replace journal names from `table` and drop duplicated arXiv fields from published records.
pub fn canonicalize(text: &str, table: &[(&str, &str)]) -> String {
    let renamed = JOURNAL_FIELD_REGEX.replace_all(text, |caps: &Captures| {
        format!(
            "{}{}{}",
            &caps["lead"],
            canonical_value(&caps["value"], table),
            &caps["tail"]
        )
    });

    let mut output = String::with_capacity(renamed.len());
    let mut last = 0;
    for span in record_spans(&renamed) {
        output.push_str(&renamed[last..span.start]);
        let record = &renamed[span.clone()];
        let published = journal_of(record).is_some_and(|journal| {
            !journal.is_empty() && !journal.to_ascii_lowercase().starts_with("arxiv")
        });
        if published {
            output.push_str(&ARXIV_FIELD_REGEX.replace_all(record, ""));
        } else {
            output.push_str(record);
        }
        last = span.end;
    }
    output.push_str(&renamed[last..]);
    output
}

/// Run [`canonicalize`] over a `.bib` file in place. Returns whether the file changed.
pub fn canonicalize_file(bib_file: &Path, table: &[(&str, &str)]) -> Result<bool, FillbibError> {
    let content = fs::read_to_string(bib_file).map_err(|e| FillbibError::io(bib_file, e))?;
    let updated = canonicalize(&content, table);
    if updated == content {
        return Ok(false);
    }
    fs::write(bib_file, updated).map_err(|e| FillbibError::io(bib_file, e))?;
    info!("Canonicalized journal names in {:?}", bib_file);
    Ok(true)
}
