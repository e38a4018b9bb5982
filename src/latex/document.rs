use log::info;
use std::fs;
use std::path::Path;

use crate::error::FillbibError;

/// Replace every occurrence of each preprint key with its published key.
///
/// Returns the new text and the number of occurrences replaced.
pub fn replace_identifiers(content: &str, replacements: &[(String, String)]) -> (String, usize) {
    let mut output = content.to_string();
    let mut count = 0;
    for (preprint, published) in replacements {
        if preprint.is_empty() || preprint == published {
            continue;
        }
        let hits = output.matches(preprint.as_str()).count();
        if hits > 0 {
            output = output.replace(preprint.as_str(), published);
            count += hits;
        }
    }
    (output, count)
}

/// Rewrite a `.tex` file in place. The file is only written when something changed.
pub fn rewrite_document(tex_file: &Path, replacements: &[(String, String)]) -> Result<usize, FillbibError> {
    if replacements.is_empty() {
        return Ok(0);
    }
    let content = fs::read_to_string(tex_file).map_err(|e| FillbibError::io(tex_file, e))?;
    let (updated, count) = replace_identifiers(&content, replacements);
    if count > 0 {
        fs::write(tex_file, updated).map_err(|e| FillbibError::io(tex_file, e))?;
        info!("Replaced {} preprint identifier(s) in {:?}", count, tex_file);
    }
    Ok(count)
}
