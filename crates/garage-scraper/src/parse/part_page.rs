use scraper::{Html, Selector};
use serde::Deserialize;

use garage_core::PartCandidate;

use crate::error::ParseError;

const DATA_ASSIGNMENT: &str = "var _data = ";
const FAVS_ASSIGNMENT: &str = "var _favs";
const MISSING_DESCRIPTION: &str = "None";

/// One element of the `_data` array embedded in a part-detail page.
#[derive(Debug, Deserialize)]
struct RawPart {
    #[serde(rename = "PartNumber")]
    part_number: String,
    #[serde(rename = "CatalogName")]
    catalog_name: String,
    #[serde(rename = "Description", default)]
    description: Option<String>,
}

impl From<RawPart> for PartCandidate {
    fn from(raw: RawPart) -> Self {
        Self {
            part_number: raw.part_number,
            catalogue_name: raw.catalog_name,
            description: raw
                .description
                .unwrap_or_else(|| MISSING_DESCRIPTION.to_owned()),
        }
    }
}

/// Reads the part described by a part-detail page.
///
/// The page embeds its data in an inline script as
/// `var _data = [ {...}, ... ]; var _favs = ...`; the first array element is
/// the part.
///
/// # Errors
///
/// - [`ParseError::DataScriptNotFound`]: no inline script assigns `_data`.
/// - [`ParseError::Json`]: the array is not valid JSON or lacks
///   `PartNumber` / `CatalogName`.
/// - [`ParseError::EmptyData`]: the array has no elements.
pub fn parse_part_page(html: &str) -> Result<PartCandidate, ParseError> {
    let document = Html::parse_document(html);
    let inline_scripts = Selector::parse("script:not([src])").expect("valid selector");

    let literal = document
        .select(&inline_scripts)
        .find_map(|script| data_literal(&script.text().collect::<String>()).map(str::to_owned))
        .ok_or(ParseError::DataScriptNotFound)?;

    let parts: Vec<RawPart> =
        serde_json::from_str(&literal).map_err(|source| ParseError::Json { source })?;

    parts
        .into_iter()
        .next()
        .map(PartCandidate::from)
        .ok_or(ParseError::EmptyData)
}

/// Returns the JSON literal assigned to `_data` inside `script`.
///
/// The literal ends where the `_favs` assignment begins. Scripts without a
/// `_favs` sibling fall back to the first balanced `[...]` after the
/// assignment.
fn data_literal(script: &str) -> Option<&str> {
    let start = script.find(DATA_ASSIGNMENT)? + DATA_ASSIGNMENT.len();
    let rest = &script[start..];

    match rest.find(FAVS_ASSIGNMENT) {
        Some(end) => Some(rest[..end].trim_end().trim_end_matches(';').trim()),
        None => extract_balanced_array(rest.trim_start()).or(Some(rest.trim())),
    }
}

/// Returns the shortest prefix of `s` that forms a complete `[...]` array,
/// respecting string literals and escapes. `None` if `s` does not start with
/// `[` or the array is unterminated.
fn extract_balanced_array(s: &str) -> Option<&str> {
    if !s.starts_with('[') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            '}' => depth -= 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
