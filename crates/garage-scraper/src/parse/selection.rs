use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use garage_core::CatalogueOption;

/// Why a single catalogue entry could not be read.
#[derive(Debug, Error)]
enum EntryError {
    #[error("no manufacturer <span>")]
    MissingManufacturer,
    #[error("no catalogue name <dd>")]
    MissingName,
    #[error("no <a href>")]
    MissingLink,
    #[error("unresolvable link \"{href}\": {reason}")]
    BadLink { href: String, reason: String },
}

/// Extracts the catalogue options listed on a selection page, in document
/// order.
///
/// Entries that lack a manufacturer, a name, or a link are skipped; the rest
/// of the list is still read. A page without the `ul.catalogs` list yields an
/// empty vector.
#[must_use]
pub fn parse_selection_page(html: &str, base_url: &Url) -> Vec<CatalogueOption> {
    let document = Html::parse_document(html);
    let list_selector = Selector::parse("ul.catalogs").expect("valid selector");

    let Some(list) = document.select(&list_selector).next() else {
        tracing::debug!("selection page has no catalogue list");
        return Vec::new();
    };

    let selectors = EntrySelectors::new();
    let cleaner = LabelCleaner::new();
    list.children()
        .filter_map(ElementRef::wrap)
        .enumerate()
        .fold(Vec::new(), |mut options, (index, entry)| {
            match extract_catalogue_option(entry, base_url, &selectors, &cleaner) {
                Ok(option) => options.push(option),
                Err(reason) => tracing::debug!(index, %reason, "skipping catalogue entry"),
            }
            options
        })
}

fn extract_catalogue_option(
    entry: ElementRef<'_>,
    base_url: &Url,
    selectors: &EntrySelectors,
    cleaner: &LabelCleaner,
) -> Result<CatalogueOption, EntryError> {
    let manufacturer =
        first_text(entry, &selectors.manufacturer).ok_or(EntryError::MissingManufacturer)?;
    let name = first_text(entry, &selectors.name).ok_or(EntryError::MissingName)?;
    let href = entry
        .select(&selectors.link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or(EntryError::MissingLink)?;

    let url = base_url.join(href.trim()).map_err(|e| EntryError::BadLink {
        href: href.to_owned(),
        reason: e.to_string(),
    })?;

    Ok(CatalogueOption {
        manufacturer: cleaner.clean(&manufacturer),
        name: cleaner.clean(&name),
        url: url.to_string(),
    })
}

fn first_text(entry: ElementRef<'_>, selector: &Selector) -> Option<String> {
    entry
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

/// Where the parts of one catalogue entry live inside its list item.
struct EntrySelectors {
    manufacturer: Selector,
    name: Selector,
    link: Selector,
}

impl EntrySelectors {
    fn new() -> Self {
        Self {
            manufacturer: Selector::parse("span").expect("valid selector"),
            name: Selector::parse("dd").expect("valid selector"),
            link: Selector::parse("a[href]").expect("valid selector"),
        }
    }
}

/// Collapses line breaks, tabs, and every run of non-word characters into a
/// single space.
struct LabelCleaner {
    non_word: Regex,
}

impl LabelCleaner {
    fn new() -> Self {
        Self {
            non_word: Regex::new(r"\W+").expect("valid regex"),
        }
    }

    fn clean(&self, raw: &str) -> String {
        let spaced = raw.replace(['\n', '\t', '\r'], " ");
        self.non_word.replace_all(&spaced, " ").trim().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaner_collapses_whitespace_and_punctuation() {
        let cleaner = LabelCleaner::new();
        assert_eq!(cleaner.clean("\n\t  MANN-FILTER\r\n "), "MANN FILTER");
        assert_eq!(cleaner.clean("Фильтр   масляный,  (двигатель)"), "Фильтр масляный двигатель");
    }

    #[test]
    fn one_set_of_selectors_reads_every_entry() {
        let html = Html::parse_fragment(
            "<ul><li><a href=\"/a\"><span>MANN</span><dd>W 914</dd></a></li>\
             <li><a href=\"/b\"><span>BOSCH</span><dd>F 026</dd></a></li></ul>",
        );
        let base = Url::parse("https://www.exist.ru/").unwrap();
        let selectors = EntrySelectors::new();
        let cleaner = LabelCleaner::new();
        let item = Selector::parse("li").unwrap();

        let names: Vec<String> = html
            .select(&item)
            .map(|entry| extract_catalogue_option(entry, &base, &selectors, &cleaner).unwrap())
            .map(|option| format!("{} {} {}", option.manufacturer, option.name, option.url))
            .collect();

        assert_eq!(
            names,
            vec![
                "MANN W 914 https://www.exist.ru/a",
                "BOSCH F 026 https://www.exist.ru/b",
            ]
        );
    }

    #[test]
    fn cleaner_trims_edges_left_by_collapsed_runs() {
        let cleaner = LabelCleaner::new();
        assert_eq!(cleaner.clean(" (MANN) "), "MANN");
    }

    #[test]
    fn cleaner_keeps_word_characters() {
        let cleaner = LabelCleaner::new();
        assert_eq!(cleaner.clean("OC_90"), "OC_90");
    }
}
