//! Classification and extraction for the two page shapes the catalogue serves:
//! a catalogue-selection page (one code, several products) and a part-detail
//! page (one product, data embedded in an inline script).

mod part_page;
mod selection;

pub use part_page::parse_part_page;
pub use selection::parse_selection_page;

/// Text the catalogue shows when a code matches more than one catalogue
/// ("choose a catalogue").
pub const SELECTION_MARKER: &str = "Выберите каталог";

/// Returns `true` when `html` is a catalogue-selection page.
#[must_use]
pub fn is_selection_page(html: &str) -> bool {
    html.contains(SELECTION_MARKER)
}

#[cfg(test)]
#[path = "../parse_test.rs"]
mod tests;
