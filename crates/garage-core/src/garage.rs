//! Domain types shared by the catalogue scraper, the storage layer, and the bot.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Label shown wherever a part has no car attached.
pub const NO_CAR_LABEL: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: i64,
    pub name: String,
}

/// A part as read back from a catalogue part-detail page, before the user has
/// chosen which car it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartCandidate {
    pub part_number: String,
    pub catalogue_name: String,
    /// Catalogue description; the literal `"None"` when the page carries `null`.
    pub description: String,
}

/// One entry of a catalogue-selection page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueOption {
    pub manufacturer: String,
    pub name: String,
    /// Absolute URL of the catalogue's part page.
    pub url: String,
}

impl CatalogueOption {
    /// Button label: `"<manufacturer> <name>"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.manufacturer, self.name)
    }
}

/// A part about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPart {
    pub part_number: String,
    pub manufacturer: String,
    pub name: String,
    pub link: String,
    /// `None` when the user picked the "no car" option.
    pub car_id: Option<i64>,
}

impl NewPart {
    /// Assembles the record committed at the end of an acquisition.
    ///
    /// The part page does not say who made the part, so `manufacturer` stays
    /// empty.
    #[must_use]
    pub fn from_candidate(candidate: &PartCandidate, link: &str, car_id: Option<i64>) -> Self {
        Self {
            part_number: candidate.part_number.clone(),
            manufacturer: String::new(),
            name: candidate.description.clone(),
            link: link.to_owned(),
            car_id,
        }
    }
}

/// A stored part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: i64,
    pub part_number: String,
    pub manufacturer: String,
    pub name: String,
    pub link: String,
    pub car_id: Option<i64>,
}

/// A stored part joined with the name of the car it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartListing {
    pub part_number: String,
    pub manufacturer: String,
    pub name: String,
    pub link: String,
    pub car_name: Option<String>,
}

impl PartListing {
    #[must_use]
    pub fn car_label(&self) -> &str {
        self.car_name.as_deref().unwrap_or(NO_CAR_LABEL)
    }
}

/// Trims a user-supplied car name.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyCarName`] when nothing but whitespace is left.
pub fn normalize_car_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyCarName);
    }
    Ok(name.to_owned())
}
