pub mod client;
pub mod error;
pub mod parse;

pub use client::CatalogueClient;
pub use error::{FetchError, ParseError};
pub use parse::{is_selection_page, parse_part_page, parse_selection_page, SELECTION_MARKER};
