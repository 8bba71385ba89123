use thiserror::Error;

/// Failure to obtain a page from the catalogue website.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid catalogue URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A part-detail page whose embedded data is missing or unreadable.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no inline script assigns `var _data`")]
    DataScriptNotFound,

    #[error("malformed `_data` JSON: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    #[error("`_data` array is empty")]
    EmptyData,
}
