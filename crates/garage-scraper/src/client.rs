//! HTTP client for the exist.ru parts catalogue.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::FetchError;

/// Path of the price page that answers a part-code lookup.
const PRICE_PATH: &str = "/Price/";

/// Query parameter carrying the part code.
const CODE_PARAM: &str = "pcode";

/// Fetches raw catalogue pages.
///
/// One GET per call: no caching and no retry. A failed fetch is surfaced to
/// the caller, which asks the user to reissue the command.
pub struct CatalogueClient {
    client: Client,
    base_url: Url,
}

impl CatalogueClient {
    /// Creates a client for the catalogue at `base_url`
    /// (e.g. `"https://www.exist.ru"`).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if `base_url` does not parse, or
    /// [`FetchError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| FetchError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Origin that relative catalogue links are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the canonical lookup URL for a part code:
    /// `<base>/Price/?pcode=<code>`, with the code form-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the price path cannot be joined
    /// onto the base URL.
    pub fn code_to_url(&self, code: &str) -> Result<String, FetchError> {
        let mut url = self
            .base_url
            .join(PRICE_PATH)
            .map_err(|e| FetchError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut().append_pair(CODE_PARAM, code);
        Ok(url.to_string())
    }

    /// Fetches the lookup page for a part code.
    ///
    /// # Errors
    ///
    /// See [`CatalogueClient::fetch`].
    pub async fn fetch_by_code(&self, code: &str) -> Result<String, FetchError> {
        let url = self.code_to_url(code)?;
        self.fetch(&url).await
    }

    /// Fetches `url` and returns the response body as text.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`]: `url` is not an absolute URL.
    /// - [`FetchError::UnexpectedStatus`]: any non-2xx response.
    /// - [`FetchError::Http`]: network, TLS, or body decoding failure.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        tracing::debug!(url, "fetching catalogue page");
        let response = self
            .client
            .get(parsed)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9,en;q=0.5")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        tracing::debug!(url, bytes = body.len(), "catalogue page fetched");
        Ok(body)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
