//! HTTP client for the Telegram Bot API.
//!
//! Every method is a POST to `<api>/bot<token>/<method>`; responses arrive in
//! an `{"ok": ..., "result": ...}` envelope and an `ok: false` envelope is
//! surfaced as [`TransportError::Api`]. Request URLs carry the bot token, so
//! they are stripped from HTTP errors before those reach a log.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use crate::present::TransportError;
use crate::telegram::types::{
    AnswerCallbackQuery, ApiResponse, File, GetFile, GetUpdates, ReplyMarkup, SendMessage, Update,
};

/// Extra time allowed on top of the long-poll timeout before giving up on a
/// request.
const REQUEST_GRACE_SECS: u64 = 10;

const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

pub struct TelegramClient {
    client: Client,
    api_base: Url,
    file_base: Url,
}

impl TelegramClient {
    /// Creates a client for the bot identified by `token`, against the Bot
    /// API at `api_url` (e.g. `"https://api.telegram.org"`).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the URLs cannot be built, or
    /// [`TransportError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn new(api_url: &str, token: &str, poll_timeout_secs: u64) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + REQUEST_GRACE_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(http)?;

        let root = api_url.trim_end_matches('/');
        let parse = |raw: String| {
            Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
                reason: e.to_string(),
            })
        };

        Ok(Self {
            client,
            api_base: parse(format!("{root}/bot{token}/"))?,
            file_base: parse(format!("{root}/file/bot{token}/"))?,
        })
    }

    /// Long-polls for updates after `offset`.
    ///
    /// # Errors
    ///
    /// See [`TelegramClient::send_message`].
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: ALLOWED_UPDATES,
            },
        )
        .await
    }

    /// # Errors
    ///
    /// - [`TransportError::Api`]: the Bot API answered `ok: false`.
    /// - [`TransportError::UnexpectedStatus`]: non-2xx without an API envelope.
    /// - [`TransportError::Http`]: network failure.
    /// - [`TransportError::Json`]: the envelope could not be read.
    pub async fn send_message(&self, message: &SendMessage<'_>) -> Result<(), TransportError> {
        let _: IgnoredAny = self.call("sendMessage", message).await?;
        Ok(())
    }

    /// Uploads `contents` as a file named `file_name`.
    ///
    /// # Errors
    ///
    /// See [`TelegramClient::send_message`].
    pub async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        contents: Vec<u8>,
        reply_markup: &ReplyMarkup,
    ) -> Result<(), TransportError> {
        let markup = serde_json::to_string(reply_markup).map_err(|source| TransportError::Json {
            context: "sendDocument reply_markup".to_owned(),
            source,
        })?;
        let document = Part::bytes(contents)
            .file_name(file_name.to_owned())
            .mime_str("text/csv")
            .map_err(http)?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("reply_markup", markup)
            .part("document", document);

        let response = self
            .client
            .post(self.method_url("sendDocument")?)
            .multipart(form)
            .send()
            .await
            .map_err(http)?;
        let _: IgnoredAny = read_result("sendDocument", response).await?;
        Ok(())
    }

    /// Stops the client's spinner on a pressed inline button.
    ///
    /// # Errors
    ///
    /// See [`TelegramClient::send_message`].
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TransportError> {
        let _: IgnoredAny = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery { callback_query_id },
            )
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`TelegramClient::send_message`].
    pub async fn get_file(&self, file_id: &str) -> Result<File, TransportError> {
        self.call("getFile", &GetFile { file_id }).await
    }

    /// Downloads a file previously located with [`TelegramClient::get_file`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnexpectedStatus`] on a non-2xx response and
    /// [`TransportError::Http`] on network failure.
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, TransportError> {
        let url = self
            .file_base
            .join(file_path)
            .map_err(|e| TransportError::InvalidUrl {
                reason: e.to_string(),
            })?;
        let response = self.client.get(url).send().await.map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                method: "file download".to_owned(),
            });
        }
        let bytes = response.bytes().await.map_err(http)?;
        tracing::debug!(bytes = bytes.len(), "file downloaded");
        Ok(bytes.to_vec())
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method)?)
            .json(body)
            .send()
            .await
            .map_err(http)?;
        read_result(method, response).await
    }

    fn method_url(&self, method: &str) -> Result<Url, TransportError> {
        self.api_base
            .join(method)
            .map_err(|e| TransportError::InvalidUrl {
                reason: e.to_string(),
            })
    }
}

fn http(error: reqwest::Error) -> TransportError {
    TransportError::Http(error.without_url())
}

/// Unwraps the API envelope. Error statuses usually still carry an envelope
/// with a description, which is preferred over the bare status.
async fn read_result<T: DeserializeOwned>(
    method: &str,
    response: Response,
) -> Result<T, TransportError> {
    let status = response.status();
    let body = response.text().await.map_err(http)?;

    let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                method: method.to_owned(),
            })
        }
        Err(source) => {
            return Err(TransportError::Json {
                context: method.to_owned(),
                source,
            })
        }
    };

    match envelope {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse { description, .. } => Err(TransportError::Api {
            method: method.to_owned(),
            description: description.unwrap_or_else(|| format!("HTTP {status}")),
        }),
    }
}
