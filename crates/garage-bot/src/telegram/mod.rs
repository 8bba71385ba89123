//! Telegram transport: long polling in, Bot API messages out.

pub mod client;
pub mod types;

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::commands::{Inbound, InboundKind};
use crate::dispatch::{Dispatcher, Handler};
use crate::present::{choice_grid, Choice, PhotoSource, Presenter, Table, TransportError};
use crate::session::UserId;

pub use client::TelegramClient;
use types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup, ReplyMarkup,
    SendMessage, Update,
};

/// Longest `callback_data` the Bot API accepts, in bytes.
const MAX_CALLBACK_DATA: usize = 64;

/// Long callback payloads remembered at once.
const MAX_CALLBACK_TOKENS: usize = 1024;

/// Longest message text the Bot API accepts, in characters.
const MAX_MESSAGE_CHARS: usize = 4096;

const MAIN_MENU: [[&str; 2]; 2] = [["/sparest", "/sparesf"], ["/cars", "/help"]];

/// Pause before polling again after a failed `getUpdates`.
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

/// Presents the bot's replies as Telegram messages.
pub struct TelegramPresenter {
    client: TelegramClient,
    tokens: CallbackTokens,
}

impl TelegramPresenter {
    pub fn new(client: TelegramClient) -> Self {
        Self {
            client,
            tokens: CallbackTokens::default(),
        }
    }

    /// Turns an update into an inbound event. The user is the sender; the
    /// chat id stands in when a message has no sender.
    pub fn to_inbound(&self, update: &Update) -> Option<Inbound> {
        if let Some(query) = &update.callback_query {
            let data = query.data.as_deref()?;
            return Some(Inbound {
                user: query.from.id,
                kind: InboundKind::Callback {
                    payload: self.tokens.resolve(data),
                },
            });
        }

        let message = update.message.as_ref()?;
        let user = message.from.as_ref().map_or(message.chat.id, |from| from.id);
        if let Some(text) = &message.text {
            return Some(Inbound::from_text(user, text));
        }

        let largest = message
            .photo
            .iter()
            .max_by_key(|size| u64::from(size.width) * u64::from(size.height))?;
        Some(Inbound {
            user,
            kind: InboundKind::Photo {
                file_id: largest.file_id.clone(),
            },
        })
    }

    async fn send(
        &self,
        user: UserId,
        text: &str,
        parse_mode: Option<&'static str>,
        reply_markup: ReplyMarkup,
    ) -> Result<(), TransportError> {
        self.client
            .send_message(&SendMessage {
                chat_id: user,
                text,
                parse_mode,
                reply_markup,
            })
            .await
    }
}

impl Presenter for TelegramPresenter {
    async fn send_text(&self, user: UserId, text: &str) -> Result<(), TransportError> {
        self.send(user, text, None, main_menu()).await
    }

    async fn send_table(&self, user: UserId, table: &Table) -> Result<(), TransportError> {
        for message in table_messages(&table.render()) {
            self.send(user, &message, Some("HTML"), main_menu()).await?;
        }
        Ok(())
    }

    async fn present_choices(
        &self,
        user: UserId,
        prompt: &str,
        choices: &[Choice],
    ) -> Result<(), TransportError> {
        let inline_keyboard = choice_grid(choices)
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|choice| InlineKeyboardButton {
                        callback_data: self.tokens.shorten(&choice.payload),
                        text: choice.label,
                    })
                    .collect()
            })
            .collect();
        let markup = ReplyMarkup::Inline(InlineKeyboardMarkup { inline_keyboard });
        self.send(user, prompt, None, markup).await
    }

    async fn send_document(
        &self,
        user: UserId,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.client
            .send_document(user, file_name, contents, &main_menu())
            .await
    }
}

impl PhotoSource for TelegramPresenter {
    async fn download_photo(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        let file = self.client.get_file(file_id).await?;
        let path = file.file_path.ok_or_else(|| TransportError::Api {
            method: "getFile".to_owned(),
            description: format!("file {} has no download path", file.file_id),
        })?;
        self.client.download_file(&path).await
    }
}

/// Polls for updates until `shutdown` resolves, feeding every event through a
/// per-user [`Dispatcher`].
pub async fn run_polling<H: Handler>(
    presenter: Arc<TelegramPresenter>,
    handler: Arc<H>,
    poll_timeout_secs: u64,
    shutdown: impl Future<Output = ()>,
) {
    let mut dispatcher = Dispatcher::new(handler);
    let mut offset = None;
    tokio::pin!(shutdown);

    tracing::info!(poll_timeout_secs, "polling Telegram for updates");
    loop {
        let polled = tokio::select! {
            () = &mut shutdown => break,
            polled = presenter.client.get_updates(offset, poll_timeout_secs) => polled,
        };

        let updates = match polled {
            Ok(updates) => updates,
            Err(error) => {
                tracing::warn!(error = %error, "getUpdates failed");
                tokio::time::sleep(POLL_ERROR_PAUSE).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            if let Some(query) = &update.callback_query {
                if let Err(error) = presenter.client.answer_callback_query(&query.id).await {
                    tracing::warn!(error = %error, "answerCallbackQuery failed");
                }
            }
            match presenter.to_inbound(&update) {
                Some(event) => dispatcher.dispatch(event),
                None => tracing::debug!(update_id = update.update_id, "update ignored"),
            }
        }
    }
    tracing::info!(users = dispatcher.active_users(), "stopped polling");
}

fn main_menu() -> ReplyMarkup {
    ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
        keyboard: MAIN_MENU
            .iter()
            .map(|row| {
                row.iter()
                    .map(|text| KeyboardButton {
                        text: (*text).to_owned(),
                    })
                    .collect()
            })
            .collect(),
        resize_keyboard: true,
    })
}

/// Callback payloads too long for `callback_data`, keyed by the short token
/// sent in their place. Holds at most `capacity` payloads; the oldest token
/// is forgotten first, after which a press on it arrives as the bare token.
#[derive(Debug)]
struct CallbackTokens {
    capacity: usize,
    table: Mutex<TokenTable>,
}

#[derive(Debug, Default)]
struct TokenTable {
    issued: u64,
    by_token: HashMap<String, String>,
    by_payload: HashMap<String, String>,
    oldest_first: VecDeque<String>,
}

impl Default for CallbackTokens {
    fn default() -> Self {
        Self::with_capacity(MAX_CALLBACK_TOKENS)
    }
}

impl CallbackTokens {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            table: Mutex::default(),
        }
    }

    fn shorten(&self, payload: &str) -> String {
        if payload.len() <= MAX_CALLBACK_DATA {
            return payload.to_owned();
        }
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = table.by_payload.get(payload) {
            return token.clone();
        }

        while table.oldest_first.len() >= self.capacity.max(1) {
            let Some(expired) = table.oldest_first.pop_front() else {
                break;
            };
            if let Some(expired_payload) = table.by_token.remove(&expired) {
                table.by_payload.remove(&expired_payload);
            }
        }

        table.issued += 1;
        let token = format!("cb:{}", table.issued);
        table.by_token.insert(token.clone(), payload.to_owned());
        table.by_payload.insert(payload.to_owned(), token.clone());
        table.oldest_first.push_back(token.clone());
        token
    }

    fn resolve(&self, data: &str) -> String {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_token
            .get(data)
            .cloned()
            .unwrap_or_else(|| data.to_owned())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_token
            .len()
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes `line`, cutting it short with an ellipsis once the escaped text
/// would exceed `max_chars`. Entities are never split.
fn fit_line(line: &str, max_chars: usize) -> String {
    let escaped = escape_html(line);
    if escaped.chars().count() <= max_chars {
        return escaped;
    }

    let mut fitted = String::new();
    let mut fitted_chars = 0;
    for ch in line.chars() {
        let piece = escape_html(ch.encode_utf8(&mut [0; 4]));
        let piece_chars = piece.chars().count();
        if fitted_chars + piece_chars + 1 > max_chars {
            break;
        }
        fitted.push_str(&piece);
        fitted_chars += piece_chars;
    }
    fitted.push('…');
    fitted
}

/// Splits a rendered table into `<pre>` messages within the message size
/// limit, breaking only between lines. A line too long for one message is
/// truncated.
fn table_messages(rendered: &str) -> Vec<String> {
    let budget = MAX_MESSAGE_CHARS - "<pre></pre>".len();
    let mut messages = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in rendered.lines() {
        let escaped = fit_line(line, budget - 1);
        let chars = escaped.chars().count() + 1;
        if current_chars + chars > budget && !current.is_empty() {
            messages.push(format!("<pre>{}</pre>", current.trim_end_matches('\n')));
            current.clear();
            current_chars = 0;
        }
        current.push_str(&escaped);
        current.push('\n');
        current_chars += chars;
    }
    if !current.is_empty() {
        messages.push(format!("<pre>{}</pre>", current.trim_end_matches('\n')));
    }
    messages
}

#[cfg(test)]
#[path = "telegram_test.rs"]
mod tests;
