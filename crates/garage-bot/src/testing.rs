//! Test doubles and page fixtures shared by the bot's unit tests.

use std::sync::Mutex;

use crate::present::{Choice, PhotoSource, Presenter, Table, TransportError};
use crate::session::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        user: UserId,
        text: String,
    },
    Table {
        user: UserId,
        rendered: String,
    },
    Choices {
        user: UserId,
        prompt: String,
        choices: Vec<Choice>,
    },
    Document {
        user: UserId,
        file_name: String,
        contents: Vec<u8>,
    },
}

/// Records everything the bot says; serves a fixed photo.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    sent: Mutex<Vec<Sent>>,
    photo: Vec<u8>,
}

impl RecordingPresenter {
    pub fn with_photo(photo: &[u8]) -> Self {
        Self {
            photo: photo.to_vec(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_to(&self, user: UserId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { user: u, text } if u == user => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_choices_to(&self, user: UserId) -> Option<(String, Vec<Choice>)> {
        self.sent().into_iter().rev().find_map(|sent| match sent {
            Sent::Choices {
                user: u,
                prompt,
                choices,
            } if u == user => Some((prompt, choices)),
            _ => None,
        })
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

impl Presenter for RecordingPresenter {
    async fn send_text(&self, user: UserId, text: &str) -> Result<(), TransportError> {
        self.record(Sent::Text {
            user,
            text: text.to_owned(),
        });
        Ok(())
    }

    async fn send_table(&self, user: UserId, table: &Table) -> Result<(), TransportError> {
        self.record(Sent::Table {
            user,
            rendered: table.render(),
        });
        Ok(())
    }

    async fn present_choices(
        &self,
        user: UserId,
        prompt: &str,
        choices: &[Choice],
    ) -> Result<(), TransportError> {
        self.record(Sent::Choices {
            user,
            prompt: prompt.to_owned(),
            choices: choices.to_vec(),
        });
        Ok(())
    }

    async fn send_document(
        &self,
        user: UserId,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.record(Sent::Document {
            user,
            file_name: file_name.to_owned(),
            contents,
        });
        Ok(())
    }
}

impl PhotoSource for RecordingPresenter {
    async fn download_photo(&self, _file_id: &str) -> Result<Vec<u8>, TransportError> {
        Ok(self.photo.clone())
    }
}

/// A part-detail page embedding `data` as its `_data` array.
pub fn part_page(data: &str) -> String {
    format!(
        "<html><head><script src=\"/static/app.js\"></script></head><body>\
         <script type=\"text/javascript\">\n    var _data = {data};\n    var _favs = [];\n</script>\
         </body></html>"
    )
}

/// A catalogue-selection page with one entry per `(manufacturer, name, href)`.
pub fn selection_page(entries: &[(&str, &str, &str)]) -> String {
    let items: String = entries
        .iter()
        .map(|(manufacturer, name, href)| {
            format!(
                "<li><a href=\"{href}\"><dl><dt><span>{manufacturer}</span></dt><dd>{name}</dd></dl></a></li>"
            )
        })
        .collect();
    format!(
        "<html><body><h1>Выберите каталог</h1><ul class=\"catalogs\">{items}</ul></body></html>"
    )
}
