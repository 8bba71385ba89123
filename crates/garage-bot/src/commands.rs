//! Routes inbound chat events to the bot's commands.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use garage_core::{normalize_car_name, PartListing, ValidationError};
use garage_db::DbError;
use garage_scraper::CatalogueClient;

use crate::acquisition::Acquisition;
use crate::barcode::{BarcodeDecoder, DecodeError};
use crate::dispatch::Handler;
use crate::present::{warn_undelivered, PhotoSource, Presenter, Table, TransportError};
use crate::session::UserId;
use crate::store::PartStore;

const HELP_TEXT: &str = "\
Hi! Time to sort out the garage? Let me help.
/help - show this help
/cars - list cars
/sparest - list spare parts as a table
/sparesf - list spare parts as a CSV file
/addcar <car name> - add a car
/s <query> - search spare parts by description
/a <part number> - add a spare part by its number
Send a photo and I will try to read the part's barcode.";

const UNKNOWN_TEXT: &str = "Unknown command, see /help";

/// One event from a chat user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user: UserId,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// `/<name>[@bot] <args>`; `text` is the message as typed.
    Command {
        name: String,
        args: String,
        text: String,
    },
    Text(String),
    Callback {
        payload: String,
    },
    Photo {
        file_id: String,
    },
}

impl Inbound {
    /// Classifies a text message as a command or plain text.
    #[must_use]
    pub fn from_text(user: UserId, text: &str) -> Self {
        let kind = match parse_command_text(text) {
            Some((name, args)) => InboundKind::Command {
                name,
                args,
                text: text.to_owned(),
            },
            None => InboundKind::Text(text.to_owned()),
        };
        Self { user, kind }
    }
}

/// Splits `/<name>[@bot] <args>` into a lowercased name and trimmed args.
#[must_use]
pub fn parse_command_text(text: &str) -> Option<(String, String)> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (head, args) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), args.trim().to_owned()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Help,
    Status,
    Cars,
    Search(String),
    PartsTable,
    PartsCsv,
    AddCar(String),
    Acquire(String),
    Unknown,
}

impl Command {
    fn parse(name: &str, args: &str) -> Self {
        match name {
            "start" | "help" => Self::Help,
            "status" => Self::Status,
            "cars" => Self::Cars,
            "s" => Self::Search(args.to_owned()),
            "sparest" => Self::PartsTable,
            "sparesf" => Self::PartsCsv,
            "addcar" => Self::AddCar(args.to_owned()),
            "a" => Self::Acquire(args.to_owned()),
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Error)]
enum CommandError {
    #[error(transparent)]
    Storage(#[from] DbError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CommandError {
    fn user_message(&self) -> String {
        match self {
            Self::Validation(ValidationError::EmptyCarName) => "Please specify valid name".to_owned(),
            Self::Validation(e) => e.to_string(),
            Self::Storage(e) => format!("Storage error: {e}"),
        }
    }
}

/// Everything that can go wrong between receiving a photo and having a code.
#[derive(Debug, Error)]
enum RecognizeError {
    #[error("could not download photo: {0}")]
    Download(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no barcode found")]
    NoBarcode,
}

/// The bot: storage-backed commands plus the acquisition flow.
pub struct Bot<S, P, D> {
    store: Arc<S>,
    presenter: Arc<P>,
    decoder: D,
    acquisition: Acquisition<S, P>,
}

impl<S, P, D> Bot<S, P, D>
where
    S: PartStore,
    P: Presenter + PhotoSource,
    D: BarcodeDecoder,
{
    pub fn new(client: CatalogueClient, store: Arc<S>, presenter: Arc<P>, decoder: D) -> Self {
        let acquisition = Acquisition::new(client, Arc::clone(&store), Arc::clone(&presenter));
        Self {
            store,
            presenter,
            decoder,
            acquisition,
        }
    }

    async fn run_command(&self, user: UserId, command: Command, text: &str) {
        let result = match command {
            Command::Help => {
                self.say(user, HELP_TEXT).await;
                Ok(())
            }
            Command::Status => {
                self.say(user, text).await;
                Ok(())
            }
            Command::Cars => self.show_cars(user).await,
            Command::Search(query) => self.search_parts(user, &query).await,
            Command::PartsTable => self.show_parts(user).await,
            Command::PartsCsv => self.export_parts(user).await,
            Command::AddCar(name) => self.add_car(user, &name).await,
            Command::Acquire(code) => {
                self.acquisition.start(user, &code).await;
                Ok(())
            }
            Command::Unknown => {
                self.say(user, UNKNOWN_TEXT).await;
                Ok(())
            }
        };

        if let Err(error) = result {
            tracing::warn!(user_id = user, error = %error, "command failed");
            self.say(user, &error.user_message()).await;
        }
    }

    async fn show_cars(&self, user: UserId) -> Result<(), CommandError> {
        let mut table = Table::new(&["CarId", "Name"]);
        for car in self.store.list_cars().await? {
            table.push_row(vec![car.id.to_string(), car.name]);
        }
        self.show(user, &table).await;
        Ok(())
    }

    async fn search_parts(&self, user: UserId, query: &str) -> Result<(), CommandError> {
        let mut table = Table::new(&["PartNumber", "Description", "Car"]);
        for part in self.store.search_parts(query).await? {
            let car = part.car_label().to_owned();
            table.push_row(vec![part.part_number, part.name, car]);
        }
        self.show(user, &table).await;
        Ok(())
    }

    async fn show_parts(&self, user: UserId) -> Result<(), CommandError> {
        let mut table = Table::new(&["PartNumber", "Manufacturer", "Description", "Car"]);
        for part in self.store.list_parts().await? {
            let car = part.car_label().to_owned();
            table.push_row(vec![part.part_number, part.manufacturer, part.name, car]);
        }
        self.show(user, &table).await;
        Ok(())
    }

    async fn export_parts(&self, user: UserId) -> Result<(), CommandError> {
        let parts = self.store.list_parts().await?;
        let csv = parts_csv(parts);
        let file_name = Utc::now().format("spares-%Y%m%d-%H%M%S.csv").to_string();
        warn_undelivered(
            user,
            self.presenter
                .send_document(user, &file_name, csv.to_csv().into_bytes())
                .await,
        );
        Ok(())
    }

    async fn add_car(&self, user: UserId, raw_name: &str) -> Result<(), CommandError> {
        let name = normalize_car_name(raw_name)?;
        let car = self.store.add_car(&name).await?;
        self.say(user, &format!("{} added!", car.name)).await;
        Ok(())
    }

    /// Reads the barcode on a photo and starts an acquisition with it. Every
    /// failure on the way is reported as one recognition error.
    async fn recognize(&self, user: UserId, file_id: &str) {
        match self.decode_photo(file_id).await {
            Ok(code) => {
                tracing::info!(user_id = user, code = %code, "barcode recognised");
                self.acquisition.start(user, &code).await;
            }
            Err(error) => {
                tracing::warn!(user_id = user, error = %error, "barcode recognition failed");
                self.say(user, &format!("error during recognizing: {error}"))
                    .await;
            }
        }
    }

    async fn decode_photo(&self, file_id: &str) -> Result<String, RecognizeError> {
        let image = self.presenter.download_photo(file_id).await?;
        self.decoder
            .decode(&image)
            .await?
            .ok_or(RecognizeError::NoBarcode)
    }

    async fn show(&self, user: UserId, table: &Table) {
        warn_undelivered(user, self.presenter.send_table(user, table).await);
    }

    async fn say(&self, user: UserId, text: &str) {
        warn_undelivered(user, self.presenter.send_text(user, text).await);
    }
}

impl<S, P, D> Handler for Bot<S, P, D>
where
    S: PartStore + 'static,
    P: Presenter + PhotoSource + 'static,
    D: BarcodeDecoder + 'static,
{
    async fn handle(&self, event: Inbound) {
        let user = event.user;
        match event.kind {
            InboundKind::Command { name, args, text } => {
                tracing::debug!(user_id = user, command = %name, "command received");
                self.run_command(user, Command::parse(&name, &args), &text)
                    .await;
            }
            InboundKind::Text(_) => self.say(user, UNKNOWN_TEXT).await,
            InboundKind::Callback { payload } => {
                self.acquisition.on_callback(user, &payload).await;
            }
            InboundKind::Photo { file_id } => self.recognize(user, &file_id).await,
        }
    }
}

fn parts_csv(parts: Vec<PartListing>) -> Table {
    let mut table = Table::new(&["PartNumber", "Manufacturer", "Description", "Link", "Car"]);
    for part in parts {
        let car = part.car_label().to_owned();
        table.push_row(vec![
            part.part_number,
            part.manufacturer,
            part.name,
            part.link,
            car,
        ]);
    }
    table
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
