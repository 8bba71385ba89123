//! Interactive part acquisition: part code → catalogue page → car → stored part.
//!
//! Every transition has a local failure path: the error is reported to the
//! user and that user's state goes back to `Idle`.

use std::sync::Arc;

use thiserror::Error;

use garage_core::{NewPart, PartCandidate, ValidationError, NO_CAR_LABEL};
use garage_db::DbError;
use garage_scraper::{
    is_selection_page, parse_part_page, parse_selection_page, CatalogueClient, FetchError,
    ParseError,
};

use crate::present::{warn_undelivered, Choice, Presenter};
use crate::session::{ConversationState, SessionStore, UserId};
use crate::store::PartStore;

const CATALOGUE_PROMPT: &str = "Select catalogue: ";
const CAR_PROMPT: &str = "Select car: ";

/// Payload of the synthetic "no car" choice.
pub const NO_CAR_PAYLOAD: &str = "0";

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] DbError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("selection page for {code} lists no catalogues")]
    NoCatalogues { code: String },

    #[error("callback payload {0:?} is not a car id")]
    InvalidCarChoice(String),
}

impl AcquireError {
    /// Text shown to the user when an acquisition is abandoned.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch(e) => format!("Error fetching catalogue page: {e}. Please try again."),
            Self::Parse(_) => "Error parsing html. Wrong partnum?".to_owned(),
            Self::Storage(e) => format!("Error saving part: {e}"),
            Self::Validation(ValidationError::EmptyPartCode) => {
                "Please specify part number: /a <part number>".to_owned()
            }
            Self::Validation(e) => e.to_string(),
            Self::NoCatalogues { code } => format!("No catalogues found for {code}"),
            Self::InvalidCarChoice(_) => {
                "Unknown car choice, start again with /a <part number>".to_owned()
            }
        }
    }
}

/// Drives each user's acquisition conversation.
pub struct Acquisition<S, P> {
    client: CatalogueClient,
    store: Arc<S>,
    presenter: Arc<P>,
    sessions: SessionStore,
}

impl<S: PartStore, P: Presenter> Acquisition<S, P> {
    pub fn new(client: CatalogueClient, store: Arc<S>, presenter: Arc<P>) -> Self {
        Self {
            client,
            store,
            presenter,
            sessions: SessionStore::new(),
        }
    }

    /// Current state of `user`'s conversation.
    #[cfg(test)]
    pub fn state(&self, user: UserId) -> ConversationState {
        self.sessions.get(user)
    }

    /// Entry point for `/a <code>` and for decoded barcodes. Any earlier
    /// unfinished acquisition of this user is abandoned.
    pub async fn start(&self, user: UserId, code: &str) {
        if let Err(error) = self.try_start(user, code).await {
            self.abandon(user, &error).await;
        }
    }

    /// Handles a button press from `user`.
    pub async fn on_callback(&self, user: UserId, payload: &str) {
        if let Err(error) = self.try_callback(user, payload).await {
            self.abandon(user, &error).await;
        }
    }

    async fn try_start(&self, user: UserId, code: &str) -> Result<(), AcquireError> {
        self.sessions.reset(user);

        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::EmptyPartCode.into());
        }

        let url = self.client.code_to_url(code)?;
        let html = self.client.fetch(&url).await?;

        if !is_selection_page(&html) {
            let candidate = parse_part_page(&html)?;
            return self.offer_cars(user, url, candidate).await;
        }

        let options = parse_selection_page(&html, self.client.base_url());
        if options.is_empty() {
            return Err(AcquireError::NoCatalogues {
                code: code.to_owned(),
            });
        }
        tracing::debug!(user_id = user, code, options = options.len(), "catalogue selection offered");

        let choices: Vec<Choice> = options
            .iter()
            .map(|option| Choice::new(option.label(), option.url.clone()))
            .collect();
        self.sessions.set(
            user,
            ConversationState::AwaitingCatalogueChoice {
                last_fetch_was_root: true,
            },
        );
        warn_undelivered(
            user,
            self.presenter
                .present_choices(user, CATALOGUE_PROMPT, &choices)
                .await,
        );
        Ok(())
    }

    async fn try_callback(&self, user: UserId, payload: &str) -> Result<(), AcquireError> {
        match self.sessions.take(user) {
            ConversationState::Idle => {
                tracing::debug!(user_id = user, payload, "callback without pending acquisition ignored");
                Ok(())
            }
            ConversationState::AwaitingCatalogueChoice {
                last_fetch_was_root,
            } => {
                tracing::debug!(user_id = user, url = payload, last_fetch_was_root, "catalogue chosen");
                let html = self.client.fetch(payload).await?;
                let candidate = parse_part_page(&html)?;
                self.offer_cars(user, payload.to_owned(), candidate).await
            }
            ConversationState::AwaitingCarChoice {
                source_url,
                candidate,
            } => self.commit(user, payload, &source_url, &candidate).await,
        }
    }

    async fn offer_cars(
        &self,
        user: UserId,
        source_url: String,
        candidate: PartCandidate,
    ) -> Result<(), AcquireError> {
        let cars = self.store.list_cars().await?;
        let mut choices: Vec<Choice> = cars
            .into_iter()
            .map(|car| Choice::new(car.name, car.id.to_string()))
            .collect();
        choices.push(Choice::new(NO_CAR_LABEL, NO_CAR_PAYLOAD));

        tracing::debug!(
            user_id = user,
            part_number = %candidate.part_number,
            url = %source_url,
            "part recognised, awaiting car"
        );
        self.sessions.set(
            user,
            ConversationState::AwaitingCarChoice {
                source_url,
                candidate,
            },
        );
        warn_undelivered(
            user,
            self.presenter.present_choices(user, CAR_PROMPT, &choices).await,
        );
        Ok(())
    }

    async fn commit(
        &self,
        user: UserId,
        payload: &str,
        source_url: &str,
        candidate: &PartCandidate,
    ) -> Result<(), AcquireError> {
        let car_id = parse_car_choice(payload)?;
        let part = NewPart::from_candidate(candidate, source_url, car_id);
        let record = self.store.add_part(&part).await?;

        let confirmation = format!(
            "{} {} \"{}\" added!",
            record.part_number, candidate.catalogue_name, record.name
        );
        warn_undelivered(user, self.presenter.send_text(user, &confirmation).await);
        Ok(())
    }

    async fn abandon(&self, user: UserId, error: &AcquireError) {
        self.sessions.reset(user);
        tracing::warn!(user_id = user, error = %error, "acquisition abandoned");
        warn_undelivered(
            user,
            self.presenter.send_text(user, &error.user_message()).await,
        );
    }
}

/// Reads a car-choice payload: a car id, or [`NO_CAR_PAYLOAD`] for none.
fn parse_car_choice(payload: &str) -> Result<Option<i64>, AcquireError> {
    match payload.trim().parse::<i64>() {
        Ok(0) => Ok(None),
        Ok(id) if id > 0 => Ok(Some(id)),
        _ => Err(AcquireError::InvalidCarChoice(payload.to_owned())),
    }
}

#[cfg(test)]
#[path = "acquisition_test.rs"]
mod tests;
