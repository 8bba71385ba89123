//! Per-user conversation state for the part acquisition flow.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use garage_core::PartCandidate;

/// Chat user the bot is talking to.
pub type UserId = i64;

/// Where a user is in the acquisition flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    /// Catalogue buttons are on screen; the chosen URL is fetched fresh.
    AwaitingCatalogueChoice { last_fetch_was_root: bool },
    /// Car buttons are on screen for a parsed part.
    AwaitingCarChoice {
        source_url: String,
        candidate: PartCandidate,
    },
}

/// Conversation state keyed by user; users without an entry are `Idle`.
///
/// The lock is never held across an await: callers read or swap a state and
/// release it before doing any I/O.
#[derive(Debug, Default)]
pub struct SessionStore {
    states: Mutex<HashMap<UserId, ConversationState>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn get(&self, user: UserId) -> ConversationState {
        self.lock().get(&user).cloned().unwrap_or_default()
    }

    pub fn set(&self, user: UserId, state: ConversationState) {
        let mut states = self.lock();
        if state == ConversationState::Idle {
            states.remove(&user);
        } else {
            states.insert(user, state);
        }
    }

    /// Removes and returns the user's state, leaving them `Idle`.
    pub fn take(&self, user: UserId) -> ConversationState {
        self.lock().remove(&user).unwrap_or_default()
    }

    pub fn reset(&self, user: UserId) {
        self.lock().remove(&user);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, ConversationState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
