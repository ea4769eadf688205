use crate::directory::{Character, CharacterDirectory};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Character,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub origin: Origin,
    pub timestamp: DateTime<Utc>,
}

/// The per-selection chat state. The log is append-only: messages are never
/// edited or removed, and ids increase strictly in creation order.
pub struct Session {
    character: Character,
    log: Vec<Message>,
    next_message_id: u64,
}

impl Session {
    fn new(character: Character) -> Self {
        Self {
            character,
            log: Vec::new(),
            next_message_id: 1,
        }
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn log(&self) -> &[Message] {
        &self.log
    }

    fn append(&mut self, origin: Origin, text: String) {
        let message = Message {
            id: self.next_message_id,
            text,
            origin,
            timestamp: Utc::now(),
        };
        self.next_message_id += 1;
        self.log.push(message);
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("unknown character id: {id}")]
    NotFound { id: String },
}

/// A reply the controller has committed to but not yet delivered. The caller
/// hands it to the scheduler; `generation` identifies the session it belongs
/// to so a late delivery can be recognized as stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReply {
    pub generation: u64,
    pub text: String,
}

/// Owns the directory query, the active session, and the generation counter
/// that invalidates in-flight replies. All mutation entry points of the app
/// go through here; the UI layer only reads state back out.
pub struct ChatController {
    directory: CharacterDirectory,
    query: String,
    session: Option<Session>,
    generation: u64,
}

impl ChatController {
    pub fn new(directory: CharacterDirectory) -> Self {
        Self {
            directory,
            query: String::new(),
            session: None,
            generation: 0,
        }
    }

    pub fn directory(&self) -> &CharacterDirectory {
        &self.directory
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn filtered_characters(&self) -> Vec<&Character> {
        self.directory.filter(&self.query)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Starts a fresh session for `id`. An unknown id leaves the prior state
    /// untouched. Reselecting while a session is live replaces it, and the
    /// generation bump orphans any reply still in flight for the old one.
    pub fn select_character(&mut self, id: &str) -> Result<(), SelectError> {
        let character = self
            .directory
            .get(id)
            .ok_or_else(|| SelectError::NotFound { id: id.to_string() })?
            .clone();

        self.generation += 1;
        debug!(
            "session started: character={} generation={}",
            character.name, self.generation
        );
        self.session = Some(Session::new(character));
        Ok(())
    }

    /// Tears the session down unconditionally. Replies still pending for it
    /// will no longer match the generation and are dropped on delivery.
    pub fn deselect(&mut self) {
        if self.session.take().is_some() {
            self.generation += 1;
            debug!("session discarded: generation={}", self.generation);
        }
    }

    /// Appends the trimmed user message synchronously and returns the reply
    /// to be delivered after the scheduler's delay. Whitespace-only input is
    /// a no-op, as is calling this with no session active.
    pub fn submit_message(&mut self, text: &str) -> Option<ScheduledReply> {
        let session = self.session.as_mut()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        session.append(Origin::User, trimmed.to_string());
        Some(ScheduledReply {
            generation: self.generation,
            text: reply_text(session.character()),
        })
    }

    /// Delivery side of the deferred reply. A generation mismatch means the
    /// session the reply was scheduled for is gone; the reply is dropped
    /// without touching whatever session is live now.
    pub fn apply_reply(&mut self, generation: u64, text: String) {
        if generation != self.generation {
            debug!(
                "stale reply dropped: scheduled for generation {generation}, current {}",
                self.generation
            );
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.append(Origin::Character, text);
    }

    #[cfg(test)]
    fn generation(&self) -> u64 {
        self.generation
    }
}

/// The simulated responder: a fixed template over the character's own
/// profile, so the same character always produces the same reply.
pub fn reply_text(character: &Character) -> String {
    format!(
        "Привет! Я {}. {}. Я запомню наш разговор и буду развиваться в процессе общения.",
        character.name, character.description
    )
}
