use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::card::{Card, CardDraft};
use crate::model::ids::{CardId, CardSetId};
use crate::progress::progress;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardSetError {
    #[error("card set name cannot be empty")]
    EmptyName,

    #[error("card set must contain at least one card")]
    NoCards,

    #[error("card {0} does not belong to this set")]
    UnknownCard(CardId),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A card set that has not been stored yet.
///
/// Manual creation, generation and deep-link import all produce a draft; the
/// store hands out the identities.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardSetDraft {
    pub name: String,
    pub description: String,
    pub source_text: String,
    pub cards: Vec<CardDraft>,
}

impl CardSetDraft {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        source_text: impl Into<String>,
        cards: Vec<CardDraft>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            source_text: source_text.into(),
            cards,
        }
    }

    /// Checks the rules a user-created set must satisfy.
    ///
    /// Imported drafts skip this: the sender already accepted them.
    ///
    /// # Errors
    ///
    /// Returns `CardSetError::EmptyName` for a blank name and
    /// `CardSetError::NoCards` for a set without cards.
    pub fn validate(mut self) -> Result<Self, CardSetError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(CardSetError::EmptyName);
        }
        if self.cards.is_empty() {
            return Err(CardSetError::NoCards);
        }
        Ok(self)
    }

    /// Turn the draft into a `CardSet`, pulling one fresh id per card.
    pub fn assign_ids(
        self,
        id: CardSetId,
        mut next_card_id: impl FnMut() -> CardId,
        created_at: DateTime<Utc>,
    ) -> CardSet {
        let cards = self
            .cards
            .into_iter()
            .map(|draft| draft.assign_id(next_card_id()))
            .collect();
        CardSet::new(
            id,
            self.name,
            self.description,
            self.source_text,
            cards,
            created_at,
        )
    }
}

//
// ─── CARD SET ──────────────────────────────────────────────────────────────────
//

/// A named collection of cards with an aggregate learned percentage.
///
/// `progress_percent` is derived from the cards and refreshed on every
/// learned-flag change made through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSet {
    id: CardSetId,
    name: String,
    description: String,
    source_text: String,
    progress_percent: u8,
    cards: Vec<Card>,
    created_at: DateTime<Utc>,
}

impl CardSet {
    #[must_use]
    pub fn new(
        id: CardSetId,
        name: impl Into<String>,
        description: impl Into<String>,
        source_text: impl Into<String>,
        cards: Vec<Card>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let progress_percent = progress(&cards);
        Self {
            id,
            name: name.into(),
            description: description.into(),
            source_text: source_text.into(),
            progress_percent,
            cards,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> CardSetId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id() == id)
    }

    #[must_use]
    pub fn learned_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_learned()).count()
    }

    /// Set one card's learned flag and return the refreshed percentage.
    ///
    /// # Errors
    ///
    /// Returns `CardSetError::UnknownCard` if the id is not in this set.
    pub fn apply_learned(&mut self, id: CardId, learned: bool) -> Result<u8, CardSetError> {
        let card = self
            .cards
            .iter_mut()
            .find(|card| card.id() == id)
            .ok_or(CardSetError::UnknownCard(id))?;
        card.set_learned(learned);
        self.progress_percent = progress(&self.cards);
        Ok(self.progress_percent)
    }

    /// Clear every learned flag. Returns the ids that actually changed.
    pub fn reset_learned(&mut self) -> Vec<CardId> {
        let mut changed = Vec::new();
        for card in self.cards.iter_mut().filter(|card| card.is_learned()) {
            card.set_learned(false);
            changed.push(card.id());
        }
        self.progress_percent = progress(&self.cards);
        changed
    }

    #[must_use]
    pub fn to_draft(&self) -> CardSetDraft {
        CardSetDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            source_text: self.source_text.clone(),
            cards: self.cards.iter().map(Card::to_draft).collect(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
