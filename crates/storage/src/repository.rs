use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flashset_core::model::{Card, CardId, CardSet, CardSetDraft, CardSetId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Listing row for a stored set; progress is the last persisted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSetSummary {
    pub id: CardSetId,
    pub name: String,
    pub description: String,
    pub progress_percent: u8,
    pub card_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Repository contract for card sets.
#[async_trait]
pub trait CardSetRepository: Send + Sync {
    /// Store a new set and its cards, assigning fresh ids to all of them.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the set cannot be stored. Nothing is stored on failure.
    async fn create_card_set(
        &self,
        draft: &CardSetDraft,
        created_at: DateTime<Utc>,
    ) -> Result<CardSetId, StoreError>;

    /// Fetch a set with all of its cards.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on adapter failures; a missing set is `Ok(None)`.
    async fn get_card_set(&self, id: CardSetId) -> Result<Option<CardSet>, StoreError>;

    /// List sets ordered by id, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on adapter failures.
    async fn list_card_sets(&self, limit: u32) -> Result<Vec<CardSetSummary>, StoreError>;

    /// Persist the aggregate learned percentage of a set.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the set is missing.
    async fn save_progress(&self, id: CardSetId, percent: u8) -> Result<(), StoreError>;

    /// Remove a set and its cards.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the set is missing.
    async fn delete_card_set(&self, id: CardSetId) -> Result<(), StoreError>;
}

/// Repository contract for the cards of a set.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Cards of a set in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the set is missing.
    async fn load_cards(&self, set_id: CardSetId) -> Result<Vec<Card>, StoreError>;

    /// Persist one card's learned flag.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the card is missing.
    async fn save_learned_flag(&self, card_id: CardId, learned: bool) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct SetRow {
    name: String,
    description: String,
    source_text: String,
    progress_percent: u8,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryState {
    sets: BTreeMap<CardSetId, SetRow>,
    cards: BTreeMap<CardId, (CardSetId, Card)>,
    last_set_id: u64,
    last_card_id: u64,
}

impl MemoryState {
    fn cards_of(&self, set_id: CardSetId) -> Vec<Card> {
        self.cards
            .values()
            .filter(|(owner, _)| *owner == set_id)
            .map(|(_, card)| card.clone())
            .collect()
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CardSetRepository for InMemoryRepository {
    async fn create_card_set(
        &self,
        draft: &CardSetDraft,
        created_at: DateTime<Utc>,
    ) -> Result<CardSetId, StoreError> {
        let mut guard = self.lock()?;
        guard.last_set_id += 1;
        let set_id = CardSetId::new(guard.last_set_id);

        let mut next_card = guard.last_card_id;
        let set = draft.clone().assign_ids(
            set_id,
            || {
                next_card += 1;
                CardId::new(next_card)
            },
            created_at,
        );
        guard.last_card_id = next_card;

        guard.sets.insert(
            set_id,
            SetRow {
                name: set.name().to_owned(),
                description: set.description().to_owned(),
                source_text: set.source_text().to_owned(),
                progress_percent: set.progress_percent(),
                created_at,
            },
        );
        for card in set.cards() {
            guard.cards.insert(card.id(), (set_id, card.clone()));
        }
        Ok(set_id)
    }

    async fn get_card_set(&self, id: CardSetId) -> Result<Option<CardSet>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.sets.get(&id).map(|row| {
            CardSet::new(
                id,
                row.name.clone(),
                row.description.clone(),
                row.source_text.clone(),
                guard.cards_of(id),
                row.created_at,
            )
        }))
    }

    async fn list_card_sets(&self, limit: u32) -> Result<Vec<CardSetSummary>, StoreError> {
        let guard = self.lock()?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        guard
            .sets
            .iter()
            .take(limit)
            .map(|(id, row)| {
                let card_count = guard.cards.values().filter(|(owner, _)| owner == id).count();
                Ok(CardSetSummary {
                    id: *id,
                    name: row.name.clone(),
                    description: row.description.clone(),
                    progress_percent: row.progress_percent,
                    card_count: u32::try_from(card_count)
                        .map_err(|_| StoreError::Serialization("card count overflow".into()))?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn save_progress(&self, id: CardSetId, percent: u8) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let row = guard.sets.get_mut(&id).ok_or(StoreError::NotFound)?;
        row.progress_percent = percent.min(100);
        Ok(())
    }

    async fn delete_card_set(&self, id: CardSetId) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard.sets.remove(&id).ok_or(StoreError::NotFound)?;
        guard.cards.retain(|_, (owner, _)| *owner != id);
        Ok(())
    }
}

#[async_trait]
impl CardRepository for InMemoryRepository {
    async fn load_cards(&self, set_id: CardSetId) -> Result<Vec<Card>, StoreError> {
        let guard = self.lock()?;
        if !guard.sets.contains_key(&set_id) {
            return Err(StoreError::NotFound);
        }
        Ok(guard.cards_of(set_id))
    }

    async fn save_learned_flag(&self, card_id: CardId, learned: bool) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let (_, card) = guard.cards.get_mut(&card_id).ok_or(StoreError::NotFound)?;
        card.set_learned(learned);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub card_sets: Arc<dyn CardSetRepository>,
    pub cards: Arc<dyn CardRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let card_sets: Arc<dyn CardSetRepository> = Arc::new(repo.clone());
        let cards: Arc<dyn CardRepository> = Arc::new(repo);
        Self { card_sets, cards }
    }
}
