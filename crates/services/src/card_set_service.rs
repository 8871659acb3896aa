use std::sync::Arc;
use std::time::Duration;

use flashset_core::model::{CardDraft, CardSet, CardSetDraft, CardSetId};
use flashset_core::{Clock, SetCodec};
use storage::repository::{CardRepository, CardSetRepository, CardSetSummary, StoreError};

use crate::error::CardSetServiceError;
use crate::generator::{Generator, generate_with_timeout};

/// Creates, shares and manages stored card sets.
#[derive(Clone)]
pub struct CardSetService {
    clock: Clock,
    card_sets: Arc<dyn CardSetRepository>,
    cards: Arc<dyn CardRepository>,
    codec: SetCodec,
}

impl CardSetService {
    #[must_use]
    pub fn new(
        clock: Clock,
        card_sets: Arc<dyn CardSetRepository>,
        cards: Arc<dyn CardRepository>,
    ) -> Self {
        Self {
            clock,
            card_sets,
            cards,
            codec: SetCodec::default(),
        }
    }

    #[must_use]
    pub fn with_codec(mut self, codec: SetCodec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn codec(&self) -> &SetCodec {
        &self.codec
    }

    /// Validate and store a user-built set.
    ///
    /// # Errors
    ///
    /// Returns `CardSetServiceError::CardSet` for a blank name or no cards.
    /// Returns `CardSetServiceError::Storage` if persistence fails.
    pub async fn create_set(&self, draft: CardSetDraft) -> Result<CardSetId, CardSetServiceError> {
        let draft = draft.validate()?;
        let id = self
            .card_sets
            .create_card_set(&draft, self.clock.now())
            .await?;
        tracing::info!(set_id = %id, cards = draft.cards.len(), "created card set");
        Ok(id)
    }

    /// Generate cards from `source_text` and store them as a new set.
    ///
    /// Nothing is stored when generation fails, times out, or yields no cards.
    ///
    /// # Errors
    ///
    /// Returns `CardSetServiceError::Generator` for generation failures and
    /// the errors of [`Self::create_set`].
    pub async fn create_from_text(
        &self,
        generator: &dyn Generator,
        name: &str,
        description: &str,
        source_text: &str,
        timeout: Duration,
    ) -> Result<CardSetId, CardSetServiceError> {
        let generated = generate_with_timeout(generator, source_text, timeout).await?;
        let cards: Vec<CardDraft> = generated.into_iter().map(CardDraft::from).collect();
        self.create_set(CardSetDraft::new(name, description, source_text, cards))
            .await
    }

    /// Store the set carried by a deep link, with fresh ids and no learned cards.
    ///
    /// # Errors
    ///
    /// Returns `CardSetServiceError::Codec` if the link cannot be decoded;
    /// nothing is stored in that case.
    pub async fn import_link(&self, link: &str) -> Result<CardSetId, CardSetServiceError> {
        let draft = self.codec.import_link(link)?;
        let id = self
            .card_sets
            .create_card_set(&draft, self.clock.now())
            .await?;
        tracing::info!(set_id = %id, cards = draft.cards.len(), "imported card set");
        Ok(id)
    }

    /// Build the deep link for a stored set.
    ///
    /// # Errors
    ///
    /// Returns `CardSetServiceError::Storage` with `StoreError::NotFound` for
    /// a missing set, or `CardSetServiceError::Codec` if encoding fails.
    pub async fn export_link(&self, id: CardSetId) -> Result<String, CardSetServiceError> {
        let set = self
            .card_sets
            .get_card_set(id)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(self.codec.export_set(&set)?)
    }

    /// List sets ordered by id, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `CardSetServiceError::Storage` if repository access fails.
    pub async fn list_sets(&self, limit: u32) -> Result<Vec<CardSetSummary>, CardSetServiceError> {
        Ok(self.card_sets.list_card_sets(limit).await?)
    }

    /// Fetch a set with its cards.
    ///
    /// Returns `Ok(None)` when the set does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CardSetServiceError::Storage` if repository access fails.
    pub async fn get_set(&self, id: CardSetId) -> Result<Option<CardSet>, CardSetServiceError> {
        Ok(self.card_sets.get_card_set(id).await?)
    }

    /// # Errors
    ///
    /// Returns `CardSetServiceError::Storage` if the set is missing or cannot
    /// be removed.
    pub async fn delete_set(&self, id: CardSetId) -> Result<(), CardSetServiceError> {
        self.card_sets.delete_card_set(id).await?;
        tracing::info!(set_id = %id, "deleted card set");
        Ok(())
    }

    /// Clear every learned flag of a set and store progress 0.
    ///
    /// # Errors
    ///
    /// Returns `CardSetServiceError::Storage` if the set is missing or a write
    /// fails.
    pub async fn reset_progress(&self, id: CardSetId) -> Result<CardSet, CardSetServiceError> {
        let mut set = self
            .card_sets
            .get_card_set(id)
            .await?
            .ok_or(StoreError::NotFound)?;
        for card_id in set.reset_learned() {
            self.cards.save_learned_flag(card_id, false).await?;
        }
        self.card_sets
            .save_progress(id, set.progress_percent())
            .await?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashset_core::model::CardSetError;
    use flashset_core::time::fixed_clock;
    use storage::repository::Storage;

    fn service(storage: &Storage) -> CardSetService {
        CardSetService::new(
            fixed_clock(),
            Arc::clone(&storage.card_sets),
            Arc::clone(&storage.cards),
        )
    }

    fn capitals() -> CardSetDraft {
        CardSetDraft::new(
            "  Capitals ",
            "Europe",
            "notes",
            vec![CardDraft::new("France", "Paris"), CardDraft::new("Italy", "Rome")],
        )
    }

    #[tokio::test]
    async fn create_trims_name_and_rejects_empty_sets() {
        let storage = Storage::in_memory();
        let svc = service(&storage);
        let id = svc.create_set(capitals()).await.unwrap();
        let set = svc.get_set(id).await.unwrap().unwrap();
        assert_eq!(set.name(), "Capitals");
        assert_eq!(set.cards().len(), 2);

        let err = svc
            .create_set(CardSetDraft::new("Empty", "", "", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CardSetServiceError::CardSet(CardSetError::NoCards)
        ));
        assert_eq!(svc.list_sets(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn exported_link_imports_as_a_fresh_set() {
        let storage = Storage::in_memory();
        let svc = service(&storage);
        let original = svc.create_set(capitals()).await.unwrap();
        let link = svc.export_link(original).await.unwrap();
        assert!(link.starts_with("myapp://createSet?d="));

        let imported = svc.import_link(&link).await.unwrap();
        assert_ne!(imported, original);
        let a = svc.get_set(original).await.unwrap().unwrap();
        let b = svc.get_set(imported).await.unwrap().unwrap();
        assert_eq!(a.to_draft(), b.to_draft());
        assert!(
            a.cards()
                .iter()
                .all(|card| b.cards().iter().all(|other| other.id() != card.id()))
        );
    }

    #[tokio::test]
    async fn bad_link_stores_nothing() {
        let storage = Storage::in_memory();
        let svc = service(&storage);
        let err = svc
            .import_link("myapp://createSet?d=%%%not-base64")
            .await
            .unwrap_err();
        assert!(matches!(err, CardSetServiceError::Codec(_)));
        assert!(svc.list_sets(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_flags_in_store() {
        let storage = Storage::in_memory();
        let svc = service(&storage);
        let id = svc.create_set(capitals()).await.unwrap();
        let set = svc.get_set(id).await.unwrap().unwrap();
        for card in set.cards() {
            storage.cards.save_learned_flag(card.id(), true).await.unwrap();
        }
        storage.card_sets.save_progress(id, 100).await.unwrap();

        let reset = svc.reset_progress(id).await.unwrap();
        assert_eq!(reset.progress_percent(), 0);
        let stored = svc.get_set(id).await.unwrap().unwrap();
        assert_eq!(stored.learned_count(), 0);
        assert_eq!(svc.list_sets(10).await.unwrap()[0].progress_percent, 0);
    }

    #[tokio::test]
    async fn export_and_delete_of_missing_set_fail() {
        let storage = Storage::in_memory();
        let svc = service(&storage);
        assert!(matches!(
            svc.export_link(CardSetId::new(3)).await,
            Err(CardSetServiceError::Storage(StoreError::NotFound))
        ));
        assert!(matches!(
            svc.delete_set(CardSetId::new(3)).await,
            Err(CardSetServiceError::Storage(StoreError::NotFound))
        ));
    }
}
