use std::sync::Arc;

use flashset_core::model::{CardId, CardSet, CardSetId};
use flashset_core::modes::{
    LearnedChange, MatchOutcome, MemorizationOutcome, QuizOutcome, StudyMode, SwipeDirection,
    SwipeOutcome,
};
use storage::repository::{CardRepository, CardSetRepository, StoreError};

use super::session::{SessionEngine, StudySession};
use crate::error::StudyServiceError;

/// Result of one study action after write-through.
///
/// `store_error` is set when persisting failed; the in-memory set keeps the
/// change either way.
#[derive(Debug)]
pub struct ActionReport<O> {
    pub outcome: O,
    pub progress_percent: u8,
    pub completed: bool,
    pub store_error: Option<StoreError>,
}

/// Starts study sessions and persists every learned-flag change they make.
#[derive(Clone)]
pub struct StudyLoopService {
    card_sets: Arc<dyn CardSetRepository>,
    cards: Arc<dyn CardRepository>,
    seed: Option<u64>,
}

impl StudyLoopService {
    #[must_use]
    pub fn new(card_sets: Arc<dyn CardSetRepository>, cards: Arc<dyn CardRepository>) -> Self {
        Self {
            card_sets,
            cards,
            seed: None,
        }
    }

    /// Seed the shuffles of new sessions, for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load a set and its cards and enter `mode`.
    ///
    /// A set without cards yields a session that is already completed.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::Storage` if the set is missing or cannot be
    /// loaded.
    pub async fn start_session(
        &self,
        set_id: CardSetId,
        mode: StudyMode,
    ) -> Result<StudySession, StudyServiceError> {
        let set = self
            .card_sets
            .get_card_set(set_id)
            .await?
            .ok_or(StoreError::NotFound)?;
        let cards = self.cards.load_cards(set_id).await?;

        let mut engine = SessionEngine::new(mode, self.seed);
        let state = engine.load(cards)?;
        tracing::debug!(set_id = %set_id, %mode, %state, "study session started");

        Ok(StudySession::new(set, engine))
    }

    /// Swipe the current card in `Cards` mode.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::WrongMode` for another mode and
    /// `StudyServiceError::Study` if the engine rejects the action.
    pub async fn swipe(
        &self,
        session: &mut StudySession,
        direction: SwipeDirection,
    ) -> Result<ActionReport<SwipeOutcome>, StudyServiceError> {
        let actual = session.mode();
        let (set, engine) = session.parts_mut();
        let SessionEngine::Cards(engine) = engine else {
            return Err(wrong_mode(StudyMode::Cards, actual));
        };

        let outcome = engine.swipe(direction)?;
        let store_error = self.write_through(set, outcome.change).await?;
        Ok(report(outcome, session, store_error))
    }

    /// Pick one of the offered options in `Memorization` mode.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::WrongMode` for another mode and
    /// `StudyServiceError::Study` if the engine rejects the action.
    pub async fn select_option(
        &self,
        session: &mut StudySession,
        option: &str,
    ) -> Result<ActionReport<MemorizationOutcome>, StudyServiceError> {
        let actual = session.mode();
        let (set, engine) = session.parts_mut();
        let SessionEngine::Memorization(engine) = engine else {
            return Err(wrong_mode(StudyMode::Memorization, actual));
        };

        let outcome = engine.select(option)?;
        let store_error = self.write_through(set, outcome.change).await?;
        Ok(report(outcome, session, store_error))
    }

    /// Pick a card from the question deck in `Selection` mode.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::WrongMode` for another mode and
    /// `StudyServiceError::Study` if the engine rejects the pick.
    pub async fn select_question(
        &self,
        session: &mut StudySession,
        card_id: CardId,
    ) -> Result<ActionReport<Option<MatchOutcome>>, StudyServiceError> {
        self.select_pair_side(session, card_id, Side::Question).await
    }

    /// Pick a card from the answer deck in `Selection` mode.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::WrongMode` for another mode and
    /// `StudyServiceError::Study` if the engine rejects the pick.
    pub async fn select_answer(
        &self,
        session: &mut StudySession,
        card_id: CardId,
    ) -> Result<ActionReport<Option<MatchOutcome>>, StudyServiceError> {
        self.select_pair_side(session, card_id, Side::Answer).await
    }

    /// Check a typed answer in `Test` mode.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::WrongMode` for another mode and
    /// `StudyServiceError::Study` if the engine rejects the action.
    pub async fn check_answer(
        &self,
        session: &mut StudySession,
        input: &str,
    ) -> Result<ActionReport<QuizOutcome>, StudyServiceError> {
        let actual = session.mode();
        let (set, engine) = session.parts_mut();
        let SessionEngine::Test(engine) = engine else {
            return Err(wrong_mode(StudyMode::Test, actual));
        };

        let outcome = engine.check(input)?;
        let store_error = self.write_through(set, outcome.change).await?;
        Ok(report(outcome, session, store_error))
    }

    async fn select_pair_side(
        &self,
        session: &mut StudySession,
        card_id: CardId,
        side: Side,
    ) -> Result<ActionReport<Option<MatchOutcome>>, StudyServiceError> {
        let actual = session.mode();
        let (set, engine) = session.parts_mut();
        let SessionEngine::Selection(engine) = engine else {
            return Err(wrong_mode(StudyMode::Selection, actual));
        };

        let outcome = match side {
            Side::Question => engine.select_question(card_id)?,
            Side::Answer => engine.select_answer(card_id)?,
        };
        let store_error = match outcome {
            Some(MatchOutcome::Matched { change, .. }) => self.write_through(set, change).await?,
            _ => None,
        };
        Ok(report(outcome, session, store_error))
    }

    /// Apply `change` to the set, then persist the flag and the new percentage.
    ///
    /// Store failures are logged and returned as a value; the set is not
    /// rolled back.
    async fn write_through(
        &self,
        set: &mut CardSet,
        change: LearnedChange,
    ) -> Result<Option<StoreError>, StudyServiceError> {
        let percent = set.apply_learned(change.card_id, change.is_learned)?;
        match self.persist(set.id(), change, percent).await {
            Ok(()) => Ok(None),
            Err(err) => {
                tracing::warn!(
                    set_id = %set.id(),
                    card_id = %change.card_id,
                    error = %err,
                    "failed to persist learned flag"
                );
                Ok(Some(err))
            }
        }
    }

    async fn persist(
        &self,
        set_id: CardSetId,
        change: LearnedChange,
        percent: u8,
    ) -> Result<(), StoreError> {
        self.cards
            .save_learned_flag(change.card_id, change.is_learned)
            .await?;
        self.card_sets.save_progress(set_id, percent).await
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Question,
    Answer,
}

fn wrong_mode(expected: StudyMode, actual: StudyMode) -> StudyServiceError {
    StudyServiceError::WrongMode { expected, actual }
}

fn report<O>(
    outcome: O,
    session: &StudySession,
    store_error: Option<StoreError>,
) -> ActionReport<O> {
    let completed = session.is_complete();
    if completed {
        tracing::debug!(set_id = %session.set_id(), mode = %session.mode(), "study session completed");
    }
    ActionReport {
        outcome,
        progress_percent: session.progress_percent(),
        completed,
        store_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashset_core::model::{CardDraft, CardSetDraft};
    use flashset_core::modes::StudyState;
    use flashset_core::time::fixed_now;
    use storage::repository::Storage;

    async fn seeded(pairs: &[(&str, &str)]) -> (Storage, CardSetId) {
        let storage = Storage::in_memory();
        let draft = CardSetDraft::new(
            "Math",
            "",
            "",
            pairs.iter().map(|(q, a)| CardDraft::new(*q, *a)).collect(),
        );
        let id = storage
            .card_sets
            .create_card_set(&draft, fixed_now())
            .await
            .unwrap();
        (storage, id)
    }

    fn service(storage: &Storage) -> StudyLoopService {
        StudyLoopService::new(Arc::clone(&storage.card_sets), Arc::clone(&storage.cards))
            .with_seed(7)
    }

    #[tokio::test]
    async fn swipes_write_flags_and_progress_through() {
        let (storage, id) = seeded(&[("2+2", "4"), ("3+3", "6")]).await;
        let loop_service = service(&storage);
        let mut session = loop_service.start_session(id, StudyMode::Cards).await.unwrap();
        assert_eq!(session.state(), StudyState::Active);

        let first = loop_service
            .swipe(&mut session, SwipeDirection::Right)
            .await
            .unwrap();
        assert_eq!(first.progress_percent, 50);
        assert!(first.store_error.is_none());
        assert!(!first.completed);

        let second = loop_service
            .swipe(&mut session, SwipeDirection::Left)
            .await
            .unwrap();
        assert_eq!(second.progress_percent, 50);
        assert!(second.completed);

        let stored = storage.card_sets.get_card_set(id).await.unwrap().unwrap();
        assert_eq!(stored.progress_percent(), 50);
        assert_eq!(stored.learned_count(), 1);
        let listed = storage.card_sets.list_card_sets(10).await.unwrap();
        assert_eq!(listed[0].progress_percent, 50);
    }

    #[tokio::test]
    async fn action_for_another_mode_is_rejected() {
        let (storage, id) = seeded(&[("q", "a")]).await;
        let loop_service = service(&storage);
        let mut session = loop_service.start_session(id, StudyMode::Test).await.unwrap();

        let err = loop_service
            .swipe(&mut session, SwipeDirection::Right)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudyServiceError::WrongMode {
                expected: StudyMode::Cards,
                actual: StudyMode::Test
            }
        ));
    }

    #[tokio::test]
    async fn mismatched_pair_leaves_store_untouched() {
        let (storage, id) = seeded(&[("a", "1"), ("b", "2")]).await;
        let loop_service = service(&storage);
        let mut session = loop_service
            .start_session(id, StudyMode::Selection)
            .await
            .unwrap();
        let ids: Vec<CardId> = session.set().cards().iter().map(|c| c.id()).collect();

        loop_service
            .select_question(&mut session, ids[0])
            .await
            .unwrap();
        let report = loop_service
            .select_answer(&mut session, ids[1])
            .await
            .unwrap();
        assert!(matches!(report.outcome, Some(MatchOutcome::Mismatched { .. })));
        assert_eq!(report.progress_percent, 0);

        let report = loop_service
            .select_answer(&mut session, ids[0])
            .await
            .unwrap();
        assert!(report.outcome.is_none());
        let report = loop_service
            .select_question(&mut session, ids[0])
            .await
            .unwrap();
        assert!(matches!(report.outcome, Some(MatchOutcome::Matched { .. })));
        assert_eq!(report.progress_percent, 50);
    }

    #[tokio::test]
    async fn quiz_answers_update_the_set() {
        let (storage, id) = seeded(&[("France", "Paris"), ("Japan", "Tokyo")]).await;
        let loop_service = service(&storage);
        let mut session = loop_service.start_session(id, StudyMode::Test).await.unwrap();

        let first = loop_service
            .check_answer(&mut session, " PARIS ")
            .await
            .unwrap();
        assert!(first.outcome.correct);
        let second = loop_service
            .check_answer(&mut session, "Kyoto")
            .await
            .unwrap();
        assert_eq!(second.outcome.expected.as_deref(), Some("Tokyo"));
        assert!(second.completed);
        assert_eq!(session.progress_percent(), 50);
    }

    #[tokio::test]
    async fn missing_set_is_not_found() {
        let storage = Storage::in_memory();
        let err = service(&storage)
            .start_session(CardSetId::new(9), StudyMode::Cards)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudyServiceError::Storage(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn empty_set_starts_completed() {
        let (storage, id) = seeded(&[]).await;
        let session = service(&storage)
            .start_session(id, StudyMode::Memorization)
            .await
            .unwrap();
        assert!(session.is_complete());
        assert_eq!(session.progress_percent(), 0);
    }
}
