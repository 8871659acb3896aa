use crate::model::Card;

use super::{
    LearnedChange, StudyEngine, StudyError, StudyMode, StudyState, ensure_state, state_after_load,
};

/// Which way the current card was swiped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Not recalled.
    Left,
    /// Recalled.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub change: LearnedChange,
    pub completed: bool,
}

/// Flashcards shown once each in a fixed order.
#[derive(Debug, Clone)]
pub struct SwipeRecall {
    state: StudyState,
    cards: Vec<Card>,
    current_index: usize,
    correct_count: usize,
    incorrect_count: usize,
}

impl SwipeRecall {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: StudyState::Loading,
            cards: Vec::new(),
            current_index: 0,
            correct_count: 0,
            incorrect_count: 0,
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&Card> {
        match self.state {
            StudyState::Active => self.cards.get(self.current_index),
            _ => None,
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Mark the current card and move to the next one.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` unless the session is active.
    pub fn swipe(&mut self, direction: SwipeDirection) -> Result<SwipeOutcome, StudyError> {
        ensure_state(self.state, StudyState::Active)?;
        let Some(card) = self.cards.get_mut(self.current_index) else {
            return Err(StudyError::InvalidState(StudyState::Completed));
        };

        let is_learned = direction == SwipeDirection::Right;
        card.set_learned(is_learned);
        let change = LearnedChange {
            card_id: card.id(),
            is_learned,
        };
        if is_learned {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
        }

        self.current_index += 1;
        if self.current_index == self.cards.len() {
            self.state = StudyState::Completed;
        }

        Ok(SwipeOutcome {
            change,
            completed: self.state == StudyState::Completed,
        })
    }
}

impl Default for SwipeRecall {
    fn default() -> Self {
        Self::new()
    }
}

impl StudyEngine for SwipeRecall {
    fn mode(&self) -> StudyMode {
        StudyMode::Cards
    }

    fn state(&self) -> StudyState {
        self.state
    }

    fn load(&mut self, cards: Vec<Card>) -> Result<StudyState, StudyError> {
        ensure_state(self.state, StudyState::Loading)?;
        self.state = state_after_load(cards.len());
        self.cards = cards;
        Ok(self.state)
    }

    fn original_count(&self) -> usize {
        self.cards.len()
    }

    fn correct_count(&self) -> usize {
        self.correct_count
    }

    fn incorrect_count(&self) -> usize {
        self.incorrect_count
    }
}
