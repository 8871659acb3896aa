//! Study-mode state machines.
//!
//! Every mode walks `Loading → Active → Completed`. An engine works on its own
//! copy of the cards; each learned-flag change it makes is handed back as a
//! [`LearnedChange`] so the caller can apply it to the owning set.

mod cards;
mod memorization;
mod quiz;
mod selection;

use std::fmt;

use thiserror::Error;

use crate::model::{Card, CardId};

pub use cards::{SwipeDirection, SwipeOutcome, SwipeRecall};
pub use memorization::{Memorization, MemorizationOutcome};
pub use quiz::{FreeTextQuiz, QuizOutcome, answers_match};
pub use selection::{MatchOutcome, MatchingPairs};

/// Lifecycle shared by all study modes. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudyState {
    Loading,
    Active,
    Completed,
}

impl StudyState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyState::Loading => "loading",
            StudyState::Active => "active",
            StudyState::Completed => "completed",
        }
    }
}

impl fmt::Display for StudyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four ways a set can be studied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudyMode {
    /// Swipe-recall flashcards.
    Cards,
    /// Multiple choice with requeue of misses.
    Memorization,
    /// Matching questions to answers.
    Selection,
    /// Typed answers.
    Test,
}

impl StudyMode {
    pub const ALL: [StudyMode; 4] = [
        StudyMode::Cards,
        StudyMode::Memorization,
        StudyMode::Selection,
        StudyMode::Test,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyMode::Cards => "cards",
            StudyMode::Memorization => "memorization",
            StudyMode::Selection => "selection",
            StudyMode::Test => "test",
        }
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudyError {
    #[error("action not allowed while the session is {0}")]
    InvalidState(StudyState),

    #[error("card {0} is not in the working deck")]
    UnknownCard(CardId),
}

/// A learned-flag flip made by an engine on its working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnedChange {
    pub card_id: CardId,
    pub is_learned: bool,
}

/// Surface every engine offers to the orchestrator.
pub trait StudyEngine {
    fn mode(&self) -> StudyMode;

    fn state(&self) -> StudyState;

    /// Move from `Loading` to `Active`, or straight to `Completed` when
    /// `cards` is empty.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` if cards were already loaded.
    fn load(&mut self, cards: Vec<Card>) -> Result<StudyState, StudyError>;

    /// Number of cards the run started with.
    fn original_count(&self) -> usize;

    fn correct_count(&self) -> usize;

    fn incorrect_count(&self) -> usize;

    fn is_complete(&self) -> bool {
        self.state() == StudyState::Completed
    }
}

pub(crate) fn ensure_state(current: StudyState, expected: StudyState) -> Result<(), StudyError> {
    if current == expected {
        Ok(())
    } else {
        Err(StudyError::InvalidState(current))
    }
}

pub(crate) fn state_after_load(cards_len: usize) -> StudyState {
    if cards_len == 0 {
        StudyState::Completed
    } else {
        StudyState::Active
    }
}
