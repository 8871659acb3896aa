use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::model::{Card, CardId};
use crate::progress::ratio;

use super::{
    LearnedChange, StudyEngine, StudyError, StudyMode, StudyState, ensure_state, state_after_load,
};

/// Result of evaluating a question/answer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched {
        change: LearnedChange,
        completed: bool,
    },
    Mismatched {
        question: CardId,
        answer: CardId,
    },
}

/// Two independently shuffled decks of the same cards; the user pairs a
/// question with its answer.
///
/// Pairs are compared by card id, never by text. Matched cards leave both
/// decks, so the decks always have the same length.
#[derive(Debug, Clone)]
pub struct MatchingPairs {
    state: StudyState,
    questions: Vec<Card>,
    answers: Vec<Card>,
    pending_question: Option<CardId>,
    pending_answer: Option<CardId>,
    original_count: usize,
    correct_count: usize,
    incorrect_count: usize,
    rng: StdRng,
}

impl MatchingPairs {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    #[must_use]
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: StudyState::Loading,
            questions: Vec::new(),
            answers: Vec::new(),
            pending_question: None,
            pending_answer: None,
            original_count: 0,
            correct_count: 0,
            incorrect_count: 0,
            rng,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Card] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Card] {
        &self.answers
    }

    #[must_use]
    pub fn pending_question(&self) -> Option<CardId> {
        self.pending_question
    }

    #[must_use]
    pub fn pending_answer(&self) -> Option<CardId> {
        self.pending_answer
    }

    #[must_use]
    pub fn progress_ratio(&self) -> f64 {
        ratio(self.correct_count, self.original_count)
    }

    /// Pick a card from the question deck. Replaces an earlier pending pick.
    ///
    /// Returns `Some` once an answer is also pending and the pair was judged.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` unless active, or
    /// `StudyError::UnknownCard` if the card is not in the question deck.
    pub fn select_question(&mut self, id: CardId) -> Result<Option<MatchOutcome>, StudyError> {
        ensure_state(self.state, StudyState::Active)?;
        if !self.questions.iter().any(|card| card.id() == id) {
            return Err(StudyError::UnknownCard(id));
        }
        self.pending_question = Some(id);
        Ok(self.evaluate())
    }

    /// Pick a card from the answer deck. Replaces an earlier pending pick.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` unless active, or
    /// `StudyError::UnknownCard` if the card is not in the answer deck.
    pub fn select_answer(&mut self, id: CardId) -> Result<Option<MatchOutcome>, StudyError> {
        ensure_state(self.state, StudyState::Active)?;
        if !self.answers.iter().any(|card| card.id() == id) {
            return Err(StudyError::UnknownCard(id));
        }
        self.pending_answer = Some(id);
        Ok(self.evaluate())
    }

    fn evaluate(&mut self) -> Option<MatchOutcome> {
        let (question, answer) = (self.pending_question?, self.pending_answer?);
        self.pending_question = None;
        self.pending_answer = None;

        if question != answer {
            self.incorrect_count += 1;
            return Some(MatchOutcome::Mismatched { question, answer });
        }

        self.questions.retain(|card| card.id() != question);
        self.answers.retain(|card| card.id() != question);
        self.correct_count += 1;
        if self.questions.is_empty() && self.answers.is_empty() {
            self.state = StudyState::Completed;
        }

        Some(MatchOutcome::Matched {
            change: LearnedChange {
                card_id: question,
                is_learned: true,
            },
            completed: self.state == StudyState::Completed,
        })
    }
}

impl Default for MatchingPairs {
    fn default() -> Self {
        Self::new()
    }
}

impl StudyEngine for MatchingPairs {
    fn mode(&self) -> StudyMode {
        StudyMode::Selection
    }

    fn state(&self) -> StudyState {
        self.state
    }

    fn load(&mut self, cards: Vec<Card>) -> Result<StudyState, StudyError> {
        ensure_state(self.state, StudyState::Loading)?;
        let mut questions = cards.clone();
        let mut answers = cards;
        questions.shuffle(&mut self.rng);
        answers.shuffle(&mut self.rng);
        self.original_count = questions.len();
        self.questions = questions;
        self.answers = answers;
        self.state = state_after_load(self.original_count);
        Ok(self.state)
    }

    fn original_count(&self) -> usize {
        self.original_count
    }

    fn correct_count(&self) -> usize {
        self.correct_count
    }

    fn incorrect_count(&self) -> usize {
        self.incorrect_count
    }
}
