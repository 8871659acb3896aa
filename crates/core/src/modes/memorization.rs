use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::distractor::build_options;
use crate::model::{Card, CardId};
use crate::progress::ratio;

use super::{
    LearnedChange, StudyEngine, StudyError, StudyMode, StudyState, ensure_state, state_after_load,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorizationOutcome {
    pub card_id: CardId,
    pub correct: bool,
    /// The answer that would have been right, for feedback.
    pub correct_answer: String,
    pub change: LearnedChange,
    pub completed: bool,
}

/// Multiple choice over a queue of cards; misses go to the back.
///
/// The queue shrinks only on correct answers, so a run finishes once every
/// card has been answered correctly once.
#[derive(Debug, Clone)]
pub struct Memorization {
    state: StudyState,
    queue: VecDeque<Card>,
    options: Vec<String>,
    original_count: usize,
    correct_count: usize,
    incorrect_count: usize,
    rng: StdRng,
}

impl Memorization {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    /// Use a caller-provided generator for the deck and option shuffles.
    #[must_use]
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: StudyState::Loading,
            queue: VecDeque::new(),
            options: Vec::new(),
            original_count: 0,
            correct_count: 0,
            incorrect_count: 0,
            rng,
        }
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&Card> {
        match self.state {
            StudyState::Active => self.queue.front(),
            _ => None,
        }
    }

    /// Options for the current card, already shuffled.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// `correct_count / original_count`, independent of the set's progress.
    #[must_use]
    pub fn progress_ratio(&self) -> f64 {
        ratio(self.correct_count, self.original_count)
    }

    /// Answer the current card with one of the offered options.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` unless the session is active.
    pub fn select(&mut self, option: &str) -> Result<MemorizationOutcome, StudyError> {
        ensure_state(self.state, StudyState::Active)?;
        let Some(mut card) = self.queue.pop_front() else {
            return Err(StudyError::InvalidState(StudyState::Completed));
        };

        let correct = option == card.answer();
        card.set_learned(correct);
        let change = LearnedChange {
            card_id: card.id(),
            is_learned: correct,
        };
        let correct_answer = card.answer().to_owned();

        if correct {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
            self.queue.push_back(card);
        }

        if self.queue.is_empty() {
            self.state = StudyState::Completed;
            self.options.clear();
        } else {
            self.refresh_options();
        }

        Ok(MemorizationOutcome {
            card_id: change.card_id,
            correct,
            correct_answer,
            change,
            completed: self.state == StudyState::Completed,
        })
    }

    fn refresh_options(&mut self) {
        let pool: &[Card] = self.queue.make_contiguous();
        self.options = match pool.first() {
            Some(front) => build_options(front.answer(), pool, &mut self.rng),
            None => Vec::new(),
        };
    }
}

impl Default for Memorization {
    fn default() -> Self {
        Self::new()
    }
}

impl StudyEngine for Memorization {
    fn mode(&self) -> StudyMode {
        StudyMode::Memorization
    }

    fn state(&self) -> StudyState {
        self.state
    }

    fn load(&mut self, mut cards: Vec<Card>) -> Result<StudyState, StudyError> {
        ensure_state(self.state, StudyState::Loading)?;
        cards.shuffle(&mut self.rng);
        self.original_count = cards.len();
        self.queue = cards.into();
        self.state = state_after_load(self.original_count);
        if self.state == StudyState::Active {
            self.refresh_options();
        }
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
