use crate::model::{Card, CardId};

use super::{
    LearnedChange, StudyEngine, StudyError, StudyMode, StudyState, ensure_state, state_after_load,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub card_id: CardId,
    pub correct: bool,
    /// The stored answer, present only when the input was wrong.
    pub expected: Option<String>,
    pub change: LearnedChange,
    pub completed: bool,
}

/// Trimmed, case-insensitive comparison of typed input against an answer.
#[must_use]
pub fn answers_match(input: &str, expected: &str) -> bool {
    let input = input.trim();
    let expected = expected.trim();
    input == expected || input.to_lowercase() == expected.to_lowercase()
}

/// Typed-answer quiz over cards sorted by question.
#[derive(Debug, Clone)]
pub struct FreeTextQuiz {
    state: StudyState,
    cards: Vec<Card>,
    current_index: usize,
    correct_count: usize,
    incorrect_count: usize,
}

impl FreeTextQuiz {
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

    /// Judge the typed answer for the current card and advance.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` unless the session is active.
    pub fn check(&mut self, input: &str) -> Result<QuizOutcome, StudyError> {
        ensure_state(self.state, StudyState::Active)?;
        let Some(card) = self.cards.get_mut(self.current_index) else {
            return Err(StudyError::InvalidState(StudyState::Completed));
        };

        let correct = answers_match(input, card.answer());
        card.set_learned(correct);
        let card_id = card.id();
        let expected = (!correct).then(|| card.answer().to_owned());
        if correct {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
        }

        self.current_index += 1;
        if self.current_index == self.cards.len() {
            self.state = StudyState::Completed;
        }

        Ok(QuizOutcome {
            card_id,
            correct,
            expected,
            change: LearnedChange {
                card_id,
                is_learned: correct,
            },
            completed: self.state == StudyState::Completed,
        })
    }
}

impl Default for FreeTextQuiz {
    fn default() -> Self {
        Self::new()
    }
}

impl StudyEngine for FreeTextQuiz {
    fn mode(&self) -> StudyMode {
        StudyMode::Test
    }

    fn state(&self) -> StudyState {
        self.state
    }

    fn load(&mut self, mut cards: Vec<Card>) -> Result<StudyState, StudyError> {
        ensure_state(self.state, StudyState::Loading)?;
        cards.sort_by(|a, b| a.question().cmp(b.question()));
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
