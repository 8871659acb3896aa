use serde::{Deserialize, Serialize};

use crate::model::ids::CardId;

//
// ─── CARD TYPES ────────────────────────────────────────────────────────────────
//

/// A question/answer pair before the store has given it an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDraft {
    pub question: String,
    pub answer: String,
}

impl CardDraft {
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Attach an identity. Fresh cards always start unlearned.
    #[must_use]
    pub fn assign_id(self, id: CardId) -> Card {
        Card {
            id,
            question: self.question,
            answer: self.answer,
            is_learned: false,
        }
    }
}

/// One question/answer unit with its learned flag.
///
/// Two cards are the same card only if their ids match; the text may repeat
/// across cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    id: CardId,
    question: String,
    answer: String,
    is_learned: bool,
}

impl Card {
    #[must_use]
    pub fn new(
        id: CardId,
        question: impl Into<String>,
        answer: impl Into<String>,
        is_learned: bool,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            answer: answer.into(),
            is_learned,
        }
    }

    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn is_learned(&self) -> bool {
        self.is_learned
    }

    pub fn set_learned(&mut self, learned: bool) {
        self.is_learned = learned;
    }

    #[must_use]
    pub fn to_draft(&self) -> CardDraft {
        CardDraft::new(self.question.clone(), self.answer.clone())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drafted_card_starts_unlearned() {
        let card = CardDraft::new("2+2", "4").assign_id(CardId::new(9));
        assert_eq!(card.id(), CardId::new(9));
        assert_eq!(card.question(), "2+2");
        assert_eq!(card.answer(), "4");
        assert!(!card.is_learned());
    }

    #[test]
    fn cards_with_same_text_keep_distinct_ids() {
        let a = Card::new(CardId::new(1), "Q", "A", false);
        let b = Card::new(CardId::new(2), "Q", "A", false);
        assert_ne!(a, b);
        assert_eq!(a.to_draft(), b.to_draft());
    }
}
