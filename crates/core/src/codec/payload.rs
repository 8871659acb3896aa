use serde::{Deserialize, Serialize};

use crate::model::{CardDraft, CardSetDraft};

/// Wire shape of an exported set.
///
/// Field names are the one-letter keys of the deep-link format. No ids travel
/// over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedSetPayload {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "d")]
    pub description: String,
    #[serde(rename = "t")]
    pub source_text: String,
    #[serde(rename = "c")]
    pub cards: Vec<ExportedCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedCard {
    #[serde(rename = "q")]
    pub question: String,
    #[serde(rename = "a")]
    pub answer: String,
}

impl From<&CardSetDraft> for ExportedSetPayload {
    fn from(draft: &CardSetDraft) -> Self {
        Self {
            name: draft.name.clone(),
            description: draft.description.clone(),
            source_text: draft.source_text.clone(),
            cards: draft
                .cards
                .iter()
                .map(|card| ExportedCard {
                    question: card.question.clone(),
                    answer: card.answer.clone(),
                })
                .collect(),
        }
    }
}

impl From<ExportedSetPayload> for CardSetDraft {
    fn from(payload: ExportedSetPayload) -> Self {
        Self {
            name: payload.name,
            description: payload.description,
            source_text: payload.source_text,
            cards: payload
                .cards
                .into_iter()
                .map(|card| CardDraft::new(card.question, card.answer))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_short_keys() {
        let draft = CardSetDraft::new("Math", "sums", "text", vec![CardDraft::new("2+2", "4")]);
        let json = serde_json::to_value(ExportedSetPayload::from(&draft)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "n": "Math",
                "d": "sums",
                "t": "text",
                "c": [{ "q": "2+2", "a": "4" }]
            })
        );
    }

    #[test]
    fn missing_field_is_a_shape_error() {
        let err = serde_json::from_str::<ExportedSetPayload>(r#"{"n":"x","d":"y","c":[]}"#);
        assert!(err.is_err());
    }
}
