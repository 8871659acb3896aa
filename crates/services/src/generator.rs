use std::env;
use std::time::Duration;

use async_trait::async_trait;
use flashset_core::model::CardDraft;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;

/// How long a generation request may run before it is abandoned.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

const INSTRUCTION: &str = "Create study flashcards from the text below. \
Reply with a JSON array only, where every element is an object with a \
\"question\" string and an \"answer\" string.";

/// One question/answer pair produced by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub question: String,
    pub answer: String,
}

impl From<GeneratedCard> for CardDraft {
    fn from(card: GeneratedCard) -> Self {
        CardDraft::new(card.question, card.answer)
    }
}

/// Turns free text into flashcards.
#[async_trait]
pub trait Generator: Send + Sync {
    /// # Errors
    ///
    /// Returns `GeneratorError` if no cards could be produced.
    async fn generate(&self, source_text: &str) -> Result<Vec<GeneratedCard>, GeneratorError>;
}

/// Race a generator against `timeout`.
///
/// On timeout the pending request is dropped, so a late reply is never seen.
/// An empty card list is reported as `GeneratorError::EmptyResult`.
///
/// # Errors
///
/// Returns `GeneratorError::Timeout` when the deadline passes first, or the
/// generator's own error.
pub async fn generate_with_timeout(
    generator: &dyn Generator,
    source_text: &str,
    timeout: Duration,
) -> Result<Vec<GeneratedCard>, GeneratorError> {
    let cards = tokio::time::timeout(timeout, generator.generate(source_text))
        .await
        .map_err(|_| {
            tracing::warn!(?timeout, "card generation timed out");
            GeneratorError::Timeout(timeout)
        })??;

    if cards.is_empty() {
        return Err(GeneratorError::EmptyResult);
    }
    Ok(cards)
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// Read `FLASHSET_AI_*` variables. A missing or blank API key disables
    /// generation.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("FLASHSET_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("FLASHSET_AI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("FLASHSET_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let timeout = env::var("FLASHSET_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_GENERATION_TIMEOUT, Duration::from_secs);
        Some(Self {
            base_url,
            api_key,
            model,
            timeout,
        })
    }
}

//
// ─── HTTP GENERATOR ────────────────────────────────────────────────────────────
//

/// Generator backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl OpenAiGenerator {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Configured deadline, or the default when generation is disabled.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.config
            .as_ref()
            .map_or(DEFAULT_GENERATION_TIMEOUT, |config| config.timeout)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, source_text: &str) -> Result<Vec<GeneratedCard>, GeneratorError> {
        let config = self.config.as_ref().ok_or(GeneratorError::Disabled)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: source_text.to_string(),
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeneratorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GeneratorError::EmptyResult)?;

        let cards = parse_cards(&content)?;
        tracing::debug!(cards = cards.len(), model = %config.model, "generated cards");
        Ok(cards)
    }
}

/// Parse the model's reply into cards, dropping pairs with a blank side.
///
/// A Markdown code fence around the array is tolerated.
fn parse_cards(content: &str) -> Result<Vec<GeneratedCard>, GeneratorError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let cards: Vec<GeneratedCard> = serde_json::from_str(body)
        .map_err(|e| GeneratorError::MalformedResponse(e.to_string()))?;

    let cards: Vec<GeneratedCard> = cards
        .into_iter()
        .filter(|card| !card.question.trim().is_empty() && !card.answer.trim().is_empty())
        .map(|card| GeneratedCard {
            question: card.question.trim().to_owned(),
            answer: card.answer.trim().to_owned(),
        })
        .collect();

    if cards.is_empty() {
        return Err(GeneratorError::EmptyResult);
    }
    Ok(cards)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    #[async_trait]
    impl Generator for Slow {
        async fn generate(&self, _source_text: &str) -> Result<Vec<GeneratedCard>, GeneratorError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![GeneratedCard {
                question: "late".into(),
                answer: "reply".into(),
            }])
        }
    }

    struct Empty;

    #[async_trait]
    impl Generator for Empty {
        async fn generate(&self, _source_text: &str) -> Result<Vec<GeneratedCard>, GeneratorError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generator_times_out() {
        let err = generate_with_timeout(&Slow, "text", DEFAULT_GENERATION_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Timeout(d) if d == DEFAULT_GENERATION_TIMEOUT));
    }

    #[tokio::test]
    async fn empty_result_is_an_error() {
        let err = generate_with_timeout(&Empty, "text", DEFAULT_GENERATION_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::EmptyResult));
    }

    #[tokio::test]
    async fn disabled_generator_reports_disabled() {
        let generator = OpenAiGenerator::new(None);
        assert!(!generator.enabled());
        assert_eq!(generator.timeout(), DEFAULT_GENERATION_TIMEOUT);
        let err = generator.generate("text").await.unwrap_err();
        assert!(matches!(err, GeneratorError::Disabled));
    }

    #[test]
    fn parses_plain_and_fenced_arrays() {
        let plain = r#"[{"question":"2+2","answer":"4"}]"#;
        assert_eq!(parse_cards(plain).unwrap().len(), 1);

        let fenced = "```json\n[{\"question\":\" Capital of France \",\"answer\":\"Paris\"}]\n```";
        let cards = parse_cards(fenced).unwrap();
        assert_eq!(cards[0].question, "Capital of France");
    }

    #[test]
    fn blank_pairs_are_dropped() {
        let reply = r#"[{"question":" ","answer":"x"},{"question":"q","answer":"a"}]"#;
        assert_eq!(parse_cards(reply).unwrap().len(), 1);

        let only_blank = r#"[{"question":"","answer":""}]"#;
        assert!(matches!(
            parse_cards(only_blank),
            Err(GeneratorError::EmptyResult)
        ));
    }

    #[test]
    fn prose_reply_is_malformed() {
        assert!(matches!(
            parse_cards("Sure! Here are your cards."),
            Err(GeneratorError::MalformedResponse(_))
        ));
    }
}
