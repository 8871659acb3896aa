use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flashset_core::model::{CardDraft, CardSetDraft};
use flashset_core::modes::{StudyMode, SwipeDirection};
use flashset_core::time::fixed_clock;
use services::{AppServices, CardSetServiceError, GeneratedCard, Generator, GeneratorError};

struct Scripted(Vec<GeneratedCard>);

#[async_trait]
impl Generator for Scripted {
    async fn generate(&self, _source_text: &str) -> Result<Vec<GeneratedCard>, GeneratorError> {
        Ok(self.0.clone())
    }
}

struct NeverAnswers;

#[async_trait]
impl Generator for NeverAnswers {
    async fn generate(&self, _source_text: &str) -> Result<Vec<GeneratedCard>, GeneratorError> {
        std::future::pending().await
    }
}

fn card(question: &str, answer: &str) -> GeneratedCard {
    GeneratedCard {
        question: question.into(),
        answer: answer.into(),
    }
}

#[tokio::test]
async fn generated_set_is_stored_and_studied() {
    let generator = Arc::new(Scripted(vec![card("H2O", "Water"), card("NaCl", "Salt")]));
    let app = AppServices::in_memory(fixed_clock(), generator, Duration::from_secs(30));
    let card_sets = app.card_sets();

    let id = card_sets
        .create_from_text(
            app.generator().as_ref(),
            "Chemistry",
            "formulas",
            "Water is H2O. Salt is NaCl.",
            app.generation_timeout(),
        )
        .await
        .unwrap();

    let set = card_sets.get_set(id).await.unwrap().unwrap();
    assert_eq!(set.source_text(), "Water is H2O. Salt is NaCl.");
    assert_eq!(set.cards().len(), 2);

    let study = app.study_loop();
    let mut session = study.start_session(id, StudyMode::Cards).await.unwrap();
    study
        .swipe(&mut session, SwipeDirection::Right)
        .await
        .unwrap();
    let listed = card_sets.list_sets(10).await.unwrap();
    assert_eq!(listed[0].progress_percent, 50);
}

#[tokio::test(start_paused = true)]
async fn generation_timeout_stores_nothing() {
    let app = AppServices::in_memory(
        fixed_clock(),
        Arc::new(NeverAnswers),
        Duration::from_secs(30),
    );
    let card_sets = app.card_sets();

    let err = card_sets
        .create_from_text(
            app.generator().as_ref(),
            "Slow",
            "",
            "text",
            app.generation_timeout(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CardSetServiceError::Generator(GeneratorError::Timeout(_))
    ));
    assert!(card_sets.list_sets(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_generation_stores_nothing() {
    let app = AppServices::in_memory(
        fixed_clock(),
        Arc::new(Scripted(Vec::new())),
        Duration::from_secs(30),
    );
    let card_sets = app.card_sets();
    let err = card_sets
        .create_from_text(app.generator().as_ref(), "Empty", "", "text", app.generation_timeout())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CardSetServiceError::Generator(GeneratorError::EmptyResult)
    ));
    assert!(card_sets.list_sets(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn link_round_trip_through_sqlite() {
    let app = AppServices::new_sqlite(
        "sqlite:file:services_link_round_trip?mode=memory&cache=shared",
        fixed_clock(),
    )
    .await
    .expect("sqlite services");
    let card_sets = app.card_sets();

    let original = card_sets
        .create_set(CardSetDraft::new(
            "Verbs",
            "irregular",
            "go went gone",
            vec![
                CardDraft::new("go (past)", "went"),
                CardDraft::new("go (participle)", "gone"),
                CardDraft::new("go (past)", "went"),
            ],
        ))
        .await
        .unwrap();

    let study = app.study_loop();
    let mut session = study.start_session(original, StudyMode::Test).await.unwrap();
    let report = study.check_answer(&mut session, "gone").await.unwrap();
    assert!(report.outcome.correct);

    let link = card_sets.export_link(original).await.unwrap();
    let imported = card_sets.import_link(&link).await.unwrap();
    assert_ne!(imported, original);

    let source = card_sets.get_set(original).await.unwrap().unwrap();
    let copy = card_sets.get_set(imported).await.unwrap().unwrap();
    assert_eq!(copy.to_draft(), source.to_draft());
    assert_eq!(copy.learned_count(), 0);
    assert_eq!(copy.progress_percent(), 0);
    assert_eq!(source.learned_count(), 1);
}
