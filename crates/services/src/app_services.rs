use std::sync::Arc;
use std::time::Duration;

use storage::repository::Storage;

use crate::Clock;
use crate::card_set_service::CardSetService;
use crate::error::AppServicesError;
use crate::generator::{Generator, OpenAiGenerator};
use crate::sessions::StudyLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    card_sets: Arc<CardSetService>,
    study_loop: Arc<StudyLoopService>,
    generator: Arc<dyn Generator>,
    generation_timeout: Duration,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with the generator
    /// configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let generator = OpenAiGenerator::from_env();
        let timeout = generator.timeout();
        tracing::info!(generation = generator.enabled(), "app services ready");
        Ok(Self::from_storage(&storage, clock, Arc::new(generator), timeout))
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(
        clock: Clock,
        generator: Arc<dyn Generator>,
        generation_timeout: Duration,
    ) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, generator, generation_timeout)
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        generator: Arc<dyn Generator>,
        generation_timeout: Duration,
    ) -> Self {
        let card_sets = Arc::new(CardSetService::new(
            clock,
            Arc::clone(&storage.card_sets),
            Arc::clone(&storage.cards),
        ));
        let study_loop = Arc::new(StudyLoopService::new(
            Arc::clone(&storage.card_sets),
            Arc::clone(&storage.cards),
        ));
        Self {
            card_sets,
            study_loop,
            generator,
            generation_timeout,
        }
    }

    #[must_use]
    pub fn card_sets(&self) -> Arc<CardSetService> {
        Arc::clone(&self.card_sets)
    }

    #[must_use]
    pub fn study_loop(&self) -> Arc<StudyLoopService> {
        Arc::clone(&self.study_loop)
    }

    #[must_use]
    pub fn generator(&self) -> Arc<dyn Generator> {
        Arc::clone(&self.generator)
    }

    #[must_use]
    pub fn generation_timeout(&self) -> Duration {
        self.generation_timeout
    }
}
