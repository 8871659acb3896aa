#![forbid(unsafe_code)]

pub mod app_services;
pub mod card_set_service;
pub mod error;
pub mod generator;
pub mod sessions;

pub use flashset_core::Clock;

pub use app_services::AppServices;
pub use card_set_service::CardSetService;
pub use error::{AppServicesError, CardSetServiceError, GeneratorError, StudyServiceError};
pub use generator::{
    DEFAULT_GENERATION_TIMEOUT, GeneratedCard, Generator, GeneratorConfig, OpenAiGenerator,
    generate_with_timeout,
};
pub use sessions::{ActionReport, SessionEngine, StudyLoopService, StudySession};
