use rand::SeedableRng;
use rand::rngs::StdRng;

use flashset_core::model::{Card, CardSet, CardSetId};
use flashset_core::modes::{
    FreeTextQuiz, MatchingPairs, Memorization, StudyEngine, StudyError, StudyMode, StudyState,
    SwipeRecall,
};

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// The engine driving one study session.
#[derive(Debug, Clone)]
pub enum SessionEngine {
    Cards(SwipeRecall),
    Memorization(Memorization),
    Selection(MatchingPairs),
    Test(FreeTextQuiz),
}

impl SessionEngine {
    /// Fresh engine for `mode`. A seed makes shuffles reproducible.
    #[must_use]
    pub fn new(mode: StudyMode, seed: Option<u64>) -> Self {
        let rng = || seed.map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64);
        match mode {
            StudyMode::Cards => Self::Cards(SwipeRecall::new()),
            StudyMode::Memorization => Self::Memorization(Memorization::with_rng(rng())),
            StudyMode::Selection => Self::Selection(MatchingPairs::with_rng(rng())),
            StudyMode::Test => Self::Test(FreeTextQuiz::new()),
        }
    }

    #[must_use]
    pub fn as_engine(&self) -> &dyn StudyEngine {
        match self {
            Self::Cards(engine) => engine,
            Self::Memorization(engine) => engine,
            Self::Selection(engine) => engine,
            Self::Test(engine) => engine,
        }
    }

    fn as_engine_mut(&mut self) -> &mut dyn StudyEngine {
        match self {
            Self::Cards(engine) => engine,
            Self::Memorization(engine) => engine,
            Self::Selection(engine) => engine,
            Self::Test(engine) => engine,
        }
    }

    pub(crate) fn load(&mut self, cards: Vec<Card>) -> Result<StudyState, StudyError> {
        self.as_engine_mut().load(cards)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A card set being studied in one mode.
///
/// The engine works on its own copy of the cards; the set is the source of
/// truth for learned flags and progress. Dropping the session ends it.
#[derive(Debug, Clone)]
pub struct StudySession {
    set: CardSet,
    engine: SessionEngine,
}

impl StudySession {
    pub(crate) fn new(set: CardSet, engine: SessionEngine) -> Self {
        Self { set, engine }
    }

    #[must_use]
    pub fn set(&self) -> &CardSet {
        &self.set
    }

    #[must_use]
    pub fn set_id(&self) -> CardSetId {
        self.set.id()
    }

    #[must_use]
    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    #[must_use]
    pub fn mode(&self) -> StudyMode {
        self.engine.as_engine().mode()
    }

    #[must_use]
    pub fn state(&self) -> StudyState {
        self.engine.as_engine().state()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.engine.as_engine().is_complete()
    }

    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.set.progress_percent()
    }

    /// End the session and keep the updated set.
    #[must_use]
    pub fn into_set(self) -> CardSet {
        self.set
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut CardSet, &mut SessionEngine) {
        (&mut self.set, &mut self.engine)
    }
}
