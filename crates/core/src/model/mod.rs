mod card;
mod card_set;
mod ids;

pub use ids::{CardId, CardSetId, ParseIdError};

pub use card::{Card, CardDraft};
pub use card_set::{CardSet, CardSetDraft, CardSetError};
