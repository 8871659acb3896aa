use thiserror::Error;

use crate::codec::CodecError;
use crate::model::CardSetError;
use crate::modes::StudyError;

/// Any failure raised by the core crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    CardSet(#[from] CardSetError),
    #[error(transparent)]
    Study(#[from] StudyError),
}
