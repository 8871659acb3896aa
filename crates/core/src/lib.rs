#![forbid(unsafe_code)]
//! Study engine and set-exchange codec for flashcard sets.

pub mod codec;
pub mod distractor;
pub mod error;
pub mod model;
pub mod modes;
pub mod progress;
pub mod time;

pub use codec::{CodecConfig, CodecError, SetCodec};
pub use error::Error;
pub use progress::progress;
pub use time::Clock;
