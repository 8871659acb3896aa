//! Multiple-choice option building for memorization mode.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::Card;

/// Upper bound on wrong answers offered next to the correct one.
pub const MAX_DISTRACTORS: usize = 3;

/// Build the shuffled option list for `correct`.
///
/// Wrong answers are drawn from `pool`, skipping anything equal to `correct`
/// and repeated answers. The result holds the correct answer plus up to
/// `MAX_DISTRACTORS` others; small pools simply yield fewer options.
pub fn build_options<R: Rng + ?Sized>(correct: &str, pool: &[Card], rng: &mut R) -> Vec<String> {
    let mut distractors: Vec<&str> = Vec::with_capacity(pool.len());
    for card in pool {
        let answer = card.answer();
        if answer != correct && !distractors.contains(&answer) {
            distractors.push(answer);
        }
    }
    distractors.shuffle(rng);
    distractors.truncate(MAX_DISTRACTORS);

    let mut options: Vec<String> = distractors.into_iter().map(str::to_owned).collect();
    options.push(correct.to_owned());
    options.shuffle(rng);
    options
}
