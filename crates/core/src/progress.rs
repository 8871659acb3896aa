//! Learned-percentage arithmetic shared by card sets and study modes.

use crate::model::Card;

/// Percentage of learned cards, truncated toward zero.
///
/// Returns `0` for an empty slice.
#[must_use]
pub fn progress(cards: &[Card]) -> u8 {
    let total = cards.len();
    if total == 0 {
        return 0;
    }
    let learned = cards.iter().filter(|card| card.is_learned()).count();
    // learned <= total, so the quotient is at most 100
    u8::try_from(learned * 100 / total).unwrap_or(100)
}

/// Fraction `done / total` in `0.0..=1.0`, or `0.0` for an empty total.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ratio(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (done.min(total) as f64) / (total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CardId;

    fn cards(learned: &[bool]) -> Vec<Card> {
        learned
            .iter()
            .enumerate()
            .map(|(i, &l)| Card::new(CardId::new(i as u64 + 1), "Q", "A", l))
            .collect()
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(progress(&[]), 0);
    }

    #[test]
    fn none_and_all_learned_hit_bounds() {
        assert_eq!(progress(&cards(&[false, false, false])), 0);
        assert_eq!(progress(&cards(&[true, true, true])), 100);
    }

    #[test]
    fn truncates_instead_of_rounding() {
        // 2/3 = 66.66..
        assert_eq!(progress(&cards(&[true, true, false])), 66);
        // 1/7 = 14.28..
        assert_eq!(progress(&cards(&[true, false, false, false, false, false, false])), 14);
        // 6/7 = 85.71..
        assert_eq!(progress(&cards(&[true, true, true, true, true, true, false])), 85);
    }

    #[test]
    fn stays_within_bounds_for_every_mix() {
        for total in 1..=12 {
            for learned in 0..=total {
                let flags: Vec<bool> = (0..total).map(|i| i < learned).collect();
                let value = progress(&cards(&flags));
                assert!(value <= 100);
                assert_eq!(usize::from(value), learned * 100 / total);
            }
        }
    }

    #[test]
    fn ratio_handles_zero_total() {
        assert!(ratio(0, 0).abs() < f64::EPSILON);
        assert!((ratio(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}
