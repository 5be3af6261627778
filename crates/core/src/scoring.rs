//! Points awarded per answered question.

/// Points for any correct answer.
pub const POINTS_BASE: u32 = 100;

/// Extra points per second left on the countdown.
pub const POINTS_TIME_BONUS: u32 = 10;

/// Points for an answer given with `time_remaining` seconds left.
///
/// Wrong answers and timeouts earn nothing.
#[must_use]
pub fn points_for(correct: bool, time_remaining: u32) -> u32 {
    if !correct {
        return 0;
    }
    POINTS_BASE.saturating_add(POINTS_TIME_BONUS.saturating_mul(time_remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answers_earn_base_plus_time_bonus() {
        assert_eq!(points_for(true, 20), 300);
        assert_eq!(points_for(true, 15), 250);
        assert_eq!(points_for(true, 10), 200);
        assert_eq!(points_for(true, 0), 100);
    }

    #[test]
    fn wrong_answers_earn_nothing() {
        assert_eq!(points_for(false, 20), 0);
        assert_eq!(points_for(false, 0), 0);
    }

    #[test]
    fn huge_limits_saturate() {
        assert_eq!(points_for(true, u32::MAX), u32::MAX);
    }
}
