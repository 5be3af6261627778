use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::Question;

/// Maximum number of questions in one play-through.
pub const QUIZ_QUESTION_LIMIT: usize = 15;

/// Shuffle a copy of `source` and keep at most `limit` items.
///
/// `SliceRandom::shuffle` is a Fisher–Yates pass from the last index down to 1,
/// swapping each slot with a uniform index in `0..=i`, so every permutation is
/// equally likely before the prefix is taken.
pub fn shuffled_prefix<T, R>(source: &[T], limit: usize, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let mut pool = source.to_vec();
    pool.shuffle(rng);
    pool.truncate(limit);
    pool
}

/// Pick the working set for a session: at most 15 questions in random order.
pub fn select_questions<R: Rng + ?Sized>(source: &[Question], rng: &mut R) -> Vec<Question> {
    shuffled_prefix(source, QUIZ_QUESTION_LIMIT, rng)
}
