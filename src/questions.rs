use rand::seq::SliceRandom;

use crate::error::GameError;

/// Fixed prompt corpus. Every game draws its questions from here without
/// replacement, so `total_rounds` can never exceed this list's length.
pub const QUESTION_CORPUS: &[&str] = &[
    "What's the most embarrassing thing you'd do for a million dollars?",
    "What would you bring to a deserted island that nobody else would think of?",
    "What's your secret talent that nobody at this table knows about?",
    "If you could swap lives with anyone here for a day, what would you do first?",
    "What's the worst excuse you've ever used to get out of plans?",
    "What would the title of your autobiography be?",
    "What's the strangest thing you've ever eaten?",
    "If animals could talk, which species would be the rudest?",
    "What's a conspiracy theory you secretly find plausible?",
    "What would you do on your last day before the internet shut down forever?",
    "What's the pettiest hill you're willing to die on?",
    "If you had to teach a class on one thing, what would it be?",
    "What's the most useless superpower you can think of?",
    "What smell instantly takes you back to childhood?",
    "What's the weirdest compliment you've ever received?",
    "If your life had a warning label, what would it say?",
    "What's something everyone loves that you can't stand?",
    "What fictional place would you move to tomorrow?",
    "What's the best bad decision you've ever made?",
    "If you were a kitchen appliance, which one would you be?",
    "What's a sound that drives you absolutely crazy?",
    "What would you name a boat if you had one?",
    "What's the most unhinged thing in your search history this week?",
    "If you could un-invent one thing, what would it be?",
];

/// Draw `count` distinct prompts in randomized order.
///
/// Requesting more prompts than the corpus holds is an error, never a silent
/// truncation.
pub fn draw(count: usize) -> Result<Vec<String>, GameError> {
    if count > QUESTION_CORPUS.len() {
        return Err(GameError::Validation(format!(
            "requested {} questions but the corpus only has {}",
            count,
            QUESTION_CORPUS.len()
        )));
    }
    let mut pool: Vec<&str> = QUESTION_CORPUS.to_vec();
    pool.shuffle(&mut rand::rng());
    Ok(pool.into_iter().take(count).map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_draw_returns_distinct_prompts() {
        let questions = draw(5).unwrap();
        assert_eq!(questions.len(), 5);

        let unique: HashSet<_> = questions.iter().collect();
        assert_eq!(unique.len(), 5);

        for q in &questions {
            assert!(QUESTION_CORPUS.contains(&q.as_str()));
        }
    }

    #[test]
    fn test_draw_full_corpus_is_allowed() {
        let questions = draw(QUESTION_CORPUS.len()).unwrap();
        assert_eq!(questions.len(), QUESTION_CORPUS.len());
    }

    #[test]
    fn test_draw_over_corpus_errors() {
        let result = draw(QUESTION_CORPUS.len() + 1);
        assert!(matches!(result, Err(GameError::Validation(_))));
    }

    #[test]
    fn test_draw_zero_is_empty() {
        assert!(draw(0).unwrap().is_empty());
    }
}
