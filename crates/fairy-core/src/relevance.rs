//! Lexical relevance scoring.
//!
//! Used for candidates that match a query on text alone and carry no native
//! score from the store. Matching is case-insensitive.
//!
//! | Signal | Weight |
//! |--------|--------|
//! | whole query in chunk text | +0.5 |
//! | whole query in file name | +0.3 |
//! | each token (> 2 chars) in text | `min(0.1, 0.02 * count)` |
//! | each token (> 2 chars) in file name | `min(0.2, 0.1 * count)` |
//!
//! The sum is clamped to `[0, 1]`.

const PHRASE_IN_TEXT: f32 = 0.5;
const PHRASE_IN_NAME: f32 = 0.3;
const TOKEN_IN_TEXT: f32 = 0.02;
const TOKEN_IN_TEXT_CAP: f32 = 0.1;
const TOKEN_IN_NAME: f32 = 0.1;
const TOKEN_IN_NAME_CAP: f32 = 0.2;

/// Relevance of a chunk to `query`, in `[0, 1]`.
pub fn text_relevance(query: &str, text: &str, file_name: &str) -> f32 {
    let query = query.to_lowercase();
    if query.is_empty() {
        return 0.0;
    }
    let text = text.to_lowercase();
    let file_name = file_name.to_lowercase();

    let mut score = 0.0;
    if text.contains(&query) {
        score += PHRASE_IN_TEXT;
    }
    if file_name.contains(&query) {
        score += PHRASE_IN_NAME;
    }

    for token in query.split_whitespace() {
        if token.chars().count() <= 2 {
            continue;
        }
        let in_text = text.matches(token).count() as f32;
        score += (in_text * TOKEN_IN_TEXT).min(TOKEN_IN_TEXT_CAP);
        let in_name = file_name.matches(token).count() as f32;
        score += (in_name * TOKEN_IN_NAME).min(TOKEN_IN_NAME_CAP);
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_phrase_in_text_and_name() {
        // phrase (0.5 + 0.3), token "budget" once in text (0.02) and name (0.1)
        let score = text_relevance("budget", "the budget for 2024", "budget.txt");
        assert!(approx(score, 0.92), "got {score}");
    }

    #[test]
    fn test_case_insensitive() {
        let lower = text_relevance("report", "quarterly report", "a.txt");
        let upper = text_relevance("REPORT", "Quarterly REPORT", "A.TXT");
        assert!(approx(lower, upper));
        assert!(lower > 0.0);
    }

    #[test]
    fn test_short_tokens_ignored() {
        // "of" never contributes on its own, and the phrase is absent
        let score = text_relevance("of xy", "of of of", "of.txt");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_token_caps() {
        let text = "alpha ".repeat(50);
        // phrase 0.5 + text cap 0.1
        let score = text_relevance("alpha", &text, "x.txt");
        assert!(approx(score, 0.6), "got {score}");

        let name = "alpha_alpha_alpha_alpha";
        // phrase in name 0.3 + name cap 0.2
        let score = text_relevance("alpha", "nothing", name);
        assert!(approx(score, 0.5), "got {score}");
    }

    #[test]
    fn test_clamped_to_one() {
        let text = "rust async rust async ".repeat(20);
        let score = text_relevance("rust async", &text, "rust async rust async rust async");
        assert!(score <= 1.0);
        assert!(approx(score, 1.0));
    }

    #[test]
    fn test_empty_query_scores_zero() {
        assert_eq!(text_relevance("", "anything", "file.txt"), 0.0);
    }

    #[test]
    fn test_non_ascii_tokens() {
        let score = text_relevance("회의록", "오늘 회의록 정리", "memo.txt");
        assert!(approx(score, 0.52), "got {score}");
    }
}
