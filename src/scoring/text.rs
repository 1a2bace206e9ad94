//! Word-level text heuristics shared by the dimension scorers and the
//! criteria evaluator. Everything here is deterministic and lowercase-based.

use std::collections::HashSet;

/// Common words excluded from overlap comparisons
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "in",
    "is", "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with",
    "you", "your", "this", "they", "their", "we", "our",
];

/// Lowercase alphanumeric tokens
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

pub(crate) fn word_count(text: &str) -> usize {
    words(text).len()
}

/// Lowercase tokens minus stopwords and very short words
pub(crate) fn content_words(text: &str) -> HashSet<String> {
    words(text)
        .into_iter()
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Word-set similarity in [0, 1]; 1.0 for identical sets, and for two
/// empty texts (a repeated empty prompt is still a repetition)
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<String> = words(a).into_iter().collect();
    let set_b: HashSet<String> = words(b).into_iter().collect();

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

/// Fraction of `expected`'s content words present in `actual`, in [0, 1].
/// Returns 1.0 when there is nothing to look for.
pub(crate) fn coverage(expected: &str, actual: &str) -> f64 {
    let wanted = content_words(expected);
    if wanted.is_empty() {
        return 1.0;
    }

    let present = content_words(actual);
    let hits = wanted.iter().filter(|w| present.contains(*w)).count();
    hits as f64 / wanted.len() as f64
}

/// Case-insensitive substring match; handles multi-word terms like
/// "group by" or "race condition"
pub(crate) fn contains_term(text: &str, term: &str) -> bool {
    if term.trim().is_empty() {
        return false;
    }
    text.to_lowercase().contains(&term.trim().to_lowercase())
}

/// Number of distinct markers from `markers` found in `text`
pub(crate) fn marker_hits(text: &str, markers: &[&str]) -> usize {
    let lower = text.to_lowercase();
    markers.iter().filter(|m| lower.contains(*m)).count()
}

/// Rough sentence count: terminator runs plus list-style line breaks
pub(crate) fn sentence_count(text: &str) -> usize {
    let terminators = text
        .split(['.', '!', '?', '\n'])
        .filter(|s| !s.trim().is_empty())
        .count();
    terminators.max(usize::from(!text.trim().is_empty()))
}

/// Does the text carry any concrete number
pub(crate) fn has_digits(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// Capitalized tokens that are not sentence-initial, approximating named
/// entities (products, companies, people)
pub(crate) fn capitalized_entities(text: &str) -> usize {
    let mut count = 0;
    let mut sentence_start = true;

    for token in text.split_whitespace() {
        let is_capitalized = token
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false);

        if is_capitalized && !sentence_start && token.len() > 1 {
            count += 1;
        }

        sentence_start = token.ends_with(['.', '!', '?', ':']);
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_lowercase_and_split() {
        let tokens = words("Write an Email, quickly!");
        assert_eq!(tokens, vec!["write", "an", "email", "quickly"]);
    }

    #[test]
    fn test_similarity_identical_and_disjoint() {
        assert!((similarity("write an email", "write an email") - 1.0).abs() < 1e-9);
        assert_eq!(similarity("alpha beta", "gamma delta"), 0.0);
    }

    #[test]
    fn test_similarity_partial() {
        let s = similarity("write a marketing email", "write a sales email");
        assert!(s > 0.3 && s < 0.9, "got {}", s);
    }

    #[test]
    fn test_coverage() {
        let expected = "concise email with subject line and call to action";
        let good = "Subject: Try it. A concise email with a clear call to action inside.";
        let bad = "totally unrelated text about databases";

        assert!(coverage(expected, good) > 0.7);
        assert!(coverage(expected, bad) < 0.2);
        assert_eq!(coverage("", good), 1.0);
    }

    #[test]
    fn test_contains_term_multiword() {
        assert!(contains_term("use GROUP BY on the orders table", "group by"));
        assert!(!contains_term("plain text", "group by"));
        assert!(!contains_term("anything", ""));
    }

    #[test]
    fn test_sentence_count() {
        assert_eq!(sentence_count("One. Two! Three?"), 3);
        assert_eq!(sentence_count("single run-on with no terminator"), 1);
        assert_eq!(sentence_count("- bullet one\n- bullet two"), 2);
    }

    #[test]
    fn test_capitalized_entities_skips_sentence_start() {
        // "Acme" and "Q3" count; sentence-initial "Send" does not
        let n = capitalized_entities("Send the Acme report before Q3 ends.");
        assert_eq!(n, 2);
    }
}
