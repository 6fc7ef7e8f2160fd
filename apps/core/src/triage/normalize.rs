//! Text canonicalization for matching.

/// Lowercases `text`, drops every character that is neither alphanumeric nor
/// whitespace, and collapses whitespace runs into single spaces.
///
/// Pure and idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_normalization() {
        assert_eq!(normalize("  Chest   PAIN!! "), "chest pain");
        assert_eq!(normalize("Shortness-of-breath?"), "shortnessofbreath");
        assert_eq!(normalize("I can't\tsleep\n"), "i cant sleep");
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("?!.,;:'\"()"), "");
    }

    #[test]
    fn test_unicode_is_kept() {
        assert_eq!(normalize("Mal de TÊTE"), "mal de tête");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "Chest pain",
            "  multiple   spaces  ",
            "İstanbul fever",
            "ÀÉÎ-õü ?? ß",
            "tabs\tand\nnewlines",
            "!!!",
            "x",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "normalize not idempotent for {:?}", s);
        }
    }
}
