//! Antibiotic vocabulary and entry normalization.

use strsim::jaro_winkler;

/// Antibiotics offered by the admission form.
pub const ANTIBIOTIC_OPTIONS: [&str; 8] = [
    "Amoxicilina",
    "Ceftriaxona",
    "Azitromicina",
    "Claritromicina",
    "Penicilina Benzatina",
    "Ampicilina",
    "Gentamicina",
    "Cefalexina",
];

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Trim an entry and use the vocabulary spelling when it names a known antibiotic.
pub fn canonical_antibiotic(name: &str) -> String {
    let trimmed = name.trim();
    ANTIBIOTIC_OPTIONS
        .iter()
        .find(|option| option.to_lowercase() == trimmed.to_lowercase())
        .map(|option| option.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Canonicalize entries, drop blanks and drop duplicates (first occurrence wins).
pub fn normalize_antibiotics<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for entry in entries {
        let canonical = canonical_antibiotic(entry.as_ref());
        if canonical.is_empty() {
            continue;
        }
        let lower = canonical.to_lowercase();
        if !normalized.iter().any(|n| n.to_lowercase() == lower) {
            normalized.push(canonical);
        }
    }
    normalized
}

/// Vocabulary entries resembling a free-text entry, best match first.
pub fn suggest_antibiotics(input: &str, limit: usize) -> Vec<&'static str> {
    let query = input.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&'static str, f64)> = ANTIBIOTIC_OPTIONS
        .iter()
        .map(|option| (*option, jaro_winkler(&query, &option.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(limit).map(|(name, _)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_vocabulary_spelling() {
        assert_eq!(canonical_antibiotic("  amoxicilina "), "Amoxicilina");
        assert_eq!(canonical_antibiotic("PENICILINA BENZATINA"), "Penicilina Benzatina");
    }

    #[test]
    fn test_canonical_custom_entry() {
        assert_eq!(canonical_antibiotic(" Oxacilina "), "Oxacilina");
    }

    #[test]
    fn test_normalize_dedups_and_drops_blanks() {
        let normalized = normalize_antibiotics([
            "Amoxicilina",
            "amoxicilina",
            "",
            "  ",
            "Oxacilina",
            "oxacilina",
            "Ceftriaxona",
        ]);
        assert_eq!(normalized, vec!["Amoxicilina", "Oxacilina", "Ceftriaxona"]);
    }

    #[test]
    fn test_suggest_typo() {
        let suggestions = suggest_antibiotics("amoxicilin", 3);
        assert_eq!(suggestions.first(), Some(&"Amoxicilina"));
    }

    #[test]
    fn test_suggest_nothing_for_unrelated() {
        assert!(suggest_antibiotics("xyz", 3).is_empty());
        assert!(suggest_antibiotics("   ", 3).is_empty());
    }

    #[test]
    fn test_suggest_respects_limit() {
        assert!(suggest_antibiotics("cef", 1).len() <= 1);
    }
}
