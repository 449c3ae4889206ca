//! Resolve free text to a known vocabulary entry.
//!
//! Matching is exact (case-insensitive) first, then substring containment, taking the
//! first entry in vocabulary order. There is no similarity scoring: the same input and
//! vocabulary always give the same entry.

/// How a value was matched against a vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularyMatch<'a> {
    /// Case-insensitive equality
    Exact(&'a str),
    /// First entry whose lower-cased form contains the lower-cased value
    Contains(&'a str),
    /// Nothing matched
    Unresolved,
}

impl<'a> VocabularyMatch<'a> {
    pub fn entry(&self) -> Option<&'a str> {
        match *self {
            VocabularyMatch::Exact(entry) | VocabularyMatch::Contains(entry) => Some(entry),
            VocabularyMatch::Unresolved => None,
        }
    }
}

/// Find `value` in `vocabulary`. An empty value never matches.
pub fn match_vocabulary<'a>(value: &str, vocabulary: &'a [String]) -> VocabularyMatch<'a> {
    if value.is_empty() {
        return VocabularyMatch::Unresolved;
    }
    let needle = value.to_lowercase();

    if let Some(entry) = vocabulary.iter().find(|v| v.to_lowercase() == needle) {
        return VocabularyMatch::Exact(entry);
    }
    if let Some(entry) = vocabulary.iter().find(|v| v.to_lowercase().contains(&needle)) {
        return VocabularyMatch::Contains(entry);
    }
    VocabularyMatch::Unresolved
}

/// The matched vocabulary entry, or `value` unchanged when nothing matches
pub fn resolve(value: &str, vocabulary: &[String]) -> String {
    match_vocabulary(value, vocabulary)
        .entry()
        .unwrap_or(value)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_case_insensitive() {
        let v = vocab(&["signin", "sign_out"]);
        assert_eq!(resolve("SIGNIN", &v), "signin");
        assert_eq!(match_vocabulary("SignIn", &v), VocabularyMatch::Exact("signin"));
    }

    #[test]
    fn test_substring_first_in_order() {
        let v = vocab(&["signin", "sign_out"]);
        assert_eq!(resolve("sign", &v), "signin");
        assert_eq!(match_vocabulary("out", &v), VocabularyMatch::Contains("sign_out"));
    }

    #[test]
    fn test_exact_beats_earlier_substring() {
        let v = vocab(&["home_tab", "home"]);
        assert_eq!(resolve("home", &v), "home");
    }

    #[test]
    fn test_unresolved_returns_input() {
        let v = vocab(&["signin", "sign_out"]);
        assert_eq!(resolve("zzz", &v), "zzz");
        assert_eq!(resolve("Zzz", &v), "Zzz");
        assert_eq!(match_vocabulary("zzz", &v), VocabularyMatch::Unresolved);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(resolve("signin", &[]), "signin");
        assert_eq!(resolve("", &vocab(&["signin"])), "");
    }

    #[test]
    fn test_deterministic() {
        let v = vocab(&["app_open", "listing_upload_new", "owner_payment"]);
        let first = resolve("n", &v);
        for _ in 0..10 {
            assert_eq!(resolve("n", &v), first);
        }
        assert_eq!(first, "app_open");
    }
}
