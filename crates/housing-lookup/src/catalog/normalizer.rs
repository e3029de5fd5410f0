use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold text for matching: strips diacritics and invisible characters, collapses whitespace
/// and lowercases, so "  BOGOTÁ\u{200b} d.c." and "bogota d.c." compare equal.
pub(crate) fn fold(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// How well a folded name matches a folded query; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum MatchRank {
    Exact,
    WordPrefix,
    Substring,
}

pub(crate) fn rank(name: &str, query: &str) -> Option<MatchRank> {
    if query.is_empty() {
        return None;
    }
    if name == query {
        return Some(MatchRank::Exact);
    }

    let word_prefix = name.starts_with(query)
        || name
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word.starts_with(query));
    if word_prefix {
        Some(MatchRank::WordPrefix)
    } else if name.contains(query) {
        Some(MatchRank::Substring)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_accents_case_and_noise() {
        assert_eq!(fold("  BOGOTÁ\u{200b}   D.C. "), "bogota d.c.");
        assert_eq!(fold("Medellín"), "medellin");
        assert_eq!(fold("Popayán"), fold("popayan"));
    }

    #[test]
    fn rank_prefers_exact_then_word_prefix_then_substring() {
        assert_eq!(rank("cali", "cali"), Some(MatchRank::Exact));
        assert_eq!(rank("santa marta", "mar"), Some(MatchRank::WordPrefix));
        assert_eq!(rank("barranquilla", "quill"), Some(MatchRank::Substring));
        assert_eq!(rank("tunja", "zz"), None);
        assert_eq!(rank("tunja", ""), None);
    }
}
