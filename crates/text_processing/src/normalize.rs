//! Text normalization and tokenization
//!
//! Two layers are kept apart:
//! - display forms (`normalize`, `tokenize`) keep accents and contractions,
//!   so `j'aime` stays one token;
//! - comparison forms (`fold_accents`, `comparison_tokens`) fold diacritics
//!   and split contractions, so `ça va` matches `ca va` and `j'aime` matches
//!   `j aime`.
//!
//! Scripts without Latin word boundaries (CJK, Thai, ...) come out as opaque
//! multi-character tokens. That is degraded but never fatal.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// A word: letters, marks or digits, optionally joined by inner apostrophes
static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{M}\p{N}]+(?:'[\p{L}\p{M}\p{N}]+)*").unwrap());

/// Template placeholders such as `[object]`
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

/// Trim, lowercase, unify apostrophes and collapse whitespace
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '\u{02BC}' | '\u{2032}' | '`' => '\'',
            other => other,
        })
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split normalized text into word tokens, punctuation dropped
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    WORD.find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Strip diacritics and expand ligatures for comparison keys
pub fn fold_accents(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => out.push('a'),
            'ç' | 'ć' | 'č' => out.push('c'),
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => out.push('e'),
            'ì' | 'í' | 'î' | 'ï' | 'ī' => out.push('i'),
            'ñ' | 'ń' | 'ň' => out.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => out.push('o'),
            'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'ś' | 'š' => out.push('s'),
            'ź' | 'ż' | 'ž' => out.push('z'),
            'ł' => out.push('l'),
            'ř' => out.push('r'),
            'ß' => out.push_str("ss"),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            // combining diacritical marks left over from decomposed input
            '\u{0300}'..='\u{036F}' => {}
            other => out.push(other),
        }
    }
    out
}

/// Folded tokens with contractions split at the apostrophe
pub fn comparison_tokens(text: &str) -> Vec<String> {
    tokenize(text)
        .iter()
        .flat_map(|token| {
            fold_accents(token)
                .split('\'')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Comparison tokens of a unit's display text
///
/// Pattern templates contribute only their literal words: `+` and bracketed
/// placeholders are dropped.
pub fn unit_tokens(unit_text: &str) -> Vec<String> {
    comparison_tokens(&PLACEHOLDER.replace_all(unit_text, " "))
}

/// Single comparison key for a whole text
pub fn comparison_key(text: &str) -> String {
    comparison_tokens(text).join(" ")
}

/// Whether `needle` occurs as a contiguous run inside `haystack`
pub fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Number of user-perceived characters
pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Ça   VA\tbien  "), "ça va bien");
        assert_eq!(normalize("J’aime"), "j'aime");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_tokenize_keeps_contractions() {
        assert_eq!(tokenize("J'aime le café!"), vec!["j'aime", "le", "café"]);
        assert_eq!(tokenize("Ça va? Oui."), vec!["ça", "va", "oui"]);
        assert!(tokenize("?!...").is_empty());
    }

    #[test]
    fn test_tokenize_other_scripts() {
        assert_eq!(tokenize("我喜欢咖啡"), vec!["我喜欢咖啡"]);
        assert_eq!(tokenize("Привет мир"), vec!["привет", "мир"]);
        assert_eq!(tokenize("مرحبا بك"), vec!["مرحبا", "بك"]);
    }

    #[test]
    fn test_fold_accents() {
        assert_eq!(fold_accents("ça va"), "ca va");
        assert_eq!(fold_accents("élève"), "eleve");
        assert_eq!(fold_accents("cœur"), "coeur");
        assert_eq!(fold_accents("heiße"), "heisse");
        assert_eq!(fold_accents("e\u{0301}te\u{0301}"), "ete");
    }

    #[test]
    fn test_comparison_tokens_split_contractions() {
        assert_eq!(comparison_tokens("J'aime"), vec!["j", "aime"]);
        assert_eq!(comparison_tokens("j aime"), vec!["j", "aime"]);
        assert_eq!(comparison_tokens("Ça va"), vec!["ca", "va"]);
    }

    #[test]
    fn test_unit_tokens_drop_placeholders() {
        assert_eq!(unit_tokens("j'aime + [object]"), vec!["j", "aime"]);
        assert_eq!(unit_tokens("je suis + [identity]"), vec!["je", "suis"]);
    }

    #[test]
    fn test_contains_run() {
        let hay = comparison_tokens("Bonjour, ça va bien");
        assert!(contains_run(&hay, &comparison_tokens("ca va")));
        assert!(!contains_run(&hay, &comparison_tokens("va ça")));
        assert!(!contains_run(&hay, &[]));
    }

    #[test]
    fn test_grapheme_len() {
        assert_eq!(grapheme_len("é"), 1);
        assert_eq!(grapheme_len("e\u{0301}"), 1);
        assert_eq!(grapheme_len("ça"), 2);
    }
}
