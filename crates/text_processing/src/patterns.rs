//! Grammar pattern detection
//!
//! Compiles the declarative `PatternRule` records into two matchers per rule:
//! a scanner that finds the construction anywhere in a sentence and an
//! anchored matcher that recognises a candidate phrase opening with it. Both
//! require at least one word after the prefix, so a bare stub like
//! `je suis` is never a pattern.

use lingua_config::PatternRule;
use lingua_core::{CanonicalUnit, UnitKind, UnitSource};
use regex::Regex;

use crate::normalize::normalize;

/// A compiled pattern rule
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub id: String,
    pub template: String,
    scanner: Option<Regex>,
    anchored: Option<Regex>,
    extra: Option<Regex>,
}

impl CompiledPattern {
    /// Canonical unit for this pattern
    pub fn unit(&self, source: UnitSource) -> CanonicalUnit {
        CanonicalUnit {
            text: self.template.clone(),
            kind: UnitKind::Pattern,
            source,
            canonical_key: CanonicalUnit::pattern_key(&self.id),
        }
    }

    /// Construction appears somewhere in normalized text
    pub fn found_in(&self, normalized: &str) -> bool {
        self.scanner
            .as_ref()
            .map(|re| re.is_match(normalized))
            .unwrap_or(false)
            || self.extra_matches(normalized)
    }

    /// Normalized candidate opens with the construction
    pub fn opens(&self, normalized: &str) -> bool {
        self.anchored
            .as_ref()
            .map(|re| re.is_match(normalized))
            .unwrap_or(false)
            || self.extra_matches(normalized)
    }

    fn extra_matches(&self, normalized: &str) -> bool {
        self.extra
            .as_ref()
            .map(|re| re.is_match(normalized))
            .unwrap_or(false)
    }
}

/// Ordered set of compiled pattern rules
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Compile rules; rules whose regex fails to compile are skipped with a warning
    pub fn from_rules(rules: &[PatternRule]) -> Self {
        let patterns = rules.iter().filter_map(compile_rule).collect();
        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Every pattern found in the text, in rule order
    pub fn detect(&self, text: &str) -> Vec<&CompiledPattern> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }
        self.patterns
            .iter()
            .filter(|p| p.found_in(&normalized))
            .collect()
    }

    /// First pattern a candidate phrase opens with
    pub fn classify(&self, candidate: &str) -> Option<&CompiledPattern> {
        let normalized = normalize(candidate);
        self.patterns.iter().find(|p| p.opens(&normalized))
    }
}

fn compile_rule(rule: &PatternRule) -> Option<CompiledPattern> {
    let alternatives: Vec<String> = rule
        .prefixes
        .iter()
        .map(|p| normalize(p))
        .filter(|p| !p.is_empty())
        .map(|p| regex::escape(&p))
        .collect();

    let (scanner, anchored) = if alternatives.is_empty() {
        (None, None)
    } else {
        let alts = alternatives.join("|");
        let scanner = Regex::new(&format!(r"(?:^|[^\p{{L}}\p{{N}}'])(?:{})\s+[\p{{L}}\p{{N}}]", alts));
        let anchored = Regex::new(&format!(r"^(?:{})\s+[\p{{L}}\p{{N}}]", alts));
        match (scanner, anchored) {
            (Ok(s), Ok(a)) => (Some(s), Some(a)),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(rule = %rule.id, error = %e, "Failed to compile pattern prefixes");
                return None;
            }
        }
    };

    let extra = match &rule.regex {
        Some(pattern) => match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(rule = %rule.id, error = %e, "Invalid pattern rule regex");
                return None;
            }
        },
        None => None,
    };

    if scanner.is_none() && extra.is_none() {
        tracing::warn!(rule = %rule.id, "Pattern rule has no matcher, skipping");
        return None;
    }

    Some(CompiledPattern {
        id: rule.id.clone(),
        template: rule.template.clone(),
        scanner,
        anchored,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_config::PedagogyConfig;

    fn defaults() -> PatternSet {
        PatternSet::from_rules(&PedagogyConfig::default().pattern_rules)
    }

    #[test]
    fn test_detect_in_sentence() {
        let set = defaults();
        let found = set.detect("Bonjour, j'aime le chocolat et je suis étudiant.");
        let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["identity_je_suis", "preference_jaime_object"]);
    }

    #[test]
    fn test_stub_is_not_a_pattern() {
        let set = defaults();
        assert!(set.detect("je suis").is_empty());
        assert!(set.classify("j'aime").is_none());
    }

    #[test]
    fn test_classify_candidate() {
        let set = defaults();
        let pattern = set.classify("J’aime le football").unwrap();
        assert_eq!(pattern.id, "preference_jaime_object");

        let unit = pattern.unit(UnitSource::AsSaid);
        assert_eq!(unit.text, "j'aime + [object]");
        assert_eq!(unit.canonical_key, "pattern:preference_jaime_object");
        assert_eq!(unit.kind, UnitKind::Pattern);
    }

    #[test]
    fn test_prefix_must_start_a_word() {
        let set = defaults();
        assert!(set.detect("disoy bien").is_empty());
    }

    #[test]
    fn test_extra_regex_rule() {
        let rules = vec![PatternRule {
            id: "future_aller".into(),
            prefixes: vec![],
            regex: Some(r"\bje vais \w+".into()),
            template: "je vais + [infinitive]".into(),
        }];
        let set = PatternSet::from_rules(&rules);
        assert_eq!(set.len(), 1);
        assert_eq!(set.detect("Demain je vais nager").len(), 1);
    }

    #[test]
    fn test_broken_rule_skipped() {
        let rules = vec![PatternRule {
            id: "broken".into(),
            prefixes: vec![],
            regex: Some("(".into()),
            template: "x".into(),
        }];
        assert!(PatternSet::from_rules(&rules).is_empty());
    }
}
