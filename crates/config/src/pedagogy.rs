//! Pedagogy configuration
//!
//! Declarative tables and thresholds behind unit canonicalization, the
//! validation gate, graph construction and the mission checklist. Adding a
//! language or a grammar construction means adding records here, not
//! touching gate logic.
//!
//! Defaults ship French, Spanish and German tables. A YAML file can replace
//! them wholesale:
//!
//! ```yaml
//! stopwords: [je, tu, le, la]
//! pattern_rules:
//!   - id: preference_jaime_object
//!     prefixes: ["j'aime", "j aime"]
//!     template: "j'aime + [object]"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// A grammar construction detector
///
/// A rule fires on text that starts with one of `prefixes` (or matches
/// `regex`) and continues with at least one more token. The matching unit is
/// replaced by the templated pattern `template` keyed `pattern:{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Stable pattern id, e.g. `preference_jaime_object`
    pub id: String,
    /// Literal lowercase prefixes that open the construction
    #[serde(default)]
    pub prefixes: Vec<String>,
    /// Optional extra regex, matched against normalized text
    #[serde(default)]
    pub regex: Option<String>,
    /// Display text, e.g. `j'aime + [object]`
    pub template: String,
}

impl PatternRule {
    pub fn new(id: &str, prefixes: &[&str], template: &str) -> Self {
        Self {
            id: id.to_string(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            regex: None,
            template: template.to_string(),
        }
    }
}

/// Known multi-word chunks for the heuristic extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicChunk {
    /// Display form emitted as a candidate
    pub canonical: String,
    /// Surface variants looked for in the utterance (lowercase)
    pub variants: Vec<String>,
}

impl HeuristicChunk {
    fn new(canonical: &str, variants: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Validation gate thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    /// Chunks with at least this many tokens are too broad
    #[serde(default = "default_breadth_threshold")]
    pub breadth_threshold: usize,
    /// Minimum character length of a mission keyword
    #[serde(default = "default_mission_keyword_min_len")]
    pub mission_keyword_min_len: usize,
    /// Relevance floor for patterns and sentences
    #[serde(default = "default_structural_relevance_floor")]
    pub structural_relevance_floor: f32,
    #[serde(default = "default_confidence_both")]
    pub confidence_both: f32,
    #[serde(default = "default_confidence_one")]
    pub confidence_one: f32,
    #[serde(default = "default_confidence_none")]
    pub confidence_none: f32,
    #[serde(default = "default_pattern_confidence_floor")]
    pub pattern_confidence_floor: f32,
    #[serde(default = "default_sentence_confidence_floor")]
    pub sentence_confidence_floor: f32,
    /// Below this confidence a unit is rejected outright
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Off-mission needs confidence below this...
    #[serde(default = "default_off_mission_confidence")]
    pub off_mission_confidence: f32,
    /// ...and relevance below this
    #[serde(default = "default_off_mission_relevance")]
    pub off_mission_relevance: f32,
    /// A word covered by an accepted unit survives only at or above this relevance
    #[serde(default = "default_chunk_coverage_relevance")]
    pub chunk_coverage_relevance: f32,
    /// Quality weight of the accepted ratio
    #[serde(default = "default_accepted_weight")]
    pub accepted_weight: f32,
    /// Quality bonus when anything was accepted
    #[serde(default = "default_any_accepted_bonus")]
    pub any_accepted_bonus: f32,
    /// Quality penalty when the learner's sentence needed correction
    #[serde(default = "default_correction_penalty")]
    pub correction_penalty: f32,
}

fn default_breadth_threshold() -> usize {
    4
}
fn default_mission_keyword_min_len() -> usize {
    4
}
fn default_structural_relevance_floor() -> f32 {
    0.7
}
fn default_confidence_both() -> f32 {
    0.9
}
fn default_confidence_one() -> f32 {
    0.75
}
fn default_confidence_none() -> f32 {
    0.55
}
fn default_pattern_confidence_floor() -> f32 {
    0.82
}
fn default_sentence_confidence_floor() -> f32 {
    0.85
}
fn default_min_confidence() -> f32 {
    0.6
}
fn default_off_mission_confidence() -> f32 {
    0.72
}
fn default_off_mission_relevance() -> f32 {
    0.5
}
fn default_chunk_coverage_relevance() -> f32 {
    0.95
}
fn default_accepted_weight() -> f32 {
    0.7
}
fn default_any_accepted_bonus() -> f32 {
    0.3
}
fn default_correction_penalty() -> f32 {
    0.2
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            breadth_threshold: default_breadth_threshold(),
            mission_keyword_min_len: default_mission_keyword_min_len(),
            structural_relevance_floor: default_structural_relevance_floor(),
            confidence_both: default_confidence_both(),
            confidence_one: default_confidence_one(),
            confidence_none: default_confidence_none(),
            pattern_confidence_floor: default_pattern_confidence_floor(),
            sentence_confidence_floor: default_sentence_confidence_floor(),
            min_confidence: default_min_confidence(),
            off_mission_confidence: default_off_mission_confidence(),
            off_mission_relevance: default_off_mission_relevance(),
            chunk_coverage_relevance: default_chunk_coverage_relevance(),
            accepted_weight: default_accepted_weight(),
            any_accepted_bonus: default_any_accepted_bonus(),
            correction_penalty: default_correction_penalty(),
        }
    }
}

/// Graph construction weights and caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSettings {
    /// Maximum links touching one node
    #[serde(default = "default_degree_cap")]
    pub degree_cap: usize,
    #[serde(default = "default_mastery_base")]
    pub mastery_base: f32,
    #[serde(default = "default_confidence_weight")]
    pub confidence_weight: f32,
    #[serde(default = "default_reuse_weight")]
    pub reuse_weight: f32,
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f32,
    /// Extra mastery for grammar patterns
    #[serde(default = "default_pattern_bonus")]
    pub pattern_bonus: f32,
    /// Occurrences beyond the first needed for full reuse credit
    #[serde(default = "default_reuse_saturation")]
    pub reuse_saturation: f32,
    /// Recency lost per turn since last use
    #[serde(default = "default_recency_decay_per_turn")]
    pub recency_decay_per_turn: f32,
    #[serde(default = "default_learned_blend")]
    pub learned_blend: f32,
    #[serde(default = "default_external_blend")]
    pub external_blend: f32,
    #[serde(default = "default_min_mastery")]
    pub min_mastery: f32,
    #[serde(default = "default_max_mastery")]
    pub max_mastery: f32,
    /// Elements taken from each side when pairing reactivations with mission units
    #[serde(default = "default_mission_pairing_limit")]
    pub mission_pairing_limit: usize,
    /// Minimum relevance for a unit to anchor a mission link
    #[serde(default = "default_mission_link_relevance")]
    pub mission_link_relevance: f32,
}

fn default_degree_cap() -> usize {
    4
}
fn default_mastery_base() -> f32 {
    0.22
}
fn default_confidence_weight() -> f32 {
    0.38
}
fn default_reuse_weight() -> f32 {
    0.30
}
fn default_recency_weight() -> f32 {
    0.10
}
fn default_pattern_bonus() -> f32 {
    0.05
}
fn default_reuse_saturation() -> f32 {
    4.0
}
fn default_recency_decay_per_turn() -> f32 {
    0.08
}
fn default_learned_blend() -> f32 {
    0.65
}
fn default_external_blend() -> f32 {
    0.35
}
fn default_min_mastery() -> f32 {
    0.15
}
fn default_max_mastery() -> f32 {
    1.0
}
fn default_mission_pairing_limit() -> usize {
    2
}
fn default_mission_link_relevance() -> f32 {
    0.55
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            degree_cap: default_degree_cap(),
            mastery_base: default_mastery_base(),
            confidence_weight: default_confidence_weight(),
            reuse_weight: default_reuse_weight(),
            recency_weight: default_recency_weight(),
            pattern_bonus: default_pattern_bonus(),
            reuse_saturation: default_reuse_saturation(),
            recency_decay_per_turn: default_recency_decay_per_turn(),
            learned_blend: default_learned_blend(),
            external_blend: default_external_blend(),
            min_mastery: default_min_mastery(),
            max_mastery: default_max_mastery(),
            mission_pairing_limit: default_mission_pairing_limit(),
            mission_link_relevance: default_mission_link_relevance(),
        }
    }
}

/// Mission checklist targets and hint list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSettings {
    #[serde(default = "default_quality_target")]
    pub quality_target: f32,
    #[serde(default = "default_units_target")]
    pub units_target: usize,
    #[serde(default = "default_turns_target")]
    pub turns_target: u32,
    /// Ordered short task descriptions, indexed by turn number
    #[serde(default = "default_hints")]
    pub hints: Vec<String>,
    #[serde(default = "default_beginner_prefix")]
    pub beginner_prefix: String,
    #[serde(default = "default_advanced_prefix")]
    pub advanced_prefix: String,
    /// CEFR tier (0 = A1, 1 = A2, ...) from which the advanced prefix applies
    #[serde(default = "default_advanced_min_tier")]
    pub advanced_min_tier: u8,
}

fn default_quality_target() -> f32 {
    0.7
}
fn default_units_target() -> usize {
    2
}
fn default_turns_target() -> u32 {
    2
}
fn default_hints() -> Vec<String> {
    vec![
        "Introduce yourself in two short sentences.".to_string(),
        "Talk about what you like and give one reason.".to_string(),
        "Describe your favorite activity in one sentence.".to_string(),
        "Say where you live and what you like there.".to_string(),
        "Ask the tutor one question about their day.".to_string(),
    ]
}
fn default_beginner_prefix() -> String {
    "Mission A1-A2: ".to_string()
}
fn default_advanced_prefix() -> String {
    "Mission A2-B1: ".to_string()
}
fn default_advanced_min_tier() -> u8 {
    1
}

impl Default for MissionSettings {
    fn default() -> Self {
        Self {
            quality_target: default_quality_target(),
            units_target: default_units_target(),
            turns_target: default_turns_target(),
            hints: default_hints(),
            beginner_prefix: default_beginner_prefix(),
            advanced_prefix: default_advanced_prefix(),
            advanced_min_tier: default_advanced_min_tier(),
        }
    }
}

/// All pedagogy tables and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedagogyConfig {
    /// Function words never accepted on their own
    #[serde(default = "default_stopwords")]
    pub stopwords: Vec<String>,
    /// Verb stems that are incomplete without a complement ("je suis", "i like")
    #[serde(default = "default_incomplete_stubs")]
    pub incomplete_stubs: Vec<String>,
    /// Extra words kept out of the graph even when accepted
    #[serde(default = "default_low_signal_words")]
    pub low_signal_words: Vec<String>,
    #[serde(default = "default_heuristic_chunks")]
    pub heuristic_chunks: Vec<HeuristicChunk>,
    /// Maximum single tokens the heuristic extractor returns
    #[serde(default = "default_heuristic_max_tokens")]
    pub heuristic_max_tokens: usize,
    #[serde(default = "default_pattern_rules")]
    pub pattern_rules: Vec<PatternRule>,
    #[serde(default)]
    pub gate: GateThresholds,
    #[serde(default)]
    pub graph: GraphSettings,
    #[serde(default)]
    pub mission: MissionSettings,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_stopwords() -> Vec<String> {
    to_strings(&[
        // French
        "je", "j'", "tu", "il", "elle", "on", "nous", "vous", "ils", "elles", "le", "la",
        "les", "l'", "un", "une", "des", "de", "du", "d'", "et", "ou", "à", "au", "aux", "en",
        "est", "ce", "c'", "que", "qui", "ne", "pas", "se", "me", "te", "mon", "ma", "mes",
        "ton", "ta", "tes", "son", "sa", "ses", "y", "dans", "sur", "pour", "avec", "mais",
        // Spanish
        "yo", "el", "los", "las", "y", "es", "una", "lo", "por", "con", "del", "al", "mi",
        // German
        "ich", "du", "er", "sie", "es", "der", "die", "das", "und", "ist", "ein", "eine",
        "zu", "mit", "nicht",
        // English (mission hints are written in English)
        "i", "you", "the", "a", "an", "and", "is", "to", "of", "in", "it", "about", "with",
        "what", "your", "that", "this", "from", "have", "they", "them", "their", "where",
        "when", "which", "there", "one", "two",
    ])
}

fn default_incomplete_stubs() -> Vec<String> {
    to_strings(&[
        "je suis", "j'aime", "j aime", "je m'appelle", "j'habite", "je veux", "je voudrais",
        "c'est", "il y a", "je vais", "soy", "yo soy", "me gusta", "me llamo", "ich bin",
        "ich mag", "ich heiße", "i am", "i'm", "i like", "my name is",
    ])
}

fn default_low_signal_words() -> Vec<String> {
    to_strings(&[
        "oui", "non", "ok", "okay", "euh", "hmm", "ah", "oh", "bah", "ben", "bon", "alors",
        "si", "sí", "ja", "nein", "yes", "no", "voilà",
    ])
}

fn default_heuristic_chunks() -> Vec<HeuristicChunk> {
    vec![
        HeuristicChunk::new("ça va", &["ça va", "ca va"]),
        HeuristicChunk::new("je m'appelle", &["je m'appelle"]),
        HeuristicChunk::new("j'habite", &["j'habite", "j habite"]),
        HeuristicChunk::new("j'aime", &["j'aime", "j aime"]),
    ]
}

fn default_heuristic_max_tokens() -> usize {
    3
}

fn default_pattern_rules() -> Vec<PatternRule> {
    vec![
        // French
        PatternRule::new("identity_je_suis", &["je suis"], "je suis + [identity]"),
        PatternRule::new("name_je_mappelle", &["je m'appelle"], "je m'appelle + [name]"),
        PatternRule::new("preference_jaime_object", &["j'aime", "j aime"], "j'aime + [object]"),
        PatternRule::new("residence_jhabite", &["j'habite", "j habite"], "j'habite + [place]"),
        PatternRule::new("desire_je_veux", &["je veux", "je voudrais"], "je veux + [object]"),
        // Spanish
        PatternRule::new("identity_soy", &["yo soy", "soy"], "soy + [identity]"),
        PatternRule::new("name_me_llamo", &["me llamo"], "me llamo + [name]"),
        PatternRule::new("preference_me_gusta", &["me gusta", "me gustan"], "me gusta + [object]"),
        // German
        PatternRule::new("identity_ich_bin", &["ich bin"], "ich bin + [identity]"),
        PatternRule::new("name_ich_heisse", &["ich heiße", "ich heisse"], "ich heiße + [name]"),
        PatternRule::new("preference_ich_mag", &["ich mag"], "ich mag + [object]"),
    ]
}

impl Default for PedagogyConfig {
    fn default() -> Self {
        Self {
            stopwords: default_stopwords(),
            incomplete_stubs: default_incomplete_stubs(),
            low_signal_words: default_low_signal_words(),
            heuristic_chunks: default_heuristic_chunks(),
            heuristic_max_tokens: default_heuristic_max_tokens(),
            pattern_rules: default_pattern_rules(),
            gate: GateThresholds::default(),
            graph: GraphSettings::default(),
            mission: MissionSettings::default(),
        }
    }
}

impl PedagogyConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|_| ConfigError::FileNotFound(path.as_ref().display().to_string()))?;

        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;

        tracing::debug!(
            path = %path.as_ref().display(),
            rules = config.pattern_rules.len(),
            stopwords = config.stopwords.len(),
            "Loaded pedagogy configuration"
        );
        Ok(config)
    }

    /// Check thresholds and rule definitions
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gate = &self.gate;
        let unit_interval = [
            ("gate.structural_relevance_floor", gate.structural_relevance_floor),
            ("gate.confidence_both", gate.confidence_both),
            ("gate.confidence_one", gate.confidence_one),
            ("gate.confidence_none", gate.confidence_none),
            ("gate.pattern_confidence_floor", gate.pattern_confidence_floor),
            ("gate.sentence_confidence_floor", gate.sentence_confidence_floor),
            ("gate.min_confidence", gate.min_confidence),
            ("gate.off_mission_confidence", gate.off_mission_confidence),
            ("gate.off_mission_relevance", gate.off_mission_relevance),
            ("gate.chunk_coverage_relevance", gate.chunk_coverage_relevance),
            ("gate.accepted_weight", gate.accepted_weight),
            ("gate.any_accepted_bonus", gate.any_accepted_bonus),
            ("gate.correction_penalty", gate.correction_penalty),
            ("graph.min_mastery", self.graph.min_mastery),
            ("graph.max_mastery", self.graph.max_mastery),
            ("graph.learned_blend", self.graph.learned_blend),
            ("graph.external_blend", self.graph.external_blend),
            ("graph.mission_link_relevance", self.graph.mission_link_relevance),
            ("mission.quality_target", self.mission.quality_target),
        ];
        for (field, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be between 0.0 and 1.0, got {}", value),
                });
            }
        }

        if self.graph.min_mastery > self.graph.max_mastery {
            return Err(ConfigError::InvalidValue {
                field: "graph.min_mastery".to_string(),
                message: "Cannot exceed graph.max_mastery".to_string(),
            });
        }

        if self.graph.degree_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "graph.degree_cap".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.graph.reuse_saturation <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "graph.reuse_saturation".to_string(),
                message: format!("Must be positive, got {}", self.graph.reuse_saturation),
            });
        }

        if self.mission.hints.is_empty() {
            return Err(ConfigError::MissingField("mission.hints".to_string()));
        }

        for rule in &self.pattern_rules {
            if rule.id.trim().is_empty() {
                return Err(ConfigError::MissingField("pattern_rules[].id".to_string()));
            }
            if rule.prefixes.is_empty() && rule.regex.is_none() {
                return Err(ConfigError::InvalidValue {
                    field: format!("pattern_rules.{}", rule.id),
                    message: "Needs at least one prefix or a regex".to_string(),
                });
            }
            if let Some(pattern) = &rule.regex {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                    field: format!("pattern_rules.{}.regex", rule.id),
                    message: e.to_string(),
                })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PedagogyConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.stopwords.iter().any(|s| s == "je"));
        assert!(config.incomplete_stubs.iter().any(|s| s == "je suis"));
        assert_eq!(config.graph.degree_cap, 4);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = PedagogyConfig::default();
        config.gate.min_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_rule_regex() {
        let mut config = PedagogyConfig::default();
        config.pattern_rules.push(PatternRule {
            id: "broken".into(),
            prefixes: vec![],
            regex: Some("(unclosed".into()),
            template: "x + [y]".into(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_hints_rejected() {
        let mut config = PedagogyConfig::default();
        config.mission.hints.clear();
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "stopwords: [yo, el]\npattern_rules:\n  - id: preference_me_encanta\n    prefixes: [\"me encanta\"]\n    template: \"me encanta + [object]\"\ngate:\n  min_confidence: 0.5\n"
        )
        .unwrap();

        let config = PedagogyConfig::load(file.path()).unwrap();
        assert_eq!(config.stopwords, vec!["yo".to_string(), "el".to_string()]);
        assert_eq!(config.pattern_rules.len(), 1);
        assert_eq!(config.gate.min_confidence, 0.5);
        assert_eq!(config.gate.off_mission_confidence, 0.72);
        assert_eq!(config.mission.hints.len(), 5);
    }

    #[test]
    fn test_load_missing_file() {
        let result = PedagogyConfig::load("/nonexistent/pedagogy.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
