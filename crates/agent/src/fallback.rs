//! Rule-based tutor
//!
//! Stands in for the tutor model when none is configured or the configured
//! one fails. It never proposes vocabulary, so the canonicalizer falls back
//! to its own heuristics for the learner's units.

use async_trait::async_trait;
use lingua_config::PedagogyConfig;
use lingua_core::{TutorModel, TutorRequest};
use lingua_text_processing::HeuristicExtractor;
use serde_json::{json, Value};

/// Quoted word when nothing could be extracted from the utterance
const DEFAULT_QUOTE: &str = "bonjour";

/// (spoken, translation) templates; `{}` is replaced by the quoted unit
const TEMPLATES: [(&str, &str); 6] = [
    (
        "Ah, « {} » ! Moi aussi. Et toi, comment tu t'appelles ?",
        "Ah, '{}'! Me too. And you, what's your name?",
    ),
    (
        "Super, « {} » ! Moi, j'adore Paris. Et toi, tu habites où ?",
        "Great, '{}'! I love Paris. And you, where do you live?",
    ),
    (
        "Oh, « {} », c'est intéressant ! Qu'est-ce que tu fais dans la vie ?",
        "Oh, '{}', that's interesting! What do you do for a living?",
    ),
    (
        "J'aime bien « {} » ! Et qu'est-ce que tu aimes manger ?",
        "I like '{}'! And what do you like to eat?",
    ),
    (
        "Ah oui, « {} » ! Moi, j'aime beaucoup le chocolat. Et toi, qu'est-ce que tu aimes ?",
        "Oh yes, '{}'! I really love chocolate. And you, what do you like?",
    ),
    (
        "Très bien ! « {} ». Et aujourd'hui, tu as fait quoi ?",
        "Very good! '{}'. And today, what did you do?",
    ),
];

#[derive(Debug, Clone)]
pub struct RuleBasedTutor {
    heuristic: HeuristicExtractor,
}

impl RuleBasedTutor {
    pub fn new(heuristic: HeuristicExtractor) -> Self {
        Self { heuristic }
    }

    pub fn from_config(config: &PedagogyConfig) -> Self {
        Self::new(HeuristicExtractor::from_config(config))
    }

    /// Build the templated payload for one request
    pub fn respond(&self, request: &TutorRequest) -> Value {
        let units = self.heuristic.extract(&request.user_text);
        let quote = units.first().map(String::as_str).unwrap_or(DEFAULT_QUOTE);
        let (spoken, hint) = TEMPLATES[request.turn_number as usize % TEMPLATES.len()];

        json!({
            "spoken_response": spoken.replace("{}", quote),
            "translation_hint": hint.replace("{}", quote),
            "corrected_form": "",
            "user_vocabulary": [],
            "vocabulary_breakdown": [],
            "graph_links": [],
            "user_level_assessment": request.level.as_str(),
        })
    }
}

#[async_trait]
impl TutorModel for RuleBasedTutor {
    async fn generate(&self, request: &TutorRequest) -> lingua_core::Result<Value> {
        Ok(self.respond(request))
    }

    fn model_name(&self) -> &str {
        "rule-based"
    }
}
