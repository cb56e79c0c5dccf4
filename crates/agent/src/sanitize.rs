//! Tutor response sanitization
//!
//! Chat models drift from the response schema: keys go missing, numbers
//! come back as labels, list entries change shape. Everything here coerces
//! instead of failing so a sloppy payload still yields a usable turn.

use std::collections::HashMap;

use lingua_core::{
    CefrLevel, CorrectionItem, ResponseGraphLink, Severity, TutorResponse, VocabularyItem,
};
use serde_json::{Map, Value};

/// Spoken line used when the payload is unusable
pub const FALLBACK_SPOKEN_RESPONSE: &str =
    "Je t'entends. Donne-moi une phrase courte sur ce que tu aimes.";

/// Quality reported by a payload that omits or garbles it
pub const DEFAULT_QUALITY_SCORE: f32 = 0.55;

/// Strip a surrounding markdown code fence (```` ```json ... ``` ````)
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(newline) => &text[newline + 1..],
            None => "",
        };
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped;
    }
    text.trim()
}

/// Parse raw model output into a JSON value
pub fn parse_tutor_payload(text: &str) -> lingua_core::Result<Value> {
    Ok(serde_json::from_str(strip_code_fences(text))?)
}

/// Read a score from a loosely-typed value
///
/// Numbers pass through, booleans map to 1/0, strings may be numeric or one
/// of the labels `high`, `medium`, `low`, `true`, `false`.
pub fn score_of(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            match s.as_str() {
                "high" => Some(0.9),
                "medium" => Some(0.5),
                "low" => Some(0.2),
                "true" => Some(1.0),
                "false" => Some(0.0),
                _ => s.parse::<f32>().ok().filter(|f| f.is_finite()),
            }
        }
        _ => None,
    }
}

/// Score clamped to [0, 1], `default` when missing or unreadable
pub fn coerce_score(value: Option<&Value>, default: f32) -> f32 {
    value
        .and_then(score_of)
        .unwrap_or(default)
        .clamp(0.0, 1.0)
}

/// Coerce a model payload into a [`TutorResponse`]
///
/// A string payload is parsed first (fences stripped). Payloads that are not
/// JSON objects yield the fallback response.
pub fn sanitize_tutor_response(payload: &Value) -> TutorResponse {
    match payload {
        Value::Object(map) => sanitize_object(map),
        Value::String(text) => match parse_tutor_payload(text) {
            Ok(Value::Object(map)) => sanitize_object(&map),
            Ok(_) => {
                tracing::warn!("Tutor payload is not a JSON object, using fallback response");
                fallback_response()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Tutor payload is not valid JSON, using fallback response");
                fallback_response()
            }
        },
        other => {
            tracing::warn!(payload = %other, "Unexpected tutor payload, using fallback response");
            fallback_response()
        }
    }
}

/// Response returned when the model produced nothing usable
pub fn fallback_response() -> TutorResponse {
    let mut response = TutorResponse::spoken(FALLBACK_SPOKEN_RESPONSE);
    response.quality_score = DEFAULT_QUALITY_SCORE;
    response
}

fn sanitize_object(map: &Map<String, Value>) -> TutorResponse {
    let spoken = text_of(map.get("spoken_response"));
    let mut response = TutorResponse::spoken(if spoken.trim().is_empty() {
        FALLBACK_SPOKEN_RESPONSE.to_string()
    } else {
        spoken
    });

    response.translation_hint = text_of(map.get("translation_hint"));
    response.corrected_form = text_of(map.get("corrected_form"));
    response.border_update = text_of(map.get("border_update"));
    response.user_level_assessment = map
        .get("user_level_assessment")
        .and_then(Value::as_str)
        .map(CefrLevel::parse_lenient)
        .unwrap_or_default();

    response.vocabulary_breakdown = array_of(map.get("vocabulary_breakdown"))
        .iter()
        .filter_map(vocabulary_item)
        .collect();
    response.new_elements = string_list(map.get("new_elements"));
    response.reactivated_elements = string_list(map.get("reactivated_elements"));
    response.mastery_scores = mastery_scores(map.get("mastery_scores"));
    response.graph_links = array_of(map.get("graph_links"))
        .iter()
        .filter_map(graph_link)
        .collect();
    response.user_vocabulary = array_of(map.get("user_vocabulary")).to_vec();
    response.corrections = array_of(map.get("corrections"))
        .iter()
        .filter_map(correction_item)
        .collect();
    response.quality_score = coerce_score(map.get("quality_score"), DEFAULT_QUALITY_SCORE);
    response.next_mission_hint = text_of(map.get("next_mission_hint"));

    response
}

fn array_of(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

/// Stringify scalars; null, arrays and objects become empty
fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    array_of(value)
        .iter()
        .map(|v| text_of(Some(v)))
        .filter(|s| !s.trim().is_empty())
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn vocabulary_item(value: &Value) -> Option<VocabularyItem> {
    match value {
        Value::Object(map) => {
            let word = text_of(map.get("word"));
            if word.trim().is_empty() {
                return None;
            }
            Some(VocabularyItem {
                word,
                translation: text_of(map.get("translation")),
                part_of_speech: text_of(map.get("part_of_speech")),
            })
        }
        Value::Null => None,
        other => {
            let word = text_of(Some(other));
            (!word.trim().is_empty()).then(|| VocabularyItem::bare(word))
        }
    }
}

fn graph_link(value: &Value) -> Option<ResponseGraphLink> {
    let map = value.as_object()?;
    let source = text_of(map.get("source"));
    let target = text_of(map.get("target"));
    if source.trim().is_empty() || target.trim().is_empty() {
        return None;
    }
    Some(ResponseGraphLink {
        source,
        target,
        link_type: text_of(map.get("type")),
    })
}

fn correction_item(value: &Value) -> Option<CorrectionItem> {
    let map = value.as_object()?;
    let severity = match map.get("severity") {
        Some(Value::String(s)) if s.eq_ignore_ascii_case("major") => Severity::Major,
        Some(Value::String(_)) | None => Severity::Minor,
        Some(other) if is_truthy(other) => Severity::Major,
        Some(_) => Severity::Minor,
    };
    Some(CorrectionItem {
        as_said: text_of(map.get("as_said")),
        corrected: text_of(map.get("corrected")),
        rule: text_of(map.get("rule")),
        severity,
    })
}

fn mastery_scores(value: Option<&Value>) -> HashMap<String, f32> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, v)| score_of(v).map(|s| (key.clone(), s.clamp(0.0, 1.0))))
            .collect(),
        _ => HashMap::new(),
    }
}
