//! Property tests for the gate and the graph builder

use std::collections::HashMap;

use proptest::prelude::*;
use serde_json::Value;

use lingua_agent::{validate_turn, GraphBuilder, ValidationGate};
use lingua_config::PedagogyConfig;
use lingua_core::{
    CanonicalUnit, CefrLevel, ConversationTurn, ResponseGraphLink, TurnInput, TutorResponse,
    UnitKind, UnitSource, ValidatedUnit,
};

const POOL: [&str; 12] = [
    "bonjour", "merci", "chocolat", "football", "lyon", "paris", "musique", "chat",
    "ça va", "le chocolat", "mon sport", "je m'appelle paul",
];

fn unit(text: &str) -> CanonicalUnit {
    let kind = if text.contains(' ') { UnitKind::Chunk } else { UnitKind::Word };
    CanonicalUnit::lexical(text, kind, UnitSource::AsSaid)
}

fn history_strategy() -> impl Strategy<Value = Vec<ConversationTurn>> {
    let turn = (
        prop::collection::vec((0..POOL.len(), 0.0f32..=1.0), 1..6),
        prop::collection::vec((0..POOL.len(), 0..POOL.len(), "[a-z]{0,12}"), 0..8),
    );
    prop::collection::vec(turn, 1..8).prop_map(|turns| {
        turns
            .into_iter()
            .enumerate()
            .map(|(i, (units, links))| {
                let mut response = TutorResponse::spoken("Très bien !");
                response.validated_user_units = units
                    .into_iter()
                    .map(|(idx, confidence)| ValidatedUnit::accepted(&unit(POOL[idx]), confidence, 0.5))
                    .collect();
                response.graph_links = links
                    .into_iter()
                    .map(|(s, t, link_type)| ResponseGraphLink {
                        source: POOL[s].to_string(),
                        target: POOL[t].to_string(),
                        link_type,
                    })
                    .collect();
                ConversationTurn {
                    turn_number: i as u32 + 1,
                    user_said: String::new(),
                    response,
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn degree_never_exceeds_cap(history in history_strategy()) {
        let builder = GraphBuilder::from_config(&PedagogyConfig::default());
        let current = history.len() as u32;
        let graph = builder.build(&history, &HashMap::new(), current);
        for node in &graph.nodes {
            prop_assert!(graph.degree(&node.id) <= 4, "node {} has degree {}", node.id, graph.degree(&node.id));
        }
    }

    #[test]
    fn mastery_stays_in_bounds(
        history in history_strategy(),
        external in prop::collection::hash_map(prop::sample::select(POOL.to_vec()), -2.0f32..3.0, 0..6),
        extra_turns in 0u32..40,
    ) {
        let builder = GraphBuilder::from_config(&PedagogyConfig::default());
        let external: HashMap<String, f32> = external.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let current = history.len() as u32 + extra_turns;
        let graph = builder.build(&history, &external, current);
        for node in &graph.nodes {
            prop_assert!((0.15..=1.0).contains(&node.mastery), "mastery {} out of range", node.mastery);
        }
    }

    #[test]
    fn unit_scores_stay_in_unit_interval(
        raw in "[a-zA-Zàéç' ]{0,40}",
        corrected in "[a-zA-Zàéç' .]{0,40}",
        picks in prop::collection::vec(0..POOL.len(), 0..6),
    ) {
        let input = TurnInput {
            raw_utterance: raw,
            ai_proposed_vocabulary: picks.into_iter().map(|i| Value::from(POOL[i])).collect(),
            corrected_form: corrected,
            mission_hint: "Talk about your favorite sport".to_string(),
            current_turn_number: 1,
            current_level: CefrLevel::A1,
        };
        let outcome = validate_turn(&input, &PedagogyConfig::default());
        prop_assert!((0.0..=1.0).contains(&outcome.quality_score));
        for u in outcome.all_units() {
            prop_assert!((0.0..=1.0).contains(&u.confidence));
            prop_assert!((0.0..=1.0).contains(&u.mission_relevance));
            prop_assert_eq!(u.is_accepted, u.reject_reason.is_none());
        }
    }

    #[test]
    fn quality_is_monotonic_in_accepted_units(
        total in 1usize..20,
        a in 0usize..20,
        b in 0usize..20,
        changed in any::<bool>(),
    ) {
        let gate = ValidationGate::from_config(&PedagogyConfig::default());
        let (low, high) = if a <= b { (a.min(total), b.min(total)) } else { (b.min(total), a.min(total)) };
        prop_assert!(gate.quality_score(low, total, changed) <= gate.quality_score(high, total, changed));
    }
}
