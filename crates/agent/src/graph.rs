//! Knowledge graph builder
//!
//! Re-derives the whole graph from the turn history on every read. Nothing
//! is cached: the history is the only source of truth.
//!
//! Steps:
//! 1. collect accepted units per turn and drop pedagogically useless ones
//! 2. aggregate them into nodes with blended mastery
//! 3. merge links from three strategies, dedupe by endpoint pair
//! 4. apply the degree cap

use std::collections::{HashMap, HashSet};

use lingua_config::{GraphSettings, PedagogyConfig};
use lingua_core::{
    CefrLevel, ConversationTurn, GraphLink, GraphNode, KnowledgeGraph, NodeType, Relationship,
    UnitKind, ValidatedUnit,
};
use lingua_text_processing::{comparison_key, fold_accents, grapheme_len, normalize, unit_tokens};

/// Stable node id for a unit text
///
/// Folded, apostrophes dropped, every other non-alphanumeric run collapsed to
/// a single underscore: `ça va` becomes `ca_va`, `j'aime + [object]` becomes
/// `jaime_object`.
pub fn node_id(text: &str) -> String {
    let folded = fold_accents(&normalize(text));
    let mut id = String::with_capacity(folded.len());
    let mut pending_sep = false;
    for c in folded.chars() {
        if c == '\'' {
            continue;
        }
        if c.is_alphanumeric() {
            if pending_sep && !id.is_empty() {
                id.push('_');
            }
            pending_sep = false;
            id.push(c);
        } else {
            pending_sep = true;
        }
    }
    id
}

/// Map a model-declared link type onto a relationship
pub fn relationship_for(link_type: &str) -> Relationship {
    match normalize(link_type).as_str() {
        "conjugation" => Relationship::Conjugation,
        "prerequisite" | "correction" | "derivation" | "extension" => Relationship::Prerequisite,
        "reactivation" => Relationship::Reactivation,
        "mission" => Relationship::Mission,
        _ => Relationship::Semantic,
    }
}

/// One accepted unit in one turn, after filtering
#[derive(Debug, Clone)]
struct Occurrence<'a> {
    node_id: String,
    turn: u32,
    unit: &'a ValidatedUnit,
}

#[derive(Debug, Clone)]
struct NodeStats {
    label: String,
    kind: UnitKind,
    first_turn: u32,
    last_turn: u32,
    level: CefrLevel,
    occurrences: u32,
    confidence_sum: f32,
    turns: HashSet<u32>,
}

#[derive(Debug, Clone)]
pub struct GraphBuilder {
    settings: GraphSettings,
    /// Comparison keys never surfaced as nodes
    excluded: HashSet<String>,
}

impl GraphBuilder {
    pub fn new(settings: GraphSettings, low_signal: &[String], stopwords: &[String]) -> Self {
        let excluded = low_signal
            .iter()
            .chain(stopwords.iter())
            .map(|w| comparison_key(w))
            .collect();
        Self { settings, excluded }
    }

    pub fn from_config(config: &PedagogyConfig) -> Self {
        Self::new(
            config.graph.clone(),
            &config.low_signal_words,
            &config.stopwords,
        )
    }

    /// Build the graph for a history snapshot
    ///
    /// `current_turn` is the last completed turn; `external_mastery` is the
    /// model-reported score map, matched on folded text.
    pub fn build(
        &self,
        history: &[ConversationTurn],
        external_mastery: &HashMap<String, f32>,
        current_turn: u32,
    ) -> KnowledgeGraph {
        if history.is_empty() {
            return KnowledgeGraph::default();
        }

        let occurrences = self.collect_occurrences(history);
        let (order, stats) = aggregate(history, &occurrences);

        let external: HashMap<String, f32> = external_mastery
            .iter()
            .map(|(text, score)| (comparison_key(text), *score))
            .collect();

        let nodes: Vec<GraphNode> = order
            .iter()
            .filter_map(|id| stats.get(id).map(|s| (id, s)))
            .map(|(id, s)| GraphNode {
                id: id.clone(),
                label: s.label.clone(),
                node_type: NodeType::from(s.kind),
                mastery: self.mastery(s, external.get(&comparison_key(&s.label)).copied(), current_turn),
                level: s.level,
                turn_introduced: s.first_turn,
                usage_count: s.turns.len() as u32,
            })
            .collect();

        let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut links = self.explicit_links(history, &node_ids, &stats);
        links.extend(self.shared_key_links(&occurrences, &stats));
        links.extend(self.mission_links(history, &occurrences, &node_ids, &stats));

        let links = self.cap_degree(dedupe(links));

        tracing::debug!(
            turns = history.len(),
            nodes = nodes.len(),
            links = links.len(),
            "Knowledge graph rebuilt"
        );

        KnowledgeGraph { nodes, links }
    }

    /// Accepted units surviving the pedagogical filter, in history order
    fn collect_occurrences<'a>(&self, history: &'a [ConversationTurn]) -> Vec<Occurrence<'a>> {
        let accepted: Vec<(u32, &ValidatedUnit)> = history
            .iter()
            .flat_map(|turn| turn.response.accepted_units().map(move |u| (turn.turn_number, u)))
            .filter(|(_, u)| grapheme_len(&u.text) > 1)
            .filter(|(_, u)| !self.excluded.contains(&comparison_key(&u.text)))
            .collect();

        // Tokens of every multi-token unit that survives; single words
        // already inside one of them add nothing to the graph.
        let phrase_tokens: HashSet<String> = accepted
            .iter()
            .map(|(_, u)| unit_tokens(&u.text))
            .filter(|tokens| tokens.len() > 1)
            .flatten()
            .collect();

        accepted
            .into_iter()
            .filter(|(_, u)| {
                let tokens = unit_tokens(&u.text);
                !(tokens.len() == 1 && phrase_tokens.contains(&tokens[0]))
            })
            .filter_map(|(turn, unit)| {
                let id = node_id(&unit.text);
                (!id.is_empty()).then_some(Occurrence {
                    node_id: id,
                    turn,
                    unit,
                })
            })
            .collect()
    }

    fn mastery(&self, stats: &NodeStats, external: Option<f32>, current_turn: u32) -> f32 {
        let g = &self.settings;
        let avg_confidence = stats.confidence_sum / stats.occurrences.max(1) as f32;
        let reuse = ((stats.occurrences.saturating_sub(1)) as f32 / g.reuse_saturation).min(1.0);
        let elapsed = current_turn.saturating_sub(stats.last_turn) as f32;
        let recency = (1.0 - g.recency_decay_per_turn * elapsed).max(0.0);

        let mut learned = g.mastery_base
            + avg_confidence * g.confidence_weight
            + reuse * g.reuse_weight
            + recency * g.recency_weight;
        if stats.kind == UnitKind::Pattern {
            learned += g.pattern_bonus;
        }

        let blended = match external {
            Some(score) => g.learned_blend * learned + g.external_blend * score.clamp(0.0, 1.0),
            None => learned,
        };
        blended.clamp(g.min_mastery, g.max_mastery)
    }

    /// Links the tutor model declared, kept when both endpoints are nodes
    fn explicit_links(
        &self,
        history: &[ConversationTurn],
        node_ids: &HashSet<&str>,
        stats: &HashMap<String, NodeStats>,
    ) -> Vec<GraphLink> {
        let mut links = Vec::new();
        for turn in history {
            for declared in &turn.response.graph_links {
                let source = node_id(&declared.source);
                let target = node_id(&declared.target);
                if source == target
                    || !node_ids.contains(source.as_str())
                    || !node_ids.contains(target.as_str())
                {
                    continue;
                }
                let relationship = relationship_for(&declared.link_type);
                links.push(GraphLink {
                    reason: format!("{} link from the tutor", relationship),
                    reason_detail: format!(
                        "The tutor connected \"{}\" to \"{}\" ({})",
                        label_of(stats, &source),
                        label_of(stats, &target),
                        if declared.link_type.is_empty() { "unspecified" } else { declared.link_type.as_str() }
                    ),
                    evidence_units: vec![label_of(stats, &source), label_of(stats, &target)],
                    source,
                    target,
                    relationship,
                    turn_introduced: turn.turn_number,
                });
            }
        }
        links
    }

    /// Chain distinct nodes that share a canonical key within one turn
    ///
    /// Turns validated here hold one unit per key, so these links only come
    /// from histories whose unit lists were produced elsewhere.
    fn shared_key_links(
        &self,
        occurrences: &[Occurrence<'_>],
        stats: &HashMap<String, NodeStats>,
    ) -> Vec<GraphLink> {
        let mut groups: Vec<((u32, &str), Vec<&str>)> = Vec::new();
        for occ in occurrences {
            let group_key = (occ.turn, occ.unit.canonical_key.as_str());
            match groups.iter_mut().find(|(key, _)| *key == group_key) {
                Some((_, ids)) => {
                    if !ids.contains(&occ.node_id.as_str()) {
                        ids.push(occ.node_id.as_str());
                    }
                }
                None => groups.push((group_key, vec![occ.node_id.as_str()])),
            }
        }

        let mut links = Vec::new();
        for ((turn, key), ids) in groups {
            let relationship = if key.starts_with("pattern:") {
                Relationship::Conjugation
            } else {
                Relationship::Semantic
            };
            for pair in ids.windows(2) {
                links.push(GraphLink {
                    source: pair[0].to_string(),
                    target: pair[1].to_string(),
                    relationship,
                    reason: "Variants of the same unit".to_string(),
                    reason_detail: format!("Both grouped under {}", key),
                    evidence_units: vec![label_of(stats, pair[0]), label_of(stats, pair[1])],
                    turn_introduced: turn,
                });
            }
        }
        links
    }

    /// Pair reactivated elements with mission-relevant units of the same turn
    fn mission_links(
        &self,
        history: &[ConversationTurn],
        occurrences: &[Occurrence<'_>],
        node_ids: &HashSet<&str>,
        stats: &HashMap<String, NodeStats>,
    ) -> Vec<GraphLink> {
        let g = &self.settings;
        let mut links = Vec::new();

        for turn in history {
            let reactivated: Vec<&String> = turn
                .response
                .reactivated_elements
                .iter()
                .take(g.mission_pairing_limit)
                .collect();
            if reactivated.is_empty() {
                continue;
            }

            let mission_units: Vec<&Occurrence<'_>> = occurrences
                .iter()
                .filter(|o| o.turn == turn.turn_number)
                .filter(|o| o.unit.mission_relevance >= g.mission_link_relevance)
                .take(g.mission_pairing_limit)
                .collect();

            for element in &reactivated {
                let source = node_id(element);
                if !node_ids.contains(source.as_str()) {
                    continue;
                }
                for occ in &mission_units {
                    if comparison_key(element) == comparison_key(&occ.unit.text) || source == occ.node_id {
                        continue;
                    }
                    links.push(GraphLink {
                        source: source.clone(),
                        target: occ.node_id.clone(),
                        relationship: Relationship::Mission,
                        reason: "Reused while working on the mission".to_string(),
                        reason_detail: format!(
                            "\"{}\" came back while practising \"{}\"",
                            label_of(stats, &source),
                            occ.unit.text
                        ),
                        evidence_units: vec![label_of(stats, &source), occ.unit.text.clone()],
                        turn_introduced: turn.turn_number,
                    });
                }
            }
        }
        links
    }

    /// Keep links greedily by priority while both endpoints are under the cap
    fn cap_degree(&self, mut links: Vec<GraphLink>) -> Vec<GraphLink> {
        links.sort_by(|a, b| {
            b.relationship
                .priority()
                .cmp(&a.relationship.priority())
                .then(b.turn_introduced.cmp(&a.turn_introduced))
        });

        let mut degree: HashMap<String, usize> = HashMap::new();
        let mut kept = Vec::with_capacity(links.len());
        for link in links {
            let source_degree = degree.get(&link.source).copied().unwrap_or(0);
            let target_degree = degree.get(&link.target).copied().unwrap_or(0);
            if source_degree >= self.settings.degree_cap || target_degree >= self.settings.degree_cap {
                continue;
            }
            *degree.entry(link.source.clone()).or_insert(0) += 1;
            *degree.entry(link.target.clone()).or_insert(0) += 1;
            kept.push(link);
        }
        kept
    }
}

/// Per-node statistics, with node ids in first-seen order
fn aggregate(
    history: &[ConversationTurn],
    occurrences: &[Occurrence<'_>],
) -> (Vec<String>, HashMap<String, NodeStats>) {
    let levels: HashMap<u32, CefrLevel> = history
        .iter()
        .map(|t| (t.turn_number, t.response.user_level_assessment))
        .collect();

    let mut order = Vec::new();
    let mut stats: HashMap<String, NodeStats> = HashMap::new();
    for occ in occurrences {
        let entry = stats.entry(occ.node_id.clone()).or_insert_with(|| {
            order.push(occ.node_id.clone());
            NodeStats {
                label: occ.unit.text.clone(),
                kind: occ.unit.kind,
                first_turn: occ.turn,
                last_turn: occ.turn,
                level: levels.get(&occ.turn).copied().unwrap_or_default(),
                occurrences: 0,
                confidence_sum: 0.0,
                turns: HashSet::new(),
            }
        });
        entry.occurrences += 1;
        entry.confidence_sum += occ.unit.confidence;
        entry.last_turn = entry.last_turn.max(occ.turn);
        if occ.turn < entry.first_turn {
            entry.first_turn = occ.turn;
            entry.level = levels.get(&occ.turn).copied().unwrap_or_default();
        }
        if occ.unit.kind.precedence() > entry.kind.precedence() {
            entry.kind = occ.unit.kind;
        }
        entry.turns.insert(occ.turn);
    }
    (order, stats)
}

/// One link per unordered pair, keeping the higher (priority, turn)
fn dedupe(links: Vec<GraphLink>) -> Vec<GraphLink> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut unique: Vec<GraphLink> = Vec::new();
    for link in links {
        let key = link.pair_key();
        match index.get(&key) {
            Some(&i) => {
                let current = &unique[i];
                let rank = (link.relationship.priority(), link.turn_introduced);
                if rank > (current.relationship.priority(), current.turn_introduced) {
                    unique[i] = link;
                }
            }
            None => {
                index.insert(key, unique.len());
                unique.push(link);
            }
        }
    }
    unique
}

fn label_of(stats: &HashMap<String, NodeStats>, id: &str) -> String {
    stats
        .get(id)
        .map(|s| s.label.clone())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_core::{ResponseGraphLink, TutorResponse, UnitSource};

    fn builder() -> GraphBuilder {
        GraphBuilder::from_config(&PedagogyConfig::default())
    }

    fn accepted(text: &str, kind: UnitKind, confidence: f32, relevance: f32) -> ValidatedUnit {
        let key = if kind == UnitKind::Pattern {
            format!("pattern:{}", node_id(text))
        } else {
            format!("{}:{}", kind, text)
        };
        ValidatedUnit {
            text: text.to_string(),
            kind,
            source: UnitSource::AsSaid,
            confidence,
            is_accepted: true,
            reject_reason: None,
            canonical_key: key,
            mission_relevance: relevance,
        }
    }

    fn turn(number: u32, units: Vec<ValidatedUnit>) -> ConversationTurn {
        let mut response = TutorResponse::spoken("Très bien !");
        response.validated_user_units = units;
        ConversationTurn {
            turn_number: number,
            user_said: String::new(),
            response,
        }
    }

    fn link(source: &str, target: &str, link_type: &str) -> ResponseGraphLink {
        ResponseGraphLink {
            source: source.to_string(),
            target: target.to_string(),
            link_type: link_type.to_string(),
        }
    }

    #[test]
    fn test_node_id() {
        assert_eq!(node_id("Ça va"), "ca_va");
        assert_eq!(node_id("j'aime + [object]"), "jaime_object");
        assert_eq!(node_id("  Bonjour! "), "bonjour");
        assert_eq!(node_id("?!"), "");
    }

    #[test]
    fn test_relationship_table() {
        assert_eq!(relationship_for("derivation"), Relationship::Prerequisite);
        assert_eq!(relationship_for("Extension"), Relationship::Prerequisite);
        assert_eq!(relationship_for("mission"), Relationship::Mission);
        assert_eq!(relationship_for("synonym"), Relationship::Semantic);
        assert_eq!(relationship_for(""), Relationship::Semantic);
    }

    #[test]
    fn test_empty_history() {
        let graph = builder().build(&[], &HashMap::new(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_mastery_from_two_occurrences() {
        let history = vec![
            turn(1, vec![accepted("bonjour", UnitKind::Word, 0.9, 0.0)]),
            turn(2, vec![accepted("bonjour", UnitKind::Word, 0.75, 0.0)]),
        ];
        let graph = builder().build(&history, &HashMap::new(), 2);
        let node = graph.node("bonjour").unwrap();
        // 0.22 + 0.825 * 0.38 + 0.25 * 0.30 + 1.0 * 0.10
        assert!((node.mastery - 0.7085).abs() < 1e-4);
        assert_eq!(node.turn_introduced, 1);
        assert_eq!(node.usage_count, 2);
    }

    #[test]
    fn test_mastery_blends_external_score_and_decays() {
        let history = vec![turn(1, vec![accepted("ça va", UnitKind::Chunk, 0.75, 0.0)])];
        let mut external = HashMap::new();
        external.insert("ca va".to_string(), 1.0);

        let graph = builder().build(&history, &external, 6);
        let node = graph.node("ca_va").unwrap();
        // learned = 0.22 + 0.285 + 0 + 0.6 * 0.10 = 0.565
        let expected = 0.65 * 0.565 + 0.35 * 1.0;
        assert!((node.mastery - expected).abs() < 1e-4);
    }

    #[test]
    fn test_mastery_floor() {
        let history = vec![turn(1, vec![accepted("bonjour", UnitKind::Word, 0.0, 0.0)])];
        let mut external = HashMap::new();
        external.insert("bonjour".to_string(), 0.0);
        let graph = builder().build(&history, &external, 40);
        assert_eq!(graph.nodes[0].mastery, 0.15);
    }

    #[test]
    fn test_pedagogical_filter() {
        let history = vec![turn(
            1,
            vec![
                accepted("ça va", UnitKind::Chunk, 0.75, 0.0),
                accepted("ca", UnitKind::Word, 0.75, 0.0),
                accepted("va", UnitKind::Word, 0.75, 0.0),
                accepted("oui", UnitKind::Word, 0.75, 0.0),
                accepted("x", UnitKind::Word, 0.75, 0.0),
                accepted("merci", UnitKind::Word, 0.75, 0.0),
            ],
        )];
        let graph = builder().build(&history, &HashMap::new(), 1);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["ca_va", "merci"]);
    }

    #[test]
    fn test_rejected_units_are_ignored() {
        let mut unit = accepted("fromage", UnitKind::Word, 0.55, 0.0);
        unit.is_accepted = false;
        let graph = builder().build(&[turn(1, vec![unit])], &HashMap::new(), 1);
        assert!(graph.nodes.is_empty());
    }

    #[test]
    fn test_explicit_link_requires_both_endpoints() {
        let mut t = turn(
            1,
            vec![
                accepted("bonjour", UnitKind::Word, 0.75, 0.0),
                accepted("merci", UnitKind::Word, 0.75, 0.0),
            ],
        );
        t.response.graph_links = vec![
            link("bonjour", "merci", "semantic"),
            link("au revoir", "bonjour", "semantic"),
            link("bonjour", "bonjour", "semantic"),
        ];
        let graph = builder().build(&[t], &HashMap::new(), 1);
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].source, "bonjour");
        assert_eq!(graph.links[0].target, "merci");
        assert_eq!(graph.links[0].evidence_units.len(), 2);
    }

    #[test]
    fn test_mission_links() {
        let mut t = turn(
            2,
            vec![
                accepted("bonjour", UnitKind::Word, 0.75, 0.0),
                accepted("je m'appelle + [name]", UnitKind::Pattern, 0.82, 0.7),
            ],
        );
        t.response.reactivated_elements = vec!["Bonjour".to_string(), "inconnu".to_string()];
        let graph = builder().build(&[t], &HashMap::new(), 2);
        assert_eq!(graph.links.len(), 1);
        let link = &graph.links[0];
        assert_eq!(link.relationship, Relationship::Mission);
        assert_eq!(link.source, "bonjour");
        assert_eq!(link.target, "je_mappelle_name");
    }

    fn keyed(text: &str, kind: UnitKind, key: &str) -> ValidatedUnit {
        let mut unit = accepted(text, kind, 0.85, 0.0);
        unit.canonical_key = key.to_string();
        unit
    }

    #[test]
    fn test_shared_key_links() {
        let t = turn(
            1,
            vec![
                keyed("je suis étudiant", UnitKind::Pattern, "pattern:identity_je_suis"),
                keyed("je suis content", UnitKind::Pattern, "pattern:identity_je_suis"),
                keyed("bonne nuit", UnitKind::Chunk, "chunk:bonne nuit"),
                keyed("bonne soirée", UnitKind::Chunk, "chunk:bonne nuit"),
            ],
        );
        let graph = builder().build(&[t], &HashMap::new(), 1);
        assert_eq!(graph.links.len(), 2);

        let conjugation: Vec<&GraphLink> = graph
            .links
            .iter()
            .filter(|l| l.relationship == Relationship::Conjugation)
            .collect();
        assert_eq!(conjugation.len(), 1);
        assert_eq!(conjugation[0].source, "je_suis_etudiant");
        assert_eq!(conjugation[0].target, "je_suis_content");

        let semantic: Vec<&GraphLink> = graph
            .links
            .iter()
            .filter(|l| l.relationship == Relationship::Semantic)
            .collect();
        assert_eq!(semantic.len(), 1);
        assert_eq!(semantic[0].source, "bonne_nuit");
        assert_eq!(semantic[0].target, "bonne_soiree");
    }

    #[test]
    fn test_shared_key_links_stay_within_a_turn() {
        let history = vec![
            turn(1, vec![keyed("je suis étudiant", UnitKind::Pattern, "pattern:identity_je_suis")]),
            turn(2, vec![keyed("je suis content", UnitKind::Pattern, "pattern:identity_je_suis")]),
        ];
        let graph = builder().build(&history, &HashMap::new(), 2);
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_dedupe_keeps_higher_priority() {
        let mut t = turn(
            1,
            vec![
                accepted("bonjour", UnitKind::Word, 0.75, 0.0),
                accepted("merci", UnitKind::Word, 0.75, 0.0),
            ],
        );
        t.response.graph_links = vec![
            link("bonjour", "merci", "semantic"),
            link("merci", "bonjour", "reactivation"),
        ];
        let graph = builder().build(&[t], &HashMap::new(), 1);
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].relationship, Relationship::Reactivation);
    }

    #[test]
    fn test_degree_cap() {
        let words = ["bonjour", "merci", "salut", "chat", "chien", "maison", "soleil"];
        let mut t = turn(
            1,
            words
                .iter()
                .map(|w| accepted(w, UnitKind::Word, 0.75, 0.0))
                .collect(),
        );
        t.response.graph_links = words[1..]
            .iter()
            .map(|w| link("bonjour", w, "semantic"))
            .collect();
        let graph = builder().build(&[t], &HashMap::new(), 1);
        assert_eq!(graph.degree("bonjour"), 4);
        assert_eq!(graph.links.len(), 4);
    }

    #[test]
    fn test_degree_cap_prefers_priority() {
        let words = ["bonjour", "merci", "salut", "chat", "chien", "maison"];
        let mut t = turn(
            1,
            words
                .iter()
                .map(|w| accepted(w, UnitKind::Word, 0.75, 0.0))
                .collect(),
        );
        t.response.graph_links = vec![
            link("bonjour", "merci", "semantic"),
            link("bonjour", "salut", "semantic"),
            link("bonjour", "chat", "semantic"),
            link("bonjour", "chien", "semantic"),
            link("bonjour", "maison", "mission"),
        ];
        let graph = builder().build(&[t], &HashMap::new(), 1);
        assert!(graph
            .links
            .iter()
            .any(|l| l.target == "maison" && l.relationship == Relationship::Mission));
        assert_eq!(graph.degree("bonjour"), 4);
    }
}
