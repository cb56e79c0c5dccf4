//! Knowledge graph types surfaced to the learner
//!
//! Nodes and links are derived data: the graph builder recomputes them from
//! the turn history on every read, so nothing here is persisted on its own.

use serde::{Deserialize, Serialize};

use crate::level::CefrLevel;
use crate::units::UnitKind;

/// Node category, derived from the originating unit kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Vocab,
    Sentence,
    Grammar,
}

impl From<UnitKind> for NodeType {
    fn from(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Word | UnitKind::Chunk => NodeType::Vocab,
            UnitKind::Sentence => NodeType::Sentence,
            UnitKind::Pattern => NodeType::Grammar,
        }
    }
}

/// A vocabulary item or structure node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable slug of the normalized text
    pub id: String,
    /// Display text
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Blended mastery (0.15 - 1.0)
    pub mastery: f32,
    /// Level reported on the turn that introduced the node
    pub level: CefrLevel,
    pub turn_introduced: u32,
    /// Number of turns in which the learner used this unit
    pub usage_count: u32,
}

/// Relationship type between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Semantic,
    Conjugation,
    Prerequisite,
    Reactivation,
    Mission,
}

impl Relationship {
    /// Priority used when the degree cap forces a choice
    pub fn priority(&self) -> u8 {
        match self {
            Relationship::Mission => 5,
            Relationship::Reactivation => 4,
            Relationship::Prerequisite => 3,
            Relationship::Conjugation => 2,
            Relationship::Semantic => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Semantic => "semantic",
            Relationship::Conjugation => "conjugation",
            Relationship::Prerequisite => "prerequisite",
            Relationship::Reactivation => "reactivation",
            Relationship::Mission => "mission",
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed edge between two node ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub relationship: Relationship,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub reason_detail: String,
    /// At most two evidence strings
    #[serde(default)]
    pub evidence_units: Vec<String>,
    pub turn_introduced: u32,
}

impl GraphLink {
    /// Unordered endpoint pair, used for deduplication
    pub fn pair_key(&self) -> (String, String) {
        if self.source <= self.target {
            (self.source.clone(), self.target.clone())
        } else {
            (self.target.clone(), self.source.clone())
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Nodes and links for one graph read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl KnowledgeGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of links touching a node
    pub fn degree(&self, id: &str) -> usize {
        self.links.iter().filter(|l| l.touches(id)).count()
    }
}
