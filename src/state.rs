//! Mutable simulation state threaded through the pipeline stages.

use serde::{Deserialize, Serialize};

use crate::config::EnergyConfig;
use crate::element::FiveElement;
use crate::node::{EnergyNode, NodeFlags, NodeSnapshot};

/// Direction of influence carried by a relation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Mother element feeds its child element.
    Generative,
    /// Controlling element suppresses its subject element.
    Controlling,
}

/// A directed relation between two nodes, anchored on the source node's
/// acting element. The target element follows from the relation kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationEdge {
    /// Index of the acting node.
    pub source: usize,
    /// Index of the affected node.
    pub target: usize,
    /// The element on the source node that acts through this edge.
    pub element: FiveElement,
    /// Generative or controlling.
    pub kind: RelationKind,
}

impl RelationEdge {
    /// The element on the target node affected by this edge.
    #[must_use]
    pub const fn target_element(&self) -> FiveElement {
        match self.kind {
            RelationKind::Generative => self.element.generates(),
            RelationKind::Controlling => self.element.controls(),
        }
    }
}

/// The fixed pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Node construction, root/qi gain, seasonal correction, penetration.
    Init,
    /// Six-clash marking.
    Clash,
    /// Branch combinations and stem pairings.
    Combine,
    /// Punishments, harms, and self-punishments.
    PunishHarm,
    /// Relation network construction.
    Relations,
    /// Five-element cycle detection.
    Cycle,
    /// Pre-transfer snapshot capture.
    RawSnapshot,
    /// Generative transfer pass.
    Generate,
    /// Restraining transfer pass.
    Control,
    /// Boundary rescaling.
    Bounds,
}

impl Stage {
    /// Stage name as it appears in the log.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Clash => "clash",
            Self::Combine => "combine",
            Self::PunishHarm => "punish_harm",
            Self::Relations => "relations",
            Self::Cycle => "cycle",
            Self::RawSnapshot => "raw_snapshot",
            Self::Generate => "generate",
            Self::Control => "control",
            Self::Bounds => "bounds",
        }
    }
}

/// One audit-trail entry: a completed stage with the node states after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Which stage ran.
    pub stage: Stage,
    /// Human-readable summary of what the stage did.
    pub description: String,
    /// Snapshot of every node after the stage.
    pub nodes: Vec<NodeSnapshot>,
}

/// The engine's working state: nodes, relations, and the audit trail.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// The eight natal nodes in chart order.
    pub nodes: Vec<EnergyNode>,
    /// Relation edges between stem nodes, in positional order.
    pub edges: Vec<RelationEdge>,
    /// Node index per element in metal→water→wood→fire→earth order when
    /// all five elements are present, else `None`.
    pub cycle: Option<[usize; 5]>,
    /// The active configuration.
    pub config: EnergyConfig,
    /// Append-only stage log.
    pub log: Vec<LogEntry>,
    /// Node states right after init, before any structural adjustment.
    pub base_snapshot: Vec<NodeSnapshot>,
    /// Node states right before the transfer stages.
    pub raw_snapshot: Vec<NodeSnapshot>,
}

impl SimulationState {
    /// Creates a state around freshly built nodes.
    #[must_use]
    pub fn new(nodes: Vec<EnergyNode>, config: EnergyConfig) -> Self {
        Self {
            nodes,
            edges: Vec::new(),
            cycle: None,
            config,
            log: Vec::new(),
            base_snapshot: Vec::new(),
            raw_snapshot: Vec::new(),
        }
    }

    /// Snapshots every node in chart order.
    #[must_use]
    pub fn snapshot_all(&self) -> Vec<NodeSnapshot> {
        self.nodes.iter().map(NodeSnapshot::capture).collect()
    }

    /// Appends a stage entry with full per-node snapshots.
    pub fn log_stage(&mut self, stage: Stage, description: impl Into<String>) {
        let nodes = self.snapshot_all();
        self.log.push(LogEntry {
            stage,
            description: description.into(),
            nodes,
        });
    }

    /// Zeroes every node's action counter before a transfer pass.
    pub fn reset_action_counts(&mut self) {
        for node in &mut self.nodes {
            node.action_count = 0;
        }
    }

    /// Index of the day master node.
    #[must_use]
    pub fn day_master_index(&self) -> usize {
        self.nodes
            .iter()
            .position(|node| node.flags.contains(NodeFlags::DAY_MASTER))
            .unwrap_or(4)
    }

    /// Total energy of a node's element, treating absence as zero.
    #[must_use]
    pub fn element_energy(&self, index: usize, element: FiveElement) -> f64 {
        self.nodes[index].energies.get_or_zero(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Polarity;
    use crate::node::{ElementEnergies, NodeKind};
    use crate::pillars::Pillar;

    fn make_node(pillar: Pillar, kind: NodeKind) -> EnergyNode {
        EnergyNode {
            name: '甲',
            kind,
            pillar,
            original_element: FiveElement::Wood,
            polarity: Polarity::Yang,
            energies: ElementEnergies::new(),
            flags: NodeFlags::empty(),
            action_count: 0,
        }
    }

    #[test]
    fn test_log_stage_captures_all_nodes() {
        let nodes = vec![
            make_node(Pillar::Year, NodeKind::Stem),
            make_node(Pillar::Year, NodeKind::Branch),
        ];
        let mut state = SimulationState::new(nodes, EnergyConfig::default());
        state.log_stage(Stage::Init, "built 2 nodes");
        assert_eq!(state.log.len(), 1);
        assert_eq!(state.log[0].stage, Stage::Init);
        assert_eq!(state.log[0].nodes.len(), 2);
    }

    #[test]
    fn test_generative_edge_targets_child_element() {
        let edge = RelationEdge {
            source: 0,
            target: 1,
            element: FiveElement::Wood,
            kind: RelationKind::Generative,
        };
        assert_eq!(edge.target_element(), FiveElement::Fire);
    }

    #[test]
    fn test_controlling_edge_targets_subject_element() {
        let edge = RelationEdge {
            source: 0,
            target: 1,
            element: FiveElement::Wood,
            kind: RelationKind::Controlling,
        };
        assert_eq!(edge.target_element(), FiveElement::Earth);
    }

    #[test]
    fn test_reset_action_counts() {
        let mut node = make_node(Pillar::Day, NodeKind::Stem);
        node.action_count = 3;
        let mut state = SimulationState::new(vec![node], EnergyConfig::default());
        state.reset_action_counts();
        assert_eq!(state.nodes[0].action_count, 0);
    }

    #[test]
    fn test_stage_names_are_stable() {
        assert_eq!(Stage::PunishHarm.name(), "punish_harm");
        assert_eq!(Stage::RawSnapshot.name(), "raw_snapshot");
    }
}
