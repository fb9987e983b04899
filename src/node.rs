//! Energy nodes: the eight stem/branch positions of a chart.
//!
//! Each node carries a per-element energy vector with presence
//! semantics: an element a node has never held is absent, which is not
//! the same as holding zero. Proportional distribution and per-element
//! floors only ever touch present entries.

use serde::{Deserialize, Serialize};

use crate::config::EnergyConfig;
use crate::element::{FiveElement, Polarity};
use crate::pillars::Pillar;

/// Whether a node sits in the stem or the branch slot of its pillar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Heavenly stem slot.
    Stem,
    /// Earthly branch slot.
    Branch,
}

/// Structural markers accumulated on a node during the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags(u8);

impl NodeFlags {
    /// The node took part in a branch combination or stem pairing.
    pub const COMBINED: Self = Self(1);
    /// The node is one side of a six-clash pair.
    pub const CLASHED: Self = Self(1 << 1);
    /// The node took part in a triple or pair punishment.
    pub const PUNISHED: Self = Self(1 << 2);
    /// The node is one side of a six-harm pair.
    pub const HARMED: Self = Self(1 << 3);
    /// The node is a duplicated self-punishing branch.
    pub const SELF_PUNISHED: Self = Self(1 << 4);
    /// The node is the day master stem.
    pub const DAY_MASTER: Self = Self(1 << 5);

    /// No markers set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Sets a marker.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Checks a marker.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when no marker is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Per-element energy vector with presence tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementEnergies {
    values: [f64; 5],
    present: u8,
}

impl ElementEnergies {
    /// An empty vector with no present elements.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: [0.0; 5],
            present: 0,
        }
    }

    /// The energy of an element, or `None` when the node never held it.
    #[must_use]
    pub fn get(&self, element: FiveElement) -> Option<f64> {
        if self.is_present(element) {
            Some(self.values[element.index()])
        } else {
            None
        }
    }

    /// The energy of an element, treating absence as zero.
    #[must_use]
    pub fn get_or_zero(&self, element: FiveElement) -> f64 {
        self.get(element).unwrap_or(0.0)
    }

    /// Whether the element has an entry.
    #[must_use]
    pub fn is_present(&self, element: FiveElement) -> bool {
        self.present & (1 << element.index()) != 0
    }

    /// Overwrites an element's energy, marking it present.
    pub fn set(&mut self, element: FiveElement, value: f64) {
        self.values[element.index()] = value;
        self.present |= 1 << element.index();
    }

    /// Sum over present elements.
    #[must_use]
    pub fn total(&self) -> f64 {
        FiveElement::ALL
            .into_iter()
            .filter(|el| self.is_present(*el))
            .map(|el| self.values[el.index()])
            .sum()
    }

    /// Present elements with their energies, in canonical element order.
    pub fn entries(&self) -> impl Iterator<Item = (FiveElement, f64)> + '_ {
        FiveElement::ALL
            .into_iter()
            .filter(|el| self.is_present(*el))
            .map(|el| (el, self.values[el.index()]))
    }

    /// Number of present elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.present.count_ones() as usize
    }

    /// True when no element is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present == 0
    }
}

/// One of the eight natal positions with its energy state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyNode {
    /// The stem or branch character at this position.
    pub name: char,
    /// Stem or branch slot.
    pub kind: NodeKind,
    /// Which pillar the node belongs to.
    pub pillar: Pillar,
    /// The element of the stem, or the branch's main element.
    pub original_element: FiveElement,
    /// The node's yin/yang polarity.
    pub polarity: Polarity,
    /// Per-element energy with presence semantics.
    pub energies: ElementEnergies,
    /// Structural markers set by the relation detectors.
    pub flags: NodeFlags,
    /// Number of transfer actions the node has taken part in.
    pub action_count: u32,
}

impl EnergyNode {
    /// Sum of the node's present element energies.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.energies.total()
    }

    /// Adds `delta` to one element, clamping the result to the configured
    /// per-element bounds. The element becomes present if it was not.
    pub fn update_energy(&mut self, element: FiveElement, delta: f64, config: &EnergyConfig) {
        let current = self.energies.get_or_zero(element);
        let next = (current + delta).clamp(config.min_energy, config.max_energy);
        self.energies.set(element, next);
    }

    /// Spreads `delta` across the node's present elements.
    ///
    /// Positive totals split proportionally to current energy; a
    /// non-positive total splits evenly. A node with no present element
    /// books the whole delta on its original element.
    pub fn distribute_energy(&mut self, delta: f64, config: &EnergyConfig) {
        if self.energies.is_empty() {
            self.update_energy(self.original_element, delta, config);
            return;
        }
        let total = self.total_energy();
        let shares: Vec<(FiveElement, f64)> = if total > 0.0 {
            self.energies
                .entries()
                .map(|(el, value)| (el, delta * (value / total)))
                .collect()
        } else {
            let even = delta / self.energies.len() as f64;
            self.energies.entries().map(|(el, _)| (el, even)).collect()
        };
        for (element, share) in shares {
            self.update_energy(element, share, config);
        }
    }

    /// Diminishing-returns efficiency for the node's next transfer action.
    #[must_use]
    pub const fn action_efficiency(&self) -> f64 {
        match self.action_count {
            0 => 1.0,
            1 => 0.5,
            2 => 0.25,
            _ => 0.125,
        }
    }

    /// Books one transfer action against the node.
    pub fn increment_action_count(&mut self) {
        self.action_count += 1;
    }

    /// Fixed positional weight of the node's slot.
    #[must_use]
    pub const fn position_weight(&self) -> f64 {
        match (self.pillar, self.kind) {
            (Pillar::Year, NodeKind::Stem) => 0.35,
            (Pillar::Year, NodeKind::Branch) => 0.3,
            (Pillar::Month, NodeKind::Stem) => 0.8,
            (Pillar::Month, NodeKind::Branch) | (Pillar::Day, NodeKind::Stem) => 1.0,
            (Pillar::Day, NodeKind::Branch) => 0.9,
            (Pillar::Hour, NodeKind::Stem) => 0.7,
            (Pillar::Hour, NodeKind::Branch) => 0.5,
        }
    }

    /// Index of the node in chart order (year stem 0 … hour branch 7).
    #[must_use]
    pub const fn position_index(&self) -> usize {
        self.pillar.index() * 2
            + match self.kind {
                NodeKind::Stem => 0,
                NodeKind::Branch => 1,
            }
    }

    /// Position label such as `"month branch"`.
    #[must_use]
    pub fn position_label(&self) -> String {
        let slot = match self.kind {
            NodeKind::Stem => "stem",
            NodeKind::Branch => "branch",
        };
        format!("{} {slot}", self.pillar)
    }
}

/// Pairwise interaction strengths between the eight natal positions,
/// indexed by `position_index`. Used on edge weights when the matrix is
/// enabled in the configuration.
const POSITION_INTERACTION_MATRIX: [[f64; 8]; 8] = [
    [1.0, 1.0, 0.8, 0.0, 0.4, 0.0, 0.2, 0.0],
    [1.0, 1.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.0],
    [0.8, 0.0, 1.0, 1.0, 0.8, 0.0, 0.4, 0.0],
    [0.0, 0.8, 1.0, 1.0, 0.0, 0.8, 0.0, 0.0],
    [0.4, 0.0, 0.8, 0.0, 1.0, 1.0, 0.8, 0.0],
    [0.0, 0.0, 0.0, 0.8, 1.0, 1.0, 0.0, 0.8],
    [0.2, 0.0, 0.4, 0.0, 0.8, 0.0, 1.0, 1.0],
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.8, 1.0, 1.0],
];

/// Matrix coefficient for an edge, or 1.0 when the matrix is disabled.
#[must_use]
pub fn position_matrix_coeff(from: &EnergyNode, to: &EnergyNode, config: &EnergyConfig) -> f64 {
    if !config.enable_position_matrix {
        return 1.0;
    }
    POSITION_INTERACTION_MATRIX[from.position_index()][to.position_index()]
}

/// Immutable copy of a node's state, taken for snapshots and stage logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// The node's character.
    pub name: char,
    /// Stem or branch slot.
    pub kind: NodeKind,
    /// Position label such as `"day stem"`.
    pub position: String,
    /// Fixed positional weight of the slot.
    pub position_weight: f64,
    /// Original element of the position.
    pub original_element: FiveElement,
    /// Polarity of the position.
    pub polarity: Polarity,
    /// Present elements with their energies.
    pub energies: Vec<(FiveElement, f64)>,
    /// Sum over present elements.
    pub total: f64,
    /// Markers at snapshot time.
    pub flags: NodeFlags,
}

impl NodeSnapshot {
    /// Captures the node's current state.
    #[must_use]
    pub fn capture(node: &EnergyNode) -> Self {
        Self {
            name: node.name,
            kind: node.kind,
            position: node.position_label(),
            position_weight: node.position_weight(),
            original_element: node.original_element,
            polarity: node.polarity,
            energies: node.energies.entries().collect(),
            total: node.total_energy(),
            flags: node.flags,
        }
    }

    /// The snapshotted energy of one element, treating absence as zero.
    #[must_use]
    pub fn energy_of(&self, element: FiveElement) -> f64 {
        self.energies
            .iter()
            .find(|(el, _)| *el == element)
            .map_or(0.0, |(_, value)| *value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_node() -> EnergyNode {
        EnergyNode {
            name: '丙',
            kind: NodeKind::Stem,
            pillar: Pillar::Day,
            original_element: FiveElement::Fire,
            polarity: Polarity::Yang,
            energies: ElementEnergies::new(),
            flags: NodeFlags::empty(),
            action_count: 0,
        }
    }

    #[test]
    fn test_absent_element_is_not_zero() {
        let energies = ElementEnergies::new();
        assert_eq!(energies.get(FiveElement::Wood), None);
        let mut held = ElementEnergies::new();
        held.set(FiveElement::Wood, 0.0);
        assert_eq!(held.get(FiveElement::Wood), Some(0.0));
    }

    #[test]
    fn test_update_energy_clamps_to_bounds() {
        let config = EnergyConfig::default();
        let mut node = test_node();
        node.update_energy(FiveElement::Fire, 20_000.0, &config);
        assert!((node.energies.get_or_zero(FiveElement::Fire) - config.max_energy).abs() < 1e-9);
        node.update_energy(FiveElement::Fire, -50_000.0, &config);
        assert!((node.energies.get_or_zero(FiveElement::Fire) - config.min_energy).abs() < 1e-9);
    }

    #[test]
    fn test_distribute_is_proportional() {
        let config = EnergyConfig::default();
        let mut node = test_node();
        node.energies.set(FiveElement::Fire, 300.0);
        node.energies.set(FiveElement::Earth, 100.0);
        node.distribute_energy(100.0, &config);
        assert!((node.energies.get_or_zero(FiveElement::Fire) - 375.0).abs() < 1e-9);
        assert!((node.energies.get_or_zero(FiveElement::Earth) - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_distribute_on_empty_node_targets_original_element() {
        let config = EnergyConfig::default();
        let mut node = test_node();
        node.distribute_energy(500.0, &config);
        assert_eq!(node.energies.get(FiveElement::Fire), Some(500.0));
        assert_eq!(node.energies.len(), 1);
    }

    #[test]
    fn test_distribute_never_touches_absent_elements() {
        let config = EnergyConfig::default();
        let mut node = test_node();
        node.energies.set(FiveElement::Fire, 200.0);
        node.distribute_energy(-100.0, &config);
        assert!(!node.energies.is_present(FiveElement::Water));
        assert_eq!(node.energies.len(), 1);
    }

    #[test]
    fn test_action_efficiency_schedule() {
        let mut node = test_node();
        let expected = [1.0, 0.5, 0.25, 0.125, 0.125];
        for want in expected {
            assert!((node.action_efficiency() - want).abs() < 1e-12);
            node.increment_action_count();
        }
    }

    #[test]
    fn test_position_weights() {
        let mut node = test_node();
        assert!((node.position_weight() - 1.0).abs() < 1e-12);
        node.pillar = Pillar::Year;
        assert!((node.position_weight() - 0.35).abs() < 1e-12);
        node.kind = NodeKind::Branch;
        assert!((node.position_weight() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_is_identity_scale_on_diagonal() {
        for i in 0..8 {
            assert!((POSITION_INTERACTION_MATRIX[i][i] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_matrix_coeff_disabled_is_one() {
        let config = EnergyConfig::default();
        let a = test_node();
        let mut b = test_node();
        b.pillar = Pillar::Year;
        assert!((position_matrix_coeff(&a, &b, &config) - 1.0).abs() < 1e-12);
        let enabled = EnergyConfig {
            enable_position_matrix: true,
            ..config
        };
        // Day stem (index 4) acting on year stem (index 0).
        assert!((position_matrix_coeff(&a, &b, &enabled) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_flags_insert_and_contains() {
        let mut flags = NodeFlags::empty();
        assert!(flags.is_empty());
        flags.insert(NodeFlags::COMBINED);
        flags.insert(NodeFlags::DAY_MASTER);
        assert!(flags.contains(NodeFlags::COMBINED));
        assert!(flags.contains(NodeFlags::DAY_MASTER));
        assert!(!flags.contains(NodeFlags::CLASHED));
    }

    #[test]
    fn test_snapshot_captures_energies() {
        let config = EnergyConfig::default();
        let mut node = test_node();
        node.update_energy(FiveElement::Fire, 800.0, &config);
        node.flags.insert(NodeFlags::DAY_MASTER);
        let snap = NodeSnapshot::capture(&node);
        assert_eq!(snap.position, "day stem");
        assert!((snap.energy_of(FiveElement::Fire) - 800.0).abs() < 1e-9);
        assert!((snap.energy_of(FiveElement::Water)).abs() < 1e-12);
        assert!(snap.flags.contains(NodeFlags::DAY_MASTER));
    }
}
