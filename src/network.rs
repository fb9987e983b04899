//! Relation network construction and five-element cycle detection.

use crate::element::FiveElement;
use crate::node::NodeKind;
use crate::state::{RelationEdge, RelationKind, SimulationState};

/// Builds attribute-level generative and controlling edges between stem
/// nodes and stores them on the state in positional order.
///
/// Branches act through the structural rules instead of ordinary
/// cross-pillar edges, so only stems participate here. An edge exists for
/// every present source element whose child (or subject) element is
/// present on another stem node.
pub fn build_relations(state: &mut SimulationState) {
    let stem_indices: Vec<usize> = state
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.kind == NodeKind::Stem)
        .map(|(index, _)| index)
        .collect();

    let mut generative = Vec::new();
    let mut controlling = Vec::new();

    for &source in &stem_indices {
        let source_elements: Vec<FiveElement> = state.nodes[source]
            .energies
            .entries()
            .map(|(element, _)| element)
            .collect();
        for element in source_elements {
            for &target in &stem_indices {
                if target == source {
                    continue;
                }
                if state.nodes[target].energies.is_present(element.generates()) {
                    generative.push(RelationEdge {
                        source,
                        target,
                        element,
                        kind: RelationKind::Generative,
                    });
                }
                if state.nodes[target].energies.is_present(element.controls()) {
                    controlling.push(RelationEdge {
                        source,
                        target,
                        element,
                        kind: RelationKind::Controlling,
                    });
                }
            }
        }
    }

    let order = |edge: &RelationEdge| {
        state.nodes[edge.source].position_index() * 10 + state.nodes[edge.target].position_index()
    };
    generative.sort_by_key(order);
    controlling.sort_by_key(order);

    state.edges = generative;
    state.edges.extend(controlling);
}

/// Detects the full five-element cycle over original elements.
///
/// When every element owns at least one node, the first node of each
/// element in chart order forms the metal→water→wood→fire→earth loop.
pub fn detect_cycle(state: &mut SimulationState) {
    let mut first: [Option<usize>; 5] = [None; 5];
    for (index, node) in state.nodes.iter().enumerate() {
        let slot = &mut first[node.original_element.index()];
        if slot.is_none() {
            *slot = Some(index);
        }
    }

    let cycle_order = [
        FiveElement::Metal,
        FiveElement::Water,
        FiveElement::Wood,
        FiveElement::Fire,
        FiveElement::Earth,
    ];
    let mut cycle = [0usize; 5];
    for (slot, element) in cycle.iter_mut().zip(cycle_order) {
        match first[element.index()] {
            Some(index) => *slot = index,
            None => {
                state.cycle = None;
                return;
            }
        }
    }
    state.cycle = Some(cycle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_state;
    use crate::config::EnergyConfig;
    use crate::pillars::PillarSet;

    fn state_for(year: &str, month: &str, day: &str, hour: &str) -> SimulationState {
        let pillars = PillarSet::parse(year, month, day, hour).unwrap();
        build_state(&pillars, &EnergyConfig::default())
    }

    #[test]
    fn test_edges_connect_only_stems() {
        let mut state = state_for("甲子", "丙寅", "戊午", "庚申");
        build_relations(&mut state);
        assert!(!state.edges.is_empty());
        for edge in &state.edges {
            assert_eq!(state.nodes[edge.source].kind, NodeKind::Stem);
            assert_eq!(state.nodes[edge.target].kind, NodeKind::Stem);
        }
    }

    #[test]
    fn test_generative_edges_precede_controlling() {
        let mut state = state_for("甲子", "丙寅", "戊午", "庚申");
        build_relations(&mut state);
        let first_controlling = state
            .edges
            .iter()
            .position(|e| e.kind == RelationKind::Controlling);
        if let Some(boundary) = first_controlling {
            assert!(state.edges[..boundary]
                .iter()
                .all(|e| e.kind == RelationKind::Generative));
            assert!(state.edges[boundary..]
                .iter()
                .all(|e| e.kind == RelationKind::Controlling));
        }
    }

    #[test]
    fn test_edges_sorted_by_position() {
        let mut state = state_for("甲子", "丙寅", "戊午", "庚申");
        build_relations(&mut state);
        for kind in [RelationKind::Generative, RelationKind::Controlling] {
            let scores: Vec<usize> = state
                .edges
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| {
                    state.nodes[e.source].position_index() * 10
                        + state.nodes[e.target].position_index()
                })
                .collect();
            assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_wood_feeds_fire_edge_exists() {
        // 甲 (wood) and 丙 (fire) stems: a generative edge must connect them.
        let mut state = state_for("甲子", "丙寅", "戊午", "庚申");
        build_relations(&mut state);
        assert!(state.edges.iter().any(|e| {
            e.kind == RelationKind::Generative
                && e.source == 0
                && e.target == 2
                && e.element == FiveElement::Wood
        }));
    }

    #[test]
    fn test_cycle_detected_when_all_elements_present() {
        // Stems 甲丙戊庚 cover wood/fire/earth/metal, branch 子 covers water.
        let mut state = state_for("甲子", "丙寅", "戊午", "庚申");
        detect_cycle(&mut state);
        let cycle = state.cycle.expect("all five elements present");
        assert_eq!(state.nodes[cycle[0]].original_element, FiveElement::Metal);
        assert_eq!(state.nodes[cycle[1]].original_element, FiveElement::Water);
        assert_eq!(state.nodes[cycle[2]].original_element, FiveElement::Wood);
        assert_eq!(state.nodes[cycle[3]].original_element, FiveElement::Fire);
        assert_eq!(state.nodes[cycle[4]].original_element, FiveElement::Earth);
    }

    #[test]
    fn test_no_cycle_when_element_missing() {
        // 甲子 乙丑 丙寅 丁卯 has no metal anywhere among original elements.
        let mut state = state_for("甲子", "乙丑", "丙寅", "丁卯");
        detect_cycle(&mut state);
        assert!(state.cycle.is_none());
    }

    #[test]
    fn test_cycle_picks_first_node_in_chart_order() {
        // Two water nodes (子 year branch before 壬 would be; here 子 is
        // the only water, 午 and 戊 both map to fire/earth).
        let mut state = state_for("甲子", "丙寅", "戊午", "庚申");
        detect_cycle(&mut state);
        let cycle = state.cycle.unwrap();
        // Water slot is the year branch 子 (index 1), not 申's hidden water.
        assert_eq!(cycle[1], 1);
    }
}
