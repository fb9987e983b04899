//! State construction: base energies, rooting, seasonal correction,
//! and stem penetration.

use crate::config::EnergyConfig;
use crate::node::{ElementEnergies, EnergyNode, NodeFlags, NodeKind};
use crate::pillars::{Pillar, PillarSet};
use crate::state::{SimulationState, Stage};

/// Builds the eight natal nodes, applies the init-stage adjustments, and
/// returns the ready simulation state with its base snapshot captured.
#[must_use]
pub fn build_state(pillars: &PillarSet, config: &EnergyConfig) -> SimulationState {
    let nodes = build_nodes(pillars, config);
    let mut state = SimulationState::new(nodes, config.clone());
    state.base_snapshot = state.snapshot_all();

    apply_root_qi_gain(&mut state, pillars);
    apply_month_correction(&mut state, pillars);
    apply_penetration(&mut state);

    state.log_stage(
        Stage::Init,
        format!(
            "built 8 nodes for {pillars}; applied rooting, {} month correction, penetration",
            pillars.month_branch()
        ),
    );
    state
}

fn build_nodes(pillars: &PillarSet, config: &EnergyConfig) -> Vec<EnergyNode> {
    let mut nodes = Vec::with_capacity(8);
    for pillar in Pillar::ALL {
        let pair = pillars.pillar(pillar);

        let mut stem_energies = ElementEnergies::new();
        stem_energies.set(pair.stem.element(), config.stem_base_energy);
        let mut stem_flags = NodeFlags::empty();
        if pillar == Pillar::Day {
            stem_flags.insert(NodeFlags::DAY_MASTER);
        }
        nodes.push(EnergyNode {
            name: pair.stem.to_char(),
            kind: NodeKind::Stem,
            pillar,
            original_element: pair.stem.element(),
            polarity: pair.stem.polarity(),
            energies: stem_energies,
            flags: stem_flags,
            action_count: 0,
        });

        let mut branch_energies = ElementEnergies::new();
        for (element, ratio) in pair.branch.hidden_distribution() {
            branch_energies.set(*element, config.branch_base_energy * ratio);
        }
        nodes.push(EnergyNode {
            name: pair.branch.to_char(),
            kind: NodeKind::Branch,
            pillar,
            original_element: pair.branch.element(),
            polarity: pair.branch.polarity(),
            energies: branch_energies,
            flags: NodeFlags::empty(),
            action_count: 0,
        });
    }
    nodes
}

/// Strengthens each stem that finds support in the branches.
///
/// The stem's own pillar decides the tier: a main-qi share (>= 0.6) in the
/// sitting branch grants the full root gain, a residual share (>= 0.2)
/// grants the qi gain. Failing both, a residual share in any other branch
/// grants 80 percent of the qi gain.
fn apply_root_qi_gain(state: &mut SimulationState, pillars: &PillarSet) {
    let config = state.config.clone();
    for pillar in Pillar::ALL {
        let stem_index = pillar.index() * 2;
        let element = state.nodes[stem_index].original_element;

        let own_share = pillars
            .pillar(pillar)
            .branch
            .hidden_distribution()
            .iter()
            .find(|(el, _)| *el == element)
            .map_or(0.0, |(_, ratio)| *ratio);

        let factor = if own_share >= 0.6 {
            config.root_gain_factor
        } else if own_share >= 0.2 {
            config.qi_gain_factor
        } else {
            let supported_elsewhere = Pillar::ALL.into_iter().filter(|p| *p != pillar).any(|p| {
                pillars
                    .pillar(p)
                    .branch
                    .hidden_distribution()
                    .iter()
                    .any(|(el, ratio)| *el == element && *ratio >= 0.2)
            });
            if supported_elsewhere {
                1.0 + (config.qi_gain_factor - 1.0) * 0.8
            } else {
                1.0
            }
        };

        if factor > 1.0 {
            let current = state.nodes[stem_index].energies.get_or_zero(element);
            state.nodes[stem_index].update_energy(element, current * (factor - 1.0), &config);
        }
    }
}

/// Rescales every present element on every node by the month branch's
/// seasonal coefficient for that element.
fn apply_month_correction(state: &mut SimulationState, pillars: &PillarSet) {
    let month = pillars.month_branch();
    for node in &mut state.nodes {
        let scaled: Vec<_> = node
            .energies
            .entries()
            .map(|(element, value)| (element, value * month.seasonal_coefficient(element)))
            .collect();
        for (element, value) in scaled {
            node.energies.set(element, value);
        }
    }
}

/// Applies the penetration bonus: a branch element that also appears as
/// some stem's original element is considered revealed and strengthened.
fn apply_penetration(state: &mut SimulationState) {
    let mut revealed = [false; 5];
    for node in &state.nodes {
        if node.kind == NodeKind::Stem {
            revealed[node.original_element.index()] = true;
        }
    }
    let factor = state.config.penetration_factor;
    for node in &mut state.nodes {
        if node.kind != NodeKind::Branch {
            continue;
        }
        let boosted: Vec<_> = node
            .energies
            .entries()
            .filter(|(element, _)| revealed[element.index()])
            .map(|(element, value)| (element, value * factor))
            .collect();
        for (element, value) in boosted {
            node.energies.set(element, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::FiveElement;

    fn chart() -> PillarSet {
        PillarSet::parse("甲子", "乙丑", "丙寅", "丁卯").unwrap()
    }

    #[test]
    fn test_builds_eight_nodes_in_chart_order() {
        let state = build_state(&chart(), &EnergyConfig::default());
        assert_eq!(state.nodes.len(), 8);
        assert_eq!(state.nodes[0].name, '甲');
        assert_eq!(state.nodes[1].name, '子');
        assert_eq!(state.nodes[4].name, '丙');
        assert_eq!(state.nodes[7].name, '卯');
    }

    #[test]
    fn test_day_master_flag_set_once() {
        let state = build_state(&chart(), &EnergyConfig::default());
        let masters: Vec<_> = state
            .nodes
            .iter()
            .filter(|n| n.flags.contains(NodeFlags::DAY_MASTER))
            .collect();
        assert_eq!(masters.len(), 1);
        assert_eq!(masters[0].name, '丙');
        assert_eq!(state.day_master_index(), 4);
    }

    #[test]
    fn test_base_snapshot_has_unadjusted_energies() {
        let config = EnergyConfig::default();
        let state = build_state(&chart(), &config);
        // Year stem 甲 before rooting and season: exactly the stem base.
        let snap = &state.base_snapshot[0];
        assert!((snap.energy_of(FiveElement::Wood) - config.stem_base_energy).abs() < 1e-9);
        // Branch 丑 splits the branch base 0.6/0.3/0.1.
        let chou = &state.base_snapshot[3];
        assert!((chou.energy_of(FiveElement::Earth) - 720.0).abs() < 1e-9);
        assert!((chou.energy_of(FiveElement::Metal) - 360.0).abs() < 1e-9);
        assert!((chou.energy_of(FiveElement::Water) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_root_and_qi_gain_tiers() {
        // 甲 sits on 子 (no wood share) but roots in 寅/卯 elsewhere,
        // 丙 sits on 寅 which carries fire 0.3 residual qi.
        let config = EnergyConfig::default();
        let state = build_state(&chart(), &config);
        let jia_wood = state.nodes[0].energies.get_or_zero(FiveElement::Wood);
        // Remote rooting: base 1000 * (1 + 0.2*0.8) = 1160, then month 丑 wood 0.4.
        assert!((jia_wood - 1000.0 * 1.16 * 0.4).abs() < 1e-6);
        let bing_fire = state.nodes[4].energies.get_or_zero(FiveElement::Fire);
        // Residual qi: 1000 * 1.2, month 丑 fire 0.78.
        assert!((bing_fire - 1000.0 * 1.2 * 0.78).abs() < 1e-6);
    }

    #[test]
    fn test_penetration_boosts_revealed_branch_elements() {
        // In this chart wood and fire stems are revealed; branch 寅 holds
        // wood, fire, and earth, so earth alone stays unboosted.
        let config = EnergyConfig::default();
        let state = build_state(&chart(), &config);
        let yin = &state.nodes[5];
        assert_eq!(yin.name, '寅');
        let wood = yin.energies.get_or_zero(FiveElement::Wood);
        let earth = yin.energies.get_or_zero(FiveElement::Earth);
        // wood: 1200*0.6 * month(0.4) * 1.1; earth: 1200*0.1 * month(1.56).
        assert!((wood - 720.0 * 0.4 * 1.1).abs() < 1e-6);
        assert!((earth - 120.0 * 1.56).abs() < 1e-6);
    }

    #[test]
    fn test_init_stage_is_logged() {
        let state = build_state(&chart(), &EnergyConfig::default());
        assert_eq!(state.log.len(), 1);
        assert_eq!(state.log[0].stage, Stage::Init);
        assert_eq!(state.log[0].nodes.len(), 8);
    }
}
