//! Structural relation detectors: clashes, branch combinations, stem
//! pairings, punishments, harms, and self-punishments.
//!
//! Priority is fixed: three-meetings, then three-harmonies, then
//! six-combines, then half-combines, then stem pairings. Punishment and
//! harm handling runs after combination so a formed structure is not
//! broken again; a node already claimed by an earlier rule is skipped by
//! later ones.

use crate::alphabet::{
    stem_pairing_result, Branch, Stem, CLASH_PAIRS, HARM_PAIRS, PUNISH_PAIRS, PUNISH_TRIPLES,
    SELF_PUNISH_BRANCHES,
};
use crate::element::FiveElement;
use crate::node::{NodeFlags, NodeKind};
use crate::state::SimulationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CombinationKind {
    ThreeMeeting,
    ThreeHarmony,
    SixCombine,
    HalfCombine,
}

struct CombinationRule {
    kind: CombinationKind,
    branches: &'static [Branch],
    target: FiveElement,
    /// Pivot branch of a three-harmony frame.
    pivot: Option<Branch>,
    base_contrib: f64,
    base_external: f64,
    decay: f64,
}

const fn meeting(branches: &'static [Branch], target: FiveElement) -> CombinationRule {
    CombinationRule {
        kind: CombinationKind::ThreeMeeting,
        branches,
        target,
        pivot: None,
        base_contrib: 0.8,
        base_external: 0.8,
        decay: 0.3,
    }
}

const fn harmony(
    branches: &'static [Branch],
    target: FiveElement,
    pivot: Branch,
) -> CombinationRule {
    CombinationRule {
        kind: CombinationKind::ThreeHarmony,
        branches,
        target,
        pivot: Some(pivot),
        base_contrib: 0.7,
        base_external: 0.7,
        decay: 0.2,
    }
}

const fn six(branches: &'static [Branch], target: FiveElement) -> CombinationRule {
    CombinationRule {
        kind: CombinationKind::SixCombine,
        branches,
        target,
        pivot: None,
        base_contrib: 0.5,
        base_external: 0.5,
        decay: 0.25,
    }
}

const fn half(branches: &'static [Branch], target: FiveElement) -> CombinationRule {
    CombinationRule {
        kind: CombinationKind::HalfCombine,
        branches,
        target,
        pivot: None,
        base_contrib: 0.6,
        base_external: 0.6,
        decay: 0.15,
    }
}

/// All branch combination rules in priority order.
const BRANCH_COMBINATIONS: [CombinationRule; 22] = [
    meeting(&[Branch::Yin, Branch::Mao, Branch::Chen], FiveElement::Wood),
    meeting(&[Branch::Si, Branch::Wu, Branch::Wei], FiveElement::Fire),
    meeting(&[Branch::Shen, Branch::You, Branch::Xu], FiveElement::Metal),
    meeting(&[Branch::Hai, Branch::Zi, Branch::Chou], FiveElement::Water),
    harmony(
        &[Branch::Shen, Branch::Zi, Branch::Chen],
        FiveElement::Water,
        Branch::Zi,
    ),
    harmony(
        &[Branch::Hai, Branch::Mao, Branch::Wei],
        FiveElement::Wood,
        Branch::Mao,
    ),
    harmony(
        &[Branch::Yin, Branch::Wu, Branch::Xu],
        FiveElement::Fire,
        Branch::Wu,
    ),
    harmony(
        &[Branch::Si, Branch::You, Branch::Chou],
        FiveElement::Metal,
        Branch::You,
    ),
    six(&[Branch::Zi, Branch::Chou], FiveElement::Earth),
    six(&[Branch::Yin, Branch::Hai], FiveElement::Wood),
    six(&[Branch::Mao, Branch::Xu], FiveElement::Fire),
    six(&[Branch::Chen, Branch::You], FiveElement::Metal),
    six(&[Branch::Si, Branch::Shen], FiveElement::Water),
    six(&[Branch::Wu, Branch::Wei], FiveElement::Earth),
    half(&[Branch::Shen, Branch::Zi], FiveElement::Water),
    half(&[Branch::Zi, Branch::Chen], FiveElement::Water),
    half(&[Branch::Hai, Branch::Mao], FiveElement::Wood),
    half(&[Branch::Mao, Branch::Wei], FiveElement::Wood),
    half(&[Branch::Yin, Branch::Wu], FiveElement::Fire),
    half(&[Branch::Wu, Branch::Xu], FiveElement::Fire),
    half(&[Branch::Si, Branch::You], FiveElement::Metal),
    half(&[Branch::You, Branch::Chou], FiveElement::Metal),
];

/// Marks both sides of every clash pair present in the chart.
pub fn mark_clashes(state: &mut SimulationState) {
    for (a, b) in CLASH_PAIRS {
        let has_a = branch_node_indices(state, a).next().is_some();
        let has_b = branch_node_indices(state, b).next().is_some();
        if !(has_a && has_b) {
            continue;
        }
        let indices: Vec<usize> = branch_node_indices(state, a)
            .chain(branch_node_indices(state, b))
            .collect();
        for index in indices {
            state.nodes[index].flags.insert(NodeFlags::CLASHED);
        }
    }
}

fn branch_node_indices<'a>(
    state: &'a SimulationState,
    branch: Branch,
) -> impl Iterator<Item = usize> + 'a {
    state
        .nodes
        .iter()
        .enumerate()
        .filter(move |(_, node)| node.kind == NodeKind::Branch && node.name == branch.to_char())
        .map(|(index, _)| index)
}

/// Combination strength: 1.0 when the month supports full transformation,
/// the rule's decay factor for a weak union, 0.0 when ineffective.
fn branch_combination_strength(rule: &CombinationRule, month: Branch) -> f64 {
    let month_element = month.element();
    match rule.kind {
        CombinationKind::ThreeMeeting => {
            if rule.branches.contains(&month) {
                1.0
            } else {
                rule.decay
            }
        }
        CombinationKind::ThreeHarmony => {
            let pivot_element = match rule.pivot {
                Some(pivot) => pivot.element(),
                None => return 0.0,
            };
            if pivot_element == month_element || month_element.generates() == pivot_element {
                1.0
            } else {
                rule.decay
            }
        }
        CombinationKind::SixCombine | CombinationKind::HalfCombine => {
            if rule.target == month_element || month_element.generates() == rule.target {
                1.0
            } else {
                rule.decay
            }
        }
    }
}

/// Stem pairing strength: full transformation only when the result element
/// reaches its imperial peak in the current month.
fn stem_pairing_strength(result: FiveElement, month: Branch) -> f64 {
    if Branch::imperial_peak_of(result) == month {
        1.0
    } else {
        0.2
    }
}

/// Applies branch combinations (in priority order) and stem pairings.
///
/// Each union pools member contributions, tops the pool up with ambient
/// energy, and redistributes it onto the target element in proportion to
/// each member's contribution.
pub fn apply_combinations(state: &mut SimulationState, month: Branch) {
    let config = state.config.clone();

    for rule in &BRANCH_COMBINATIONS {
        let mut members = Vec::with_capacity(rule.branches.len());
        for branch in rule.branches {
            let found = branch_node_indices(state, *branch)
                .find(|index| !state.nodes[*index].flags.contains(NodeFlags::COMBINED));
            match found {
                Some(index) => members.push(index),
                None => {
                    members.clear();
                    break;
                }
            }
        }
        if members.len() != rule.branches.len() {
            continue;
        }

        let strength = branch_combination_strength(rule, month);
        if strength <= 0.0 {
            continue;
        }
        let p_contrib = rule.base_contrib * strength;
        let p_external = rule.base_external * strength * config.global_external_energy_ratio;

        let contributions: Vec<f64> = members
            .iter()
            .map(|index| {
                let total = state.nodes[*index].total_energy();
                if total > 0.0 {
                    total * p_contrib
                } else {
                    0.0
                }
            })
            .collect();
        let total_contribution: f64 = contributions.iter().sum();
        if total_contribution <= 0.0 {
            continue;
        }

        let mut pool = total_contribution;
        pool += pool * p_external;

        for (index, contribution) in members.iter().zip(&contributions) {
            if *contribution <= 0.0 {
                continue;
            }
            state.nodes[*index].distribute_energy(-contribution, &config);
        }
        for (index, contribution) in members.iter().zip(&contributions) {
            if *contribution <= 0.0 {
                continue;
            }
            let share = pool * (contribution / total_contribution);
            state.nodes[*index].update_energy(rule.target, share, &config);
            state.nodes[*index].flags.insert(NodeFlags::COMBINED);
        }
    }

    apply_stem_pairings(state, month);
}

fn apply_stem_pairings(state: &mut SimulationState, month: Branch) {
    let config = state.config.clone();
    let stem_indices: Vec<usize> = state
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.kind == NodeKind::Stem)
        .map(|(index, _)| index)
        .collect();

    for (pos, &a) in stem_indices.iter().enumerate() {
        for &b in &stem_indices[pos + 1..] {
            let stem_a = Stem::from_char(state.nodes[a].name);
            let stem_b = Stem::from_char(state.nodes[b].name);
            let result = match (stem_a, stem_b) {
                (Some(sa), Some(sb)) => stem_pairing_result(sa, sb),
                _ => None,
            };
            let Some(result) = result else { continue };

            let a_total = state.nodes[a].total_energy();
            let b_total = state.nodes[b].total_energy();
            if a_total <= 0.0 || b_total <= 0.0 {
                continue;
            }

            let strength = stem_pairing_strength(result, month);
            let contribution_ratio = config.combination_contribution_ratio * strength;
            let external_ratio =
                config.combination_external_gain * strength * config.global_external_energy_ratio;

            let a_contribution = a_total * contribution_ratio;
            let b_contribution = b_total * contribution_ratio;
            let mut pool = a_contribution + b_contribution;
            pool += pool * external_ratio;

            state.nodes[a].distribute_energy(-a_contribution, &config);
            state.nodes[b].distribute_energy(-b_contribution, &config);

            let half = pool / 2.0;
            state.nodes[a].update_energy(result, half, &config);
            state.nodes[b].update_energy(result, half, &config);
            state.nodes[a].flags.insert(NodeFlags::COMBINED);
            state.nodes[b].flags.insert(NodeFlags::COMBINED);
        }
    }
}

/// Applies punishments, harms, and self-punishments as proportional
/// energy deductions on the nodes still free of higher-priority flags.
pub fn apply_punish_harm(state: &mut SimulationState) {
    let config = state.config.clone();

    // Cyclic triple punishments need all three branches present.
    for (a, b, c) in PUNISH_TRIPLES {
        let members: Vec<usize> = [a, b, c]
            .into_iter()
            .filter_map(|branch| {
                branch_node_indices(state, branch).find(|index| {
                    let flags = state.nodes[*index].flags;
                    !flags.contains(NodeFlags::COMBINED) && !flags.contains(NodeFlags::PUNISHED)
                })
            })
            .collect();
        if members.len() == 3 {
            for index in members {
                deduct(state, index, config.punish_loss_ratio, NodeFlags::PUNISHED);
            }
        }
    }

    // Pair punishment.
    for (a, b) in PUNISH_PAIRS {
        let a_nodes = free_nodes(state, a, &[NodeFlags::COMBINED, NodeFlags::PUNISHED, NodeFlags::HARMED]);
        let b_nodes = free_nodes(state, b, &[NodeFlags::COMBINED, NodeFlags::PUNISHED, NodeFlags::HARMED]);
        if !a_nodes.is_empty() && !b_nodes.is_empty() {
            for index in a_nodes.into_iter().chain(b_nodes) {
                deduct(state, index, config.punish_loss_ratio, NodeFlags::PUNISHED);
            }
        }
    }

    // Six harms.
    for (a, b) in HARM_PAIRS {
        let a_nodes = free_nodes(state, a, &[NodeFlags::COMBINED, NodeFlags::PUNISHED, NodeFlags::HARMED]);
        let b_nodes = free_nodes(state, b, &[NodeFlags::COMBINED, NodeFlags::PUNISHED, NodeFlags::HARMED]);
        if !a_nodes.is_empty() && !b_nodes.is_empty() {
            for index in a_nodes.into_iter().chain(b_nodes) {
                deduct(state, index, config.harm_loss_ratio, NodeFlags::HARMED);
            }
        }
    }

    // Self-punishment needs the same branch at least twice.
    for branch in SELF_PUNISH_BRANCHES {
        let nodes = free_nodes(
            state,
            branch,
            &[
                NodeFlags::COMBINED,
                NodeFlags::PUNISHED,
                NodeFlags::HARMED,
                NodeFlags::SELF_PUNISHED,
            ],
        );
        if nodes.len() >= 2 {
            for index in nodes {
                deduct(
                    state,
                    index,
                    config.self_punish_loss_ratio,
                    NodeFlags::SELF_PUNISHED,
                );
            }
        }
    }
}

fn free_nodes(state: &SimulationState, branch: Branch, excluded: &[NodeFlags]) -> Vec<usize> {
    branch_node_indices(state, branch)
        .filter(|index| {
            let flags = state.nodes[*index].flags;
            excluded.iter().all(|flag| !flags.contains(*flag))
        })
        .collect()
}

fn deduct(state: &mut SimulationState, index: usize, ratio: f64, flag: NodeFlags) {
    let config = state.config.clone();
    let total = state.nodes[index].total_energy();
    if total > 0.0 {
        state.nodes[index].distribute_energy(-(total * ratio), &config);
        state.nodes[index].flags.insert(flag);
    }
}
