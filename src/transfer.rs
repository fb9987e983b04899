//! Energy transfer passes: generative feeding and restraining losses.
//!
//! Generation follows the mother-gives / ambient-supplements / efficiency
//! model: the mother yields an exponentially decaying share of her acting
//! element, ambient energy tops the gift up, and the child converts the
//! total at a pair-dependent efficiency. Restraint costs both sides, with
//! exponential loss curves tuned per controlling pair.

use crate::element::{FiveElement, Polarity};
use crate::node::position_matrix_coeff;
use crate::state::{RelationKind, SimulationState};

const MIN_ENERGY: f64 = 1e-6;
const MIN_LOSS_RATIO: f64 = 0.005;

struct GenerateOutcome {
    given: f64,
    external: f64,
    received: f64,
}

/// Ambient-response coefficient bounds per polarity pairing.
const fn polarity_external_bounds(mother: Polarity, child: Polarity) -> (f64, f64) {
    match (mother, child) {
        (Polarity::Yang, Polarity::Yang) => (1.2, 2.0),
        (Polarity::Yang, Polarity::Yin) => (1.0, 1.8),
        (Polarity::Yin, Polarity::Yang) => (0.6, 1.2),
        (Polarity::Yin, Polarity::Yin) => (0.8, 1.5),
    }
}

/// Ambient bonus of a generating element pair.
fn element_external_bonus(mother: FiveElement, child: FiveElement) -> f64 {
    use FiveElement::{Earth, Fire, Metal, Water, Wood};
    match (mother, child) {
        (Wood, Fire) => 0.4,
        (Fire, Earth) => 0.2,
        (Earth, Metal) => 0.3,
        (Metal, Water) => 0.35,
        (Water, Wood) => 0.5,
        _ => 0.2,
    }
}

/// Base conversion efficiency and polarity swing of a generating pair.
fn element_efficiency_profile(mother: FiveElement, child: FiveElement) -> (f64, f64) {
    use FiveElement::{Earth, Fire, Metal, Water, Wood};
    match (mother, child) {
        (Wood, Fire) => (0.75, 0.1),
        (Fire, Earth) => (0.65, 0.1),
        (Earth, Metal) => (0.8, 0.15),
        (Metal, Water) => (0.85, 0.1),
        (Water, Wood) => (0.9, 0.05),
        _ => (0.7, 0.1),
    }
}

const fn polarity_efficiency_adjust(mother: Polarity, child: Polarity) -> f64 {
    match (mother, child) {
        (Polarity::Yang, Polarity::Yang) => 0.8,
        (Polarity::Yang, Polarity::Yin) => 0.4,
        (Polarity::Yin, Polarity::Yang) => -0.2,
        (Polarity::Yin, Polarity::Yin) => 0.0,
    }
}

/// One generative interaction between a mother and a child attribute.
#[allow(clippy::too_many_arguments)]
fn generate_once(
    mother_energy: f64,
    child_energy: f64,
    mother_element: FiveElement,
    child_element: FiveElement,
    mother_polarity: Polarity,
    child_polarity: Polarity,
    cycle_boost: f64,
    state: &SimulationState,
) -> GenerateOutcome {
    let config = &state.config;
    let safe_mother = mother_energy.max(MIN_ENERGY);
    let safe_child = child_energy.max(MIN_ENERGY);
    let ratio = safe_mother / safe_child;

    // Giving share decays as the mother outweighs the child.
    let max_give = config.relation_generate_gain * cycle_boost;
    let min_give = (0.005 * cycle_boost).min(max_give * 0.2);
    let give_ratio = (max_give * (-0.8 * ratio).exp()).clamp(min_give, max_give);
    let given = safe_mother * give_ratio;

    // Ambient response scales with polarity pairing, element pairing, and
    // how strongly the mother outweighs the child.
    let (yy_base, yy_max) = polarity_external_bounds(mother_polarity, child_polarity);
    let bonus = element_external_bonus(mother_element, child_element);
    let ratio_factor = if ratio >= 1.0 {
        (1.0 + (ratio - 1.0) * 0.1).min(1.2)
    } else {
        ratio.max(0.6)
    };
    let external_coef =
        ((yy_base + bonus) * ratio_factor * cycle_boost).clamp(0.1, yy_max * cycle_boost);

    // Conversion efficiency peaks when the mother is slightly stronger.
    let (eff_base, eff_range) = element_efficiency_profile(mother_element, child_element);
    let eff_adjust = polarity_efficiency_adjust(mother_polarity, child_polarity);
    let ratio_eff = if ratio < 1.0 {
        0.5 + ratio * 0.5
    } else if ratio > 2.0 {
        1.0 - (ratio - 2.0) * 0.05
    } else {
        1.0
    };
    let efficiency = ((eff_base + eff_adjust * eff_range) * ratio_eff).clamp(0.05, 0.95);

    // Ambient energy must dominate the conversion: after the global scale
    // the effective coefficient stays strictly above the efficiency.
    let mut effective_external = external_coef * config.global_external_energy_ratio;
    if effective_external <= efficiency {
        effective_external = efficiency + 0.1;
    }

    let external = given * effective_external;
    let received = (given + external) * efficiency;

    GenerateOutcome {
        given,
        external,
        received,
    }
}

/// Runs the generative pass: first around the five-element cycle, then
/// over the remaining generative edges.
pub fn apply_generate(state: &mut SimulationState) {
    let config = state.config.clone();

    if let Some(cycle) = state.cycle {
        let boost = config.cycle_generate_gain / config.relation_generate_gain.max(1e-6);
        for step in 0..cycle.len() {
            let mother = cycle[step];
            let child = cycle[(step + 1) % cycle.len()];
            let mother_element = state.nodes[mother].original_element;
            let child_element = state.nodes[child].original_element;
            let mother_energy = state.nodes[mother].energies.get_or_zero(mother_element);
            let child_energy = state.nodes[child].energies.get_or_zero(child_element);
            if mother_energy <= 0.0 || child_energy <= 0.0 {
                continue;
            }

            let outcome = generate_once(
                mother_energy,
                child_energy,
                mother_element,
                child_element,
                state.nodes[mother].polarity,
                state.nodes[child].polarity,
                boost,
                state,
            );
            apply_generate_outcome(state, mother, child, mother_element, child_element, &outcome);
        }
    }

    let edges: Vec<_> = state
        .edges
        .iter()
        .filter(|edge| edge.kind == RelationKind::Generative)
        .copied()
        .collect();
    for edge in edges {
        if let Some(cycle) = state.cycle {
            if cycle.contains(&edge.source) && cycle.contains(&edge.target) {
                continue;
            }
        }
        let mother_element = edge.element;
        let child_element = edge.target_element();
        let mother_energy = state.nodes[edge.source].energies.get_or_zero(mother_element);
        let child_energy = state.nodes[edge.target].energies.get_or_zero(child_element);
        if mother_energy <= 0.0 || child_energy <= 0.0 {
            continue;
        }

        let outcome = generate_once(
            mother_energy,
            child_energy,
            mother_element,
            child_element,
            state.nodes[edge.source].polarity,
            state.nodes[edge.target].polarity,
            1.0,
            state,
        );
        apply_generate_outcome(
            state,
            edge.source,
            edge.target,
            mother_element,
            child_element,
            &outcome,
        );
    }
}

fn apply_generate_outcome(
    state: &mut SimulationState,
    mother: usize,
    child: usize,
    mother_element: FiveElement,
    child_element: FiveElement,
    outcome: &GenerateOutcome,
) {
    let config = state.config.clone();
    let edge_weight = state.nodes[mother].position_weight()
        * state.nodes[child].position_weight()
        * position_matrix_coeff(&state.nodes[mother], &state.nodes[child], &config);

    let effective_given =
        outcome.given * state.nodes[mother].action_efficiency() * edge_weight;
    let effective_received =
        outcome.received * state.nodes[child].action_efficiency() * edge_weight;

    if effective_given > 0.0 {
        state.nodes[mother].update_energy(mother_element, -effective_given, &config);
        state.nodes[mother].increment_action_count();
    }
    if effective_received > 0.0 {
        state.nodes[child].update_energy(child_element, effective_received, &config);
        state.nodes[child].increment_action_count();
    }
}

/// Exponential-loss parameters of a controlling pair.
struct RestraintProfile {
    max_loss_source: f64,
    max_loss_target: f64,
    alpha: f64,
    beta: f64,
}

fn restraint_profile(
    source: FiveElement,
    target: FiveElement,
    default_source: f64,
    default_target: f64,
) -> RestraintProfile {
    use FiveElement::{Earth, Fire, Metal, Water, Wood};
    match (source, target) {
        (Wood, Earth) => RestraintProfile {
            max_loss_source: 0.28,
            max_loss_target: 0.25,
            alpha: 1.0,
            beta: 1.0,
        },
        (Fire, Metal) => RestraintProfile {
            max_loss_source: 0.25,
            max_loss_target: 0.32,
            alpha: 1.3,
            beta: 1.2,
        },
        (Earth, Water) => RestraintProfile {
            max_loss_source: 0.22,
            max_loss_target: 0.30,
            alpha: 1.5,
            beta: 1.3,
        },
        (Metal, Wood) => RestraintProfile {
            max_loss_source: 0.18,
            max_loss_target: 0.40,
            alpha: 2.0,
            beta: 1.8,
        },
        (Water, Fire) => RestraintProfile {
            max_loss_source: 0.20,
            max_loss_target: 0.38,
            alpha: 1.8,
            beta: 1.6,
        },
        // Non-canonical pairs lose almost nothing.
        _ => RestraintProfile {
            max_loss_source: default_source.min(0.01),
            max_loss_target: default_target.min(0.01),
            alpha: 1.0,
            beta: 1.0,
        },
    }
}

const fn polarity_power_factor(source: Polarity, target: Polarity) -> f64 {
    match (source, target) {
        (Polarity::Yang, Polarity::Yang) => 1.4,
        (Polarity::Yin, Polarity::Yin) => 1.0,
        (Polarity::Yang, Polarity::Yin) => 1.2,
        (Polarity::Yin, Polarity::Yang) => 0.9,
    }
}

/// Runs the restraining pass over all controlling edges. Both sides pay:
/// the controller spends energy to suppress, the controlled loses more.
pub fn apply_control(state: &mut SimulationState) {
    let config = state.config.clone();
    let edges: Vec<_> = state
        .edges
        .iter()
        .filter(|edge| edge.kind == RelationKind::Controlling)
        .copied()
        .collect();

    for edge in edges {
        let source_element = edge.element;
        let target_element = edge.target_element();
        let source_energy = state.nodes[edge.source].energies.get_or_zero(source_element);
        let target_energy = state.nodes[edge.target].energies.get_or_zero(target_element);
        if source_energy <= 0.0 || target_energy <= 0.0 {
            continue;
        }

        let profile = restraint_profile(
            source_element,
            target_element,
            config.relation_control_source_loss,
            config.relation_control_target_loss,
        );
        let ratio = source_energy.max(MIN_ENERGY) / target_energy.max(MIN_ENERGY);

        let mut loss_source = profile.max_loss_source * (-profile.alpha * ratio).exp();
        let mut loss_target = profile.max_loss_target * (1.0 - (-profile.beta * ratio).exp());
        loss_source = loss_source.max(MIN_LOSS_RATIO);
        loss_target = loss_target.max(MIN_LOSS_RATIO);

        // Polarity drift: same-yang restraint bites harder, same-yin softer.
        let source_polarity = state.nodes[edge.source].polarity;
        let target_polarity = state.nodes[edge.target].polarity;
        let delta = match (source_polarity, target_polarity) {
            (Polarity::Yang, Polarity::Yang) => config.same_yang_delta,
            (Polarity::Yin, Polarity::Yin) => config.same_yin_delta,
            _ => 0.0,
        };
        let adjust = 1.0 + delta;
        let power = polarity_power_factor(source_polarity, target_polarity);
        loss_source = (loss_source * adjust * power)
            .clamp(MIN_LOSS_RATIO, profile.max_loss_source.max(MIN_LOSS_RATIO));
        loss_target = (loss_target * adjust * power)
            .clamp(MIN_LOSS_RATIO, profile.max_loss_target.max(MIN_LOSS_RATIO));

        let edge_weight = state.nodes[edge.source].position_weight()
            * state.nodes[edge.target].position_weight()
            * position_matrix_coeff(&state.nodes[edge.source], &state.nodes[edge.target], &config);

        let source_loss = source_energy
            * loss_source
            * state.nodes[edge.source].action_efficiency()
            * edge_weight;
        let target_loss = target_energy
            * loss_target
            * state.nodes[edge.target].action_efficiency()
            * edge_weight;

        if source_loss > 0.0 {
            state.nodes[edge.source].update_energy(source_element, -source_loss, &config);
            state.nodes[edge.source].increment_action_count();
        }
        if target_loss > 0.0 {
            state.nodes[edge.target].update_energy(target_element, -target_loss, &config);
            state.nodes[edge.target].increment_action_count();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_state;
    use crate::config::EnergyConfig;
    use crate::network::{build_relations, detect_cycle};
    use crate::pillars::PillarSet;

    fn state_for(year: &str, month: &str, day: &str, hour: &str) -> SimulationState {
        let pillars = PillarSet::parse(year, month, day, hour).unwrap();
        let mut state = build_state(&pillars, &EnergyConfig::default());
        build_relations(&mut state);
        detect_cycle(&mut state);
        state.reset_action_counts();
        state
    }

    #[test]
    fn test_ambient_coefficient_dominates_efficiency() {
        // For any polarity pairing, element pairing, and energy ratio, the
        // effective ambient coefficient stays strictly above the
        // conversion efficiency.
        let state = state_for("甲子", "丙寅", "戊午", "庚申");
        let polarities = [Polarity::Yang, Polarity::Yin];
        let ratios = [0.05, 0.5, 1.0, 2.0, 10.0];
        for mother_element in FiveElement::ALL {
            let child_element = mother_element.generates();
            for mother_polarity in polarities {
                for child_polarity in polarities {
                    for r in ratios {
                        let outcome = generate_once(
                            1000.0 * r,
                            1000.0,
                            mother_element,
                            child_element,
                            mother_polarity,
                            child_polarity,
                            1.0,
                            &state,
                        );
                        let effective_external = outcome.external / outcome.given;
                        let efficiency = outcome.received / (outcome.given + outcome.external);
                        assert!(
                            effective_external > efficiency,
                            "{mother_element}->{child_element} r={r}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_give_ratio_decays_with_mother_surplus() {
        let state = state_for("甲子", "丙寅", "戊午", "庚申");
        let weak = generate_once(
            100.0,
            1000.0,
            FiveElement::Wood,
            FiveElement::Fire,
            Polarity::Yang,
            Polarity::Yang,
            1.0,
            &state,
        );
        let strong = generate_once(
            10_000.0,
            1000.0,
            FiveElement::Wood,
            FiveElement::Fire,
            Polarity::Yang,
            Polarity::Yang,
            1.0,
            &state,
        );
        // A mother dwarfing the child gives a smaller fraction of herself.
        assert!(weak.given / 100.0 > strong.given / 10_000.0);
    }

    #[test]
    fn test_generate_moves_energy_mother_to_child() {
        // No metal anywhere, so no cycle: only plain wood→fire edges run.
        // Wood stems purely give, fire stems purely receive.
        let mut state = state_for("甲子", "乙丑", "丙寅", "丁卯");
        let wood_before = state.nodes[0].energies.get_or_zero(FiveElement::Wood);
        let fire_before = state.nodes[4].energies.get_or_zero(FiveElement::Fire);
        apply_generate(&mut state);
        assert!(state.nodes[0].energies.get_or_zero(FiveElement::Wood) < wood_before);
        assert!(state.nodes[4].energies.get_or_zero(FiveElement::Fire) > fire_before);
    }

    #[test]
    fn test_generate_books_action_counts() {
        let mut state = state_for("甲子", "丙寅", "戊午", "庚申");
        apply_generate(&mut state);
        assert!(state.nodes.iter().any(|n| n.action_count > 0));
    }

    #[test]
    fn test_control_costs_both_sides() {
        // 壬 (water) controls 丙 (fire).
        let mut state = state_for("壬子", "丙午", "甲寅", "戊辰");
        let water_before = state.nodes[0].energies.get_or_zero(FiveElement::Water);
        let fire_before = state.nodes[2].energies.get_or_zero(FiveElement::Fire);
        apply_control(&mut state);
        assert!(state.nodes[0].energies.get_or_zero(FiveElement::Water) < water_before);
        assert!(state.nodes[2].energies.get_or_zero(FiveElement::Fire) < fire_before);
    }

    #[test]
    fn test_restraint_profile_covers_canonical_pairs() {
        for source in FiveElement::ALL {
            let target = source.controls();
            let profile = restraint_profile(source, target, 0.25, 0.35);
            assert!(profile.max_loss_source > 0.01);
            assert!(profile.max_loss_target > 0.01);
        }
        let off = restraint_profile(FiveElement::Wood, FiveElement::Fire, 0.25, 0.35);
        assert!(off.max_loss_source <= 0.01);
    }

    #[test]
    fn test_repeated_actions_diminish() {
        let mut state = state_for("甲子", "丙寅", "戊午", "庚申");
        apply_generate(&mut state);
        let counts: Vec<u32> = state.nodes.iter().map(|n| n.action_count).collect();
        // Stems engaged in several edges accumulate multiple actions.
        assert!(counts.iter().any(|c| *c >= 2));
    }
}
