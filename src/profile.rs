//! Boundary rescaling and the aggregated element profile.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EnergyConfig;
use crate::element::FiveElement;
use crate::state::SimulationState;

/// Clamps every node's total energy into the configured bounds by
/// proportional rescaling. A node whose total has collapsed to zero or
/// below is reset to the floor on its original element.
pub fn apply_energy_bounds(state: &mut SimulationState) {
    let config = state.config.clone();
    for index in 0..state.nodes.len() {
        let total = state.nodes[index].total_energy();
        if total <= 0.0 {
            let element = state.nodes[index].original_element;
            state.nodes[index].update_energy(element, config.min_energy, &config);
            continue;
        }
        if total > config.max_energy {
            let scale = config.max_energy / total;
            state.nodes[index].distribute_energy(total * (scale - 1.0), &config);
        } else if total < config.min_energy {
            state.nodes[index].distribute_energy(config.min_energy - total, &config);
        }
    }
}

/// Sums element energy over all nodes, treating absent entries as zero.
#[must_use]
pub fn summarize_elements(state: &SimulationState) -> [f64; 5] {
    let mut totals = [0.0; 5];
    for node in &state.nodes {
        for (element, value) in node.energies.entries() {
            totals[element.index()] += value;
        }
    }
    totals
}

/// Five-level strength classification of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementStatus {
    /// Far below the chart's working range.
    VeryWeak,
    /// Below average or absolutely low.
    Weak,
    /// Within the normal band.
    Balanced,
    /// Above average or absolutely high.
    Strong,
    /// Far above the chart's working range.
    VeryStrong,
}

impl fmt::Display for ElementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::VeryWeak => "very weak",
            Self::Weak => "weak",
            Self::Balanced => "balanced",
            Self::Strong => "strong",
            Self::VeryStrong => "very strong",
        };
        f.write_str(label)
    }
}

/// Classifies one element total against the absolute and relative
/// thresholds. Absolute extremes win outright; the relative-to-average
/// ratios settle the middle band, and the milder absolute thresholds
/// catch what the ratios leave open.
#[must_use]
pub fn classify_status(energy: f64, average: f64, config: &EnergyConfig) -> ElementStatus {
    if energy < config.status_very_weak_below {
        return ElementStatus::VeryWeak;
    }
    if energy > config.status_very_strong_above {
        return ElementStatus::VeryStrong;
    }
    if average > 0.0 {
        let ratio = energy / average;
        if ratio < config.status_ratio_very_weak {
            return ElementStatus::VeryWeak;
        }
        if ratio < config.status_ratio_weak {
            return ElementStatus::Weak;
        }
        if ratio > config.status_ratio_very_strong {
            return ElementStatus::VeryStrong;
        }
        if ratio > config.status_ratio_strong {
            return ElementStatus::Strong;
        }
    }
    if energy < config.status_weak_below {
        return ElementStatus::Weak;
    }
    if energy > config.status_strong_above {
        return ElementStatus::Strong;
    }
    ElementStatus::Balanced
}

/// One element's aggregated reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementReading {
    /// The element.
    pub element: FiveElement,
    /// Total energy over all nodes.
    pub energy: f64,
    /// Share of the chart total, in [0, 1].
    pub share: f64,
    /// Five-level classification.
    pub status: ElementStatus,
}

/// The chart's aggregated five-element distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementProfile {
    /// Per-element readings in canonical order.
    pub readings: [ElementReading; 5],
    /// Total energy over all elements.
    pub total: f64,
}

impl ElementProfile {
    /// Builds the profile from per-element totals.
    #[must_use]
    pub fn from_totals(totals: [f64; 5], config: &EnergyConfig) -> Self {
        let total: f64 = totals.iter().sum();
        let average = total / 5.0;
        let readings = FiveElement::ALL.map(|element| {
            let energy = totals[element.index()];
            ElementReading {
                element,
                energy,
                share: if total > 0.0 { energy / total } else { 0.0 },
                status: classify_status(energy, average, config),
            }
        });
        Self { readings, total }
    }

    /// The reading for one element.
    #[must_use]
    pub fn reading(&self, element: FiveElement) -> &ElementReading {
        &self.readings[element.index()]
    }

    /// The element with the highest energy.
    #[must_use]
    pub fn dominant(&self) -> FiveElement {
        self.readings
            .iter()
            .max_by(|a, b| a.energy.total_cmp(&b.energy))
            .map_or(FiveElement::Wood, |reading| reading.element)
    }

    /// The element with the lowest energy.
    #[must_use]
    pub fn weakest(&self) -> FiveElement {
        self.readings
            .iter()
            .min_by(|a, b| a.energy.total_cmp(&b.energy))
            .map_or(FiveElement::Wood, |reading| reading.element)
    }
}
