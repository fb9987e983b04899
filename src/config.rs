//! Engine configuration with defaults and validation.
//!
//! Every field carries `#[serde(default)]` so a JSON object with any
//! subset of fields is a valid partial override of the defaults.

use serde::{Deserialize, Serialize};

use crate::error::{EngineResult, ValidationError};

/// Tunable coefficients of the energy pipeline.
///
/// The defaults carry the calibrated values; construct with
/// `EnergyConfig::default()` and adjust fields, or deserialize a partial
/// JSON override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Base energy assigned to each stem node.
    pub stem_base_energy: f64,
    /// Base energy assigned to each branch node, split across hidden stems.
    pub branch_base_energy: f64,
    /// Per-element floor. No element present on a node drops below this.
    pub min_energy: f64,
    /// Per-element ceiling. No element on a node exceeds this.
    pub max_energy: f64,

    /// Multiplier when a stem is rooted in its own pillar's branch (main qi).
    pub root_gain_factor: f64,
    /// Multiplier when a stem finds residual qi in its own pillar's branch.
    pub qi_gain_factor: f64,

    /// Maximum fraction of a mother node's energy given per generative edge.
    pub relation_generate_gain: f64,
    /// Generative gain used on the five-element cycle pass.
    pub cycle_generate_gain: f64,
    /// Maximum fraction lost by the controlling side of a restraining edge.
    pub relation_control_source_loss: f64,
    /// Maximum fraction lost by the controlled side of a restraining edge.
    pub relation_control_target_loss: f64,

    /// Loss-ratio delta when both sides of a restraint are yang.
    pub same_yang_delta: f64,
    /// Loss-ratio delta when both sides of a restraint are yin.
    pub same_yin_delta: f64,

    /// Multiplier on a branch element that also appears in a stem.
    pub penetration_factor: f64,

    /// Fraction of member energy contributed into a combination pool.
    pub combination_contribution_ratio: f64,
    /// External top-up fraction applied to a combination pool.
    pub combination_external_gain: f64,
    /// Global scale on all external (ambient) energy inflow.
    pub global_external_energy_ratio: f64,

    /// Energy fraction lost by each participant of a punishment.
    pub punish_loss_ratio: f64,
    /// Energy fraction lost by each participant of a harm.
    pub harm_loss_ratio: f64,
    /// Energy fraction lost by each duplicated self-punishing branch.
    pub self_punish_loss_ratio: f64,

    /// Absolute total below which an element is very weak.
    pub status_very_weak_below: f64,
    /// Absolute total below which an element is weak.
    pub status_weak_below: f64,
    /// Absolute total above which an element is strong.
    pub status_strong_above: f64,
    /// Absolute total above which an element is very strong.
    pub status_very_strong_above: f64,

    /// Relative-to-average ratio below which an element is very weak.
    pub status_ratio_very_weak: f64,
    /// Relative-to-average ratio below which an element is weak.
    pub status_ratio_weak: f64,
    /// Relative-to-average ratio above which an element is strong.
    pub status_ratio_strong: f64,
    /// Relative-to-average ratio above which an element is very strong.
    pub status_ratio_very_strong: f64,

    /// Enables the positional interaction matrix on edge weights.
    pub enable_position_matrix: bool,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            stem_base_energy: 1000.0,
            branch_base_energy: 1200.0,
            min_energy: 10.0,
            max_energy: 10000.0,

            root_gain_factor: 1.5,
            qi_gain_factor: 1.2,

            relation_generate_gain: 0.3,
            cycle_generate_gain: 0.3,
            relation_control_source_loss: 0.25,
            relation_control_target_loss: 0.35,

            same_yang_delta: 0.03,
            same_yin_delta: -0.03,

            penetration_factor: 1.1,

            combination_contribution_ratio: 0.5,
            combination_external_gain: 0.5,
            global_external_energy_ratio: 0.1,

            punish_loss_ratio: 0.20,
            harm_loss_ratio: 0.15,
            self_punish_loss_ratio: 0.12,

            status_very_weak_below: 50.0,
            status_weak_below: 300.0,
            status_strong_above: 3000.0,
            status_very_strong_above: 6000.0,

            status_ratio_very_weak: 0.2,
            status_ratio_weak: 0.5,
            status_ratio_strong: 1.5,
            status_ratio_very_strong: 2.5,

            enable_position_matrix: false,
        }
    }
}

impl EnergyConfig {
    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns a validation error for inverted energy bounds, non-positive
    /// base energies or gain factors, or loss/contribution ratios outside
    /// [0, 1].
    pub fn validate(&self) -> EngineResult<()> {
        if self.min_energy >= self.max_energy {
            return Err(ValidationError::InvertedEnergyBounds {
                min: self.min_energy,
                max: self.max_energy,
            }
            .into());
        }

        let positive: [(&'static str, f64); 7] = [
            ("stem_base_energy", self.stem_base_energy),
            ("branch_base_energy", self.branch_base_energy),
            ("min_energy", self.min_energy),
            ("root_gain_factor", self.root_gain_factor),
            ("qi_gain_factor", self.qi_gain_factor),
            ("penetration_factor", self.penetration_factor),
            ("global_external_energy_ratio", self.global_external_energy_ratio),
        ];
        for (field, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(ValidationError::ConfigOutOfRange { field, value }.into());
            }
        }

        let unit_interval: [(&'static str, f64); 8] = [
            ("relation_generate_gain", self.relation_generate_gain),
            ("cycle_generate_gain", self.cycle_generate_gain),
            ("relation_control_source_loss", self.relation_control_source_loss),
            ("relation_control_target_loss", self.relation_control_target_loss),
            ("combination_contribution_ratio", self.combination_contribution_ratio),
            ("punish_loss_ratio", self.punish_loss_ratio),
            ("harm_loss_ratio", self.harm_loss_ratio),
            ("self_punish_loss_ratio", self.self_punish_loss_ratio),
        ];
        for (field, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(ValidationError::ConfigOutOfRange { field, value }.into());
            }
        }

        Ok(())
    }
}
