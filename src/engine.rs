//! The analysis entry point: runs the fixed stage pipeline over a chart
//! and assembles the report.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::builder::build_state;
use crate::config::EnergyConfig;
use crate::error::EngineResult;
use crate::network::{build_relations, detect_cycle};
use crate::node::{NodeFlags, NodeSnapshot};
use crate::pattern::{judge_pattern, PatternVerdict};
use crate::pillars::PillarSet;
use crate::profile::{apply_energy_bounds, summarize_elements, ElementProfile};
use crate::state::{LogEntry, Stage};
use crate::structure::{apply_combinations, apply_punish_harm, mark_clashes};
use crate::ten_god::{energy_vector, TenGodProfile};
use crate::transfer::{apply_control, apply_generate};

/// Unique identifier of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(Uuid);

impl AnalysisId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The complete output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Run identifier.
    pub id: AnalysisId,
    /// The analyzed chart.
    pub pillars: PillarSet,
    /// Aggregated five-element distribution after balancing.
    pub element_profile: ElementProfile,
    /// Ten-god distribution before and after balancing.
    pub ten_gods: TenGodProfile,
    /// Pattern verdict.
    pub pattern: PatternVerdict,
    /// Node states right after init, before structural adjustment.
    pub base_snapshot: Vec<NodeSnapshot>,
    /// Node states right before the transfer stages.
    pub raw_snapshot: Vec<NodeSnapshot>,
    /// Node states after the final bounds pass.
    pub final_snapshot: Vec<NodeSnapshot>,
    /// Per-stage audit trail.
    pub log: Vec<LogEntry>,
}

/// Runs the full pipeline over a parsed chart.
///
/// The stage order is fixed: init, clash, combine, punish/harm,
/// relations, cycle, raw snapshot, generate, control, bounds. Each stage
/// appends a log entry with full node snapshots, so the report carries a
/// complete audit trail of every energy movement.
///
/// # Errors
///
/// Returns a validation error when the configuration is inconsistent.
pub fn analyze(pillars: &PillarSet, config: &EnergyConfig) -> EngineResult<AnalysisReport> {
    config.validate()?;
    let mut state = build_state(pillars, config);

    mark_clashes(&mut state);
    let clashed = count_flag(&state.snapshot_all(), NodeFlags::CLASHED);
    state.log_stage(Stage::Clash, format!("marked {clashed} clashed branches"));

    apply_combinations(&mut state, pillars.month_branch());
    let combined = count_flag(&state.snapshot_all(), NodeFlags::COMBINED);
    state.log_stage(
        Stage::Combine,
        format!("combined {combined} branches and paired stems"),
    );

    apply_punish_harm(&mut state);
    state.log_stage(Stage::PunishHarm, "applied punishments and harms");

    build_relations(&mut state);
    let edge_count = state.edges.len();
    state.log_stage(Stage::Relations, format!("built {edge_count} edges"));

    detect_cycle(&mut state);
    let cycle_note = if state.cycle.is_some() {
        "full five-element cycle present"
    } else {
        "no full cycle"
    };
    state.log_stage(Stage::Cycle, cycle_note);

    state.reset_action_counts();
    state.raw_snapshot = state.snapshot_all();
    state.log_stage(Stage::RawSnapshot, "captured pre-transfer snapshot");

    apply_generate(&mut state);
    state.log_stage(Stage::Generate, "ran generative transfer");

    apply_control(&mut state);
    state.log_stage(Stage::Control, "ran restraining transfer");

    apply_energy_bounds(&mut state);
    state.log_stage(Stage::Bounds, "rescaled node totals into bounds");

    let element_profile = ElementProfile::from_totals(summarize_elements(&state), config);
    let final_snapshot = state.snapshot_all();
    let day_master = pillars.day_master();
    let raw = energy_vector(&state.raw_snapshot, day_master);
    let balanced = energy_vector(&final_snapshot, day_master);
    let pattern = judge_pattern(&state.raw_snapshot, &raw, &balanced, day_master);

    Ok(AnalysisReport {
        id: AnalysisId::new(),
        pillars: *pillars,
        element_profile,
        ten_gods: TenGodProfile {
            day_master,
            raw,
            balanced,
        },
        pattern,
        base_snapshot: state.base_snapshot,
        raw_snapshot: state.raw_snapshot,
        final_snapshot,
        log: state.log,
    })
}

/// Parses four pillar strings and runs [`analyze`].
///
/// # Errors
///
/// Returns a validation error for malformed pillar strings or an
/// inconsistent configuration.
pub fn analyze_chart(
    year: &str,
    month: &str,
    day: &str,
    hour: &str,
    config: &EnergyConfig,
) -> EngineResult<AnalysisReport> {
    let pillars = PillarSet::parse(year, month, day, hour)?;
    analyze(&pillars, config)
}

fn count_flag(snapshot: &[NodeSnapshot], flag: NodeFlags) -> usize {
    snapshot
        .iter()
        .filter(|node| node.flags.contains(flag))
        .count()
}
