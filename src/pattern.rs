//! Pattern identification over the ten-god energy distribution.
//!
//! The judge reads two ten-god vectors, the pre-transfer one and the
//! balanced one, locates the dominant tension (the disease), the
//! category that spent the most energy opposing it (the remedy), and
//! derives the classical action, result tags, pattern name, and a
//! hundred-point evaluation.

use serde::{Deserialize, Serialize};

use crate::alphabet::{Branch, Stem};
use crate::node::{NodeFlags, NodeKind, NodeSnapshot};
use crate::ten_god::{ten_god_of, TenGod};

/// Per-category threat weights, indexed by [`TenGod::index`].
const THREAT_COEFFICIENTS: [f64; 10] = [
    0.35, 0.90, 0.50, 1.25, 0.30, 0.60, 0.55, 2.50, 0.25, 0.40,
];

/// Supportive categories never counted as a disease: friend, both
/// wealths, and both seals.
const EXCLUDED_DISEASE_INDICES: [usize; 5] = [0, 4, 5, 8, 9];

const DISEASE_THRESHOLD: f64 = 0.7;
const REMEDY_THRESHOLD: f64 = 0.3;

/// How the remedy operates on the disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternAction {
    /// 制: direct suppression.
    Suppress,
    /// 合: binding combination.
    Combine,
    /// 化: transformation into support.
    Transform,
    /// 配: pairing that neutralizes.
    Pair,
    /// 担: peers carry the load.
    Carry,
    /// 坏: wealth breaks the seal.
    Break,
    /// 泄: draining outflow.
    Drain,
    /// 调: general harmonization.
    Harmonize,
}

impl PatternAction {
    /// The single-character action name used in pattern titles.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Suppress => '制',
            Self::Combine => '合',
            Self::Transform => '化',
            Self::Pair => '配',
            Self::Carry => '担',
            Self::Break => '坏',
            Self::Drain => '泄',
            Self::Harmonize => '调',
        }
    }

    /// The two-character verb used in explanations.
    #[must_use]
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::Suppress => "制约",
            Self::Combine => "合化",
            Self::Transform => "化解",
            Self::Pair => "配合",
            Self::Carry => "分担",
            Self::Break => "克制",
            Self::Drain => "泄耗",
            Self::Harmonize => "调和",
        }
    }
}

/// Favorable outcomes the balancing pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTag {
    /// 生财: wealth categories grew.
    WealthGain,
    /// 生官: officer categories grew.
    StatusGain,
    /// 生印: seal categories grew.
    ScholarGain,
    /// 生身: the day master's own category grew.
    SelfGain,
    /// 成势: the whole chart gained momentum.
    Momentum,
    /// 成局: the disease was decisively suppressed.
    Consolidation,
}

impl ResultTag {
    /// The two-character tag appended to pattern names.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::WealthGain => "生财",
            Self::StatusGain => "生官",
            Self::ScholarGain => "生印",
            Self::SelfGain => "生身",
            Self::Momentum => "成势",
            Self::Consolidation => "成局",
        }
    }

    /// The phrase used in explanations.
    #[must_use]
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::WealthGain => "转化为财富",
            Self::StatusGain => "获得地位",
            Self::ScholarGain => "增强学识",
            Self::SelfGain => "提升自身",
            Self::Momentum => "形成气势",
            Self::Consolidation => "格局稳固",
        }
    }
}

/// Quality band of the overall pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternGrade {
    /// 上等格局: score 80 or above.
    Superior,
    /// 中等格局: score 70 to 79.
    Medium,
    /// 下等格局: score 60 to 69.
    Inferior,
    /// 破格: score below 60.
    Broken,
}

impl PatternGrade {
    /// The traditional grade name.
    #[must_use]
    pub const fn chinese(self) -> &'static str {
        match self {
            Self::Superior => "上等格局",
            Self::Medium => "中等格局",
            Self::Inferior => "下等格局",
            Self::Broken => "破格",
        }
    }
}

/// One category's accumulated threat against the day master.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatReading {
    /// The threatening category.
    pub god: TenGod,
    /// Raw accumulated threat.
    pub threat: f64,
    /// Threat normalized into [0, 1] by the chart maximum.
    pub normalized: f64,
}

/// The remedy candidate and how much energy it spent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemedyReading {
    /// The category acting as remedy.
    pub god: TenGod,
    /// Fraction of its raw energy consumed during balancing.
    pub loss_rate: f64,
}

/// One favorable result with its growth rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultReading {
    /// The result tag.
    pub tag: ResultTag,
    /// The category the result centers on, when one applies.
    pub focus: Option<TenGod>,
    /// Balanced-over-raw growth rate for the focus category.
    pub increase_rate: f64,
}

/// The three scored dimensions and their sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternScore {
    /// How decisively the disease was suppressed, up to 40.
    pub suppression: u32,
    /// The day master's standing in the balanced chart, up to 30.
    pub self_standing: u32,
    /// How efficiently the remedy worked, up to 30.
    pub remedy: u32,
    /// Sum of the three dimensions.
    pub total: u32,
}

/// The full pattern verdict for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternVerdict {
    /// Composed pattern name, e.g. 食神制七杀生财格.
    pub name: String,
    /// One-sentence reading of the pattern.
    pub explanation: String,
    /// The dominant tension, when one crosses the threshold.
    pub disease: Option<TenGod>,
    /// The remedy, when one spent enough energy.
    pub remedy: Option<RemedyReading>,
    /// How the remedy operates on the disease.
    pub action: Option<PatternAction>,
    /// Favorable results, strongest first.
    pub results: Vec<ResultReading>,
    /// All nonzero threats, strongest first.
    pub threats: Vec<ThreatReading>,
    /// The scored evaluation.
    pub score: PatternScore,
    /// Quality band derived from the total score.
    pub grade: PatternGrade,
}

/// Accumulates per-category threat from the pre-transfer snapshot and
/// picks the disease.
///
/// Every node contributes through its ten-god category, scaled by the
/// category coefficient, the node's positional weight, and its energy
/// relative to the day stem. Branches split into one virtual node per
/// hidden stem. Threats are normalized by the chart maximum (floored at
/// one) and the strongest category qualifies as the disease when its
/// normalized threat reaches the threshold.
#[must_use]
pub fn identify_disease(
    snapshot: &[NodeSnapshot],
    day_master: Stem,
) -> (Option<TenGod>, Vec<ThreatReading>) {
    let day_energy = snapshot
        .iter()
        .find(|node| node.flags.contains(NodeFlags::DAY_MASTER))
        .map(|node| node.total)
        .filter(|total| *total > 0.0)
        .unwrap_or(1.0);

    let mut accumulated = [0.0f64; 10];
    for node in snapshot {
        match node.kind {
            NodeKind::Stem => {
                if let Some(stem) = Stem::from_char(node.name) {
                    accumulate_threat(
                        &mut accumulated,
                        ten_god_of(day_master, stem),
                        node.total,
                        node.position_weight,
                        day_energy,
                    );
                }
            }
            NodeKind::Branch => {
                if let Some(branch) = Branch::from_char(node.name) {
                    let hidden = branch.hidden_stems();
                    let share = node.total / hidden.len() as f64;
                    for stem in hidden {
                        accumulate_threat(
                            &mut accumulated,
                            ten_god_of(day_master, *stem),
                            share,
                            node.position_weight,
                            day_energy,
                        );
                    }
                }
            }
        }
    }

    let max_threat = accumulated.iter().fold(0.0f64, |acc, v| acc.max(*v));
    let norm = max_threat.max(1.0);
    let mut threats: Vec<ThreatReading> = TenGod::ALL
        .into_iter()
        .filter(|god| accumulated[god.index()] > 0.0)
        .map(|god| ThreatReading {
            god,
            threat: accumulated[god.index()],
            normalized: accumulated[god.index()] / norm,
        })
        .collect();
    threats.sort_by(|a, b| b.normalized.total_cmp(&a.normalized));

    let disease = threats
        .first()
        .filter(|top| top.normalized >= DISEASE_THRESHOLD)
        .map(|top| top.god);
    (disease, threats)
}

fn accumulate_threat(
    accumulated: &mut [f64; 10],
    god: TenGod,
    energy: f64,
    position_weight: f64,
    day_energy: f64,
) {
    let index = god.index();
    if EXCLUDED_DISEASE_INDICES.contains(&index) {
        return;
    }
    accumulated[index] += THREAT_COEFFICIENTS[index] * position_weight * (energy / day_energy);
}

/// Picks the category that lost the largest fraction of its raw energy
/// during balancing, excluding the day master's own category. The loss
/// must reach the remedy threshold to qualify.
#[must_use]
pub fn identify_remedy(
    raw: &[f64; 10],
    balanced: &[f64; 10],
    day_index: usize,
) -> Option<RemedyReading> {
    let mut candidates: Vec<RemedyReading> = TenGod::ALL
        .into_iter()
        .filter(|god| god.index() != day_index)
        .map(|god| {
            let before = raw[god.index()];
            let loss_rate = if before > 0.0 {
                (before - balanced[god.index()]) / before
            } else {
                0.0
            };
            RemedyReading { god, loss_rate }
        })
        .collect();
    candidates.sort_by(|a, b| b.loss_rate.total_cmp(&a.loss_rate));
    candidates
        .into_iter()
        .next()
        .filter(|best| best.loss_rate >= REMEDY_THRESHOLD)
}

/// Maps the remedy/disease category pair to the classical action.
#[must_use]
pub fn determine_action(remedy: TenGod, disease: TenGod) -> PatternAction {
    match (remedy.index(), disease.index()) {
        (2, 7) => PatternAction::Suppress,
        (3, 7) => PatternAction::Combine,
        (8 | 9, 7) => PatternAction::Transform,
        (8 | 9, 3) => PatternAction::Pair,
        (0 | 1, 4 | 5) => PatternAction::Carry,
        (4 | 5, 8 | 9) => PatternAction::Break,
        (6 | 7, 0 | 1) => PatternAction::Suppress,
        (2 | 3, 0 | 1) => PatternAction::Drain,
        _ => PatternAction::Harmonize,
    }
}

/// Collects the favorable results of balancing, strongest first.
#[must_use]
pub fn identify_results(
    raw: &[f64; 10],
    balanced: &[f64; 10],
    disease: Option<TenGod>,
    remedy: Option<TenGod>,
    day_index: usize,
) -> Vec<ResultReading> {
    let disease_index = disease.map(TenGod::index);
    let remedy_index = remedy.map(TenGod::index);
    let growth = |index: usize| -> Option<f64> {
        if Some(index) == disease_index || Some(index) == remedy_index || raw[index] <= 0.0 {
            return None;
        }
        Some(balanced[index] / raw[index])
    };

    let mut results = Vec::new();
    let groups: [(&[usize], ResultTag); 3] = [
        (&[4, 5], ResultTag::WealthGain),
        (&[6, 7], ResultTag::StatusGain),
        (&[8, 9], ResultTag::ScholarGain),
    ];
    for (indices, tag) in groups {
        let best = indices
            .iter()
            .filter_map(|&index| growth(index).map(|rate| (index, rate)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((index, rate)) = best {
            if rate >= 1.3 {
                results.push(ResultReading {
                    tag,
                    focus: Some(TenGod::ALL[index]),
                    increase_rate: rate,
                });
            }
        }
    }

    if let Some(rate) = growth(day_index) {
        if rate >= 1.2 {
            results.push(ResultReading {
                tag: ResultTag::SelfGain,
                focus: Some(TenGod::ALL[day_index]),
                increase_rate: rate,
            });
        }
    }

    let raw_total: f64 = raw.iter().sum();
    let balanced_total: f64 = balanced.iter().sum();
    if raw_total > 0.0 && balanced_total / raw_total >= 1.15 {
        results.push(ResultReading {
            tag: ResultTag::Momentum,
            focus: None,
            increase_rate: balanced_total / raw_total,
        });
    }

    if let Some(index) = disease_index {
        if raw[index] > 0.0 {
            let suppression = (raw[index] - balanced[index]) / raw[index];
            if suppression >= 0.6 {
                results.push(ResultReading {
                    tag: ResultTag::Consolidation,
                    focus: disease,
                    increase_rate: 1.0 - suppression,
                });
            }
        }
    }

    results.sort_by(|a, b| b.increase_rate.total_cmp(&a.increase_rate));
    results
}

fn compose_name(
    disease: Option<TenGod>,
    remedy: Option<TenGod>,
    action: Option<PatternAction>,
    results: &[ResultReading],
) -> String {
    let Some(disease) = disease else {
        return "平和格".to_owned();
    };
    let (Some(remedy), Some(action)) = (remedy, action) else {
        return format!("{}无制格", disease.chinese());
    };
    let tags: String = results.iter().map(|r| r.tag.glyph()).collect();
    format!(
        "{}{}{}{}格",
        remedy.chinese(),
        action.glyph(),
        disease.chinese(),
        tags
    )
}

fn compose_explanation(
    disease: Option<TenGod>,
    remedy: Option<TenGod>,
    action: Option<PatternAction>,
    results: &[ResultReading],
) -> String {
    let Some(disease) = disease else {
        return "命局平和，五行无主要矛盾。".to_owned();
    };
    let mut parts = vec![format!("命局以{}为主要矛盾", disease.chinese())];
    match (remedy, action) {
        (Some(remedy), Some(action)) => {
            parts.push(format!(
                "以{}{}{}",
                remedy.chinese(),
                action.phrase(),
                disease.chinese()
            ));
        }
        _ => parts.push("无有效制化".to_owned()),
    }
    if !results.is_empty() {
        let phrases: Vec<&str> = results.iter().map(|r| r.tag.phrase()).collect();
        parts.push(phrases.join("、"));
    }
    let mut text = parts.join("，");
    text.push('。');
    text
}

/// Scores the pattern on suppression, the day master's standing, and
/// remedy efficiency, then bands the total into a grade.
#[must_use]
pub fn evaluate(
    raw: &[f64; 10],
    balanced: &[f64; 10],
    disease: Option<TenGod>,
    remedy: Option<&RemedyReading>,
    day_index: usize,
) -> (PatternScore, PatternGrade) {
    let suppression = match disease {
        Some(god) => {
            let before = raw[god.index()];
            let ratio = if before > 0.0 {
                (before - balanced[god.index()]) / before
            } else {
                0.0
            };
            if ratio >= 0.6 {
                40
            } else if ratio >= 0.4 {
                30
            } else if ratio >= 0.2 {
                20
            } else {
                10
            }
        }
        None => 0,
    };

    let balanced_total: f64 = balanced.iter().sum();
    let self_ratio = if balanced_total > 0.0 {
        balanced[day_index] / balanced_total
    } else {
        0.0
    };
    let self_standing = if self_ratio >= 0.25 {
        30
    } else if self_ratio >= 0.15 {
        25
    } else if self_ratio >= 0.08 {
        20
    } else {
        10
    };

    let remedy_score = match (remedy, disease) {
        (Some(reading), Some(god)) => {
            let before = raw[god.index()];
            let decisively_cut = before > 0.0 && balanced[god.index()] < before * 0.7;
            if reading.loss_rate >= 0.4 && decisively_cut {
                30
            } else if reading.loss_rate >= 0.3 {
                25
            } else if reading.loss_rate >= 0.2 {
                20
            } else {
                15
            }
        }
        _ => 10,
    };

    let total = suppression + self_standing + remedy_score;
    let grade = if total >= 80 {
        PatternGrade::Superior
    } else if total >= 70 {
        PatternGrade::Medium
    } else if total >= 60 {
        PatternGrade::Inferior
    } else {
        PatternGrade::Broken
    };
    (
        PatternScore {
            suppression,
            self_standing,
            remedy: remedy_score,
            total,
        },
        grade,
    )
}

/// Runs the full judge over the pre-transfer snapshot and the two
/// ten-god vectors.
#[must_use]
pub fn judge_pattern(
    raw_snapshot: &[NodeSnapshot],
    raw: &[f64; 10],
    balanced: &[f64; 10],
    day_master: Stem,
) -> PatternVerdict {
    let day_index = ten_god_of(day_master, day_master).index();
    let (disease, threats) = identify_disease(raw_snapshot, day_master);
    let remedy = if disease.is_some() {
        identify_remedy(raw, balanced, day_index)
    } else {
        None
    };
    let action = match (remedy.as_ref(), disease) {
        (Some(reading), Some(disease)) => Some(determine_action(reading.god, disease)),
        _ => None,
    };
    let results = identify_results(raw, balanced, disease, remedy.map(|r| r.god), day_index);
    let name = compose_name(disease, remedy.map(|r| r.god), action, &results);
    let explanation = compose_explanation(disease, remedy.map(|r| r.god), action, &results);
    let (score, grade) = evaluate(raw, balanced, disease, remedy.as_ref(), day_index);

    PatternVerdict {
        name,
        explanation,
        disease,
        remedy,
        action,
        results,
        threats,
        score,
        grade,
    }
}
