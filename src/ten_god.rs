//! Ten-god categories and the projection of node energy onto them.
//!
//! Every stem relates to the day master through its element relation and
//! polarity parity. Branch nodes project through their hidden stems, the
//! node's energy split evenly across them. Projected energy is weighted
//! by the node's positional weight so a month-branch category outweighs
//! the same category sitting in the year stem.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alphabet::{Branch, Stem};
use crate::node::{NodeKind, NodeSnapshot};

/// The ten relational categories around the day master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenGod {
    /// 比肩: same element, same polarity.
    Friend,
    /// 劫财: same element, opposite polarity.
    RobWealth,
    /// 食神: produced by the day master, same polarity.
    EatingGod,
    /// 伤官: produced by the day master, opposite polarity.
    HurtingOfficer,
    /// 正财: controlled by the day master, opposite polarity.
    DirectWealth,
    /// 偏财: controlled by the day master, same polarity.
    IndirectWealth,
    /// 正官: controls the day master, opposite polarity.
    DirectOfficer,
    /// 七杀: controls the day master, same polarity.
    SevenKillings,
    /// 正印: produces the day master, opposite polarity.
    DirectSeal,
    /// 偏印: produces the day master, same polarity.
    IndirectSeal,
}

impl TenGod {
    /// All ten categories in canonical index order.
    pub const ALL: [Self; 10] = [
        Self::Friend,
        Self::RobWealth,
        Self::EatingGod,
        Self::HurtingOfficer,
        Self::DirectWealth,
        Self::IndirectWealth,
        Self::DirectOfficer,
        Self::SevenKillings,
        Self::DirectSeal,
        Self::IndirectSeal,
    ];

    /// Stable index in [0, 10).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Friend => 0,
            Self::RobWealth => 1,
            Self::EatingGod => 2,
            Self::HurtingOfficer => 3,
            Self::DirectWealth => 4,
            Self::IndirectWealth => 5,
            Self::DirectOfficer => 6,
            Self::SevenKillings => 7,
            Self::DirectSeal => 8,
            Self::IndirectSeal => 9,
        }
    }

    /// The traditional single-character name.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Friend => '比',
            Self::RobWealth => '劫',
            Self::EatingGod => '食',
            Self::HurtingOfficer => '伤',
            Self::DirectWealth => '财',
            Self::IndirectWealth => '才',
            Self::DirectOfficer => '官',
            Self::SevenKillings => '杀',
            Self::DirectSeal => '印',
            Self::IndirectSeal => '枭',
        }
    }

    /// The traditional two-character name.
    #[must_use]
    pub const fn chinese(self) -> &'static str {
        match self {
            Self::Friend => "比肩",
            Self::RobWealth => "劫财",
            Self::EatingGod => "食神",
            Self::HurtingOfficer => "伤官",
            Self::DirectWealth => "正财",
            Self::IndirectWealth => "偏财",
            Self::DirectOfficer => "正官",
            Self::SevenKillings => "七杀",
            Self::DirectSeal => "正印",
            Self::IndirectSeal => "偏印",
        }
    }

    /// English category label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::RobWealth => "rob wealth",
            Self::EatingGod => "eating god",
            Self::HurtingOfficer => "hurting officer",
            Self::DirectWealth => "direct wealth",
            Self::IndirectWealth => "indirect wealth",
            Self::DirectOfficer => "direct officer",
            Self::SevenKillings => "seven killings",
            Self::DirectSeal => "direct seal",
            Self::IndirectSeal => "indirect seal",
        }
    }
}

impl fmt::Display for TenGod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The ten-god category of a stem relative to the day master.
#[must_use]
pub fn ten_god_of(day_master: Stem, other: Stem) -> TenGod {
    let day_element = day_master.element();
    let other_element = other.element();
    let same_polarity = day_master.polarity() == other.polarity();

    if other_element == day_element {
        if same_polarity {
            TenGod::Friend
        } else {
            TenGod::RobWealth
        }
    } else if day_element.generates() == other_element {
        if same_polarity {
            TenGod::EatingGod
        } else {
            TenGod::HurtingOfficer
        }
    } else if day_element.controls() == other_element {
        if same_polarity {
            TenGod::IndirectWealth
        } else {
            TenGod::DirectWealth
        }
    } else if other_element.controls() == day_element {
        if same_polarity {
            TenGod::SevenKillings
        } else {
            TenGod::DirectOfficer
        }
    } else if same_polarity {
        TenGod::IndirectSeal
    } else {
        TenGod::DirectSeal
    }
}

/// Projects a snapshot onto the ten categories, weighted by position.
///
/// Stems map directly; a branch splits its total evenly across its
/// hidden stems. Returns energy per category index.
#[must_use]
pub fn energy_vector(snapshot: &[NodeSnapshot], day_master: Stem) -> [f64; 10] {
    let mut vector = [0.0; 10];
    for node in snapshot {
        let weighted = node.total * node.position_weight;
        match node.kind {
            NodeKind::Stem => {
                if let Some(stem) = Stem::from_char(node.name) {
                    vector[ten_god_of(day_master, stem).index()] += weighted;
                }
            }
            NodeKind::Branch => {
                if let Some(branch) = Branch::from_char(node.name) {
                    let hidden = branch.hidden_stems();
                    let share = weighted / hidden.len() as f64;
                    for stem in hidden {
                        vector[ten_god_of(day_master, *stem).index()] += share;
                    }
                }
            }
        }
    }
    vector
}

/// Ten-god energy distribution of a chart, before and after transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenGodProfile {
    /// The day master stem.
    pub day_master: Stem,
    /// Position-weighted category energies from the pre-transfer snapshot.
    pub raw: [f64; 10],
    /// Position-weighted category energies after transfer and bounds.
    pub balanced: [f64; 10],
}

impl TenGodProfile {
    /// The raw energy of one category.
    #[must_use]
    pub fn raw_of(&self, god: TenGod) -> f64 {
        self.raw[god.index()]
    }

    /// The balanced energy of one category.
    #[must_use]
    pub fn balanced_of(&self, god: TenGod) -> f64 {
        self.balanced[god.index()]
    }

    /// The category with the highest balanced energy.
    #[must_use]
    pub fn dominant(&self) -> TenGod {
        TenGod::ALL
            .into_iter()
            .max_by(|a, b| self.balanced[a.index()].total_cmp(&self.balanced[b.index()]))
            .unwrap_or(TenGod::Friend)
    }
}
