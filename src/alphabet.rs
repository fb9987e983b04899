//! The stem and branch alphabets with their static attribute tables.
//!
//! This module is pure data: element and polarity attributes, the
//! hidden-stem energy distribution of each branch, the seasonal
//! (month-branch × element) coefficient table, the five stem pairings,
//! and the branch membership lists for clashes, harms, and punishments.
//! All tables are immutable and resolved by exhaustive `match`, so a
//! missing entry is a compile error rather than a runtime surprise.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::{FiveElement, Polarity};

/// One of the ten heavenly stems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stem {
    /// 甲 (yang wood)
    Jia,
    /// 乙 (yin wood)
    Yi,
    /// 丙 (yang fire)
    Bing,
    /// 丁 (yin fire)
    Ding,
    /// 戊 (yang earth)
    Wu,
    /// 己 (yin earth)
    Ji,
    /// 庚 (yang metal)
    Geng,
    /// 辛 (yin metal)
    Xin,
    /// 壬 (yang water)
    Ren,
    /// 癸 (yin water)
    Gui,
}

impl Stem {
    /// All ten stems in canonical order.
    pub const ALL: [Self; 10] = [
        Self::Jia,
        Self::Yi,
        Self::Bing,
        Self::Ding,
        Self::Wu,
        Self::Ji,
        Self::Geng,
        Self::Xin,
        Self::Ren,
        Self::Gui,
    ];

    /// Resolves a stem character, or `None` if the character is not a stem.
    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            '甲' => Some(Self::Jia),
            '乙' => Some(Self::Yi),
            '丙' => Some(Self::Bing),
            '丁' => Some(Self::Ding),
            '戊' => Some(Self::Wu),
            '己' => Some(Self::Ji),
            '庚' => Some(Self::Geng),
            '辛' => Some(Self::Xin),
            '壬' => Some(Self::Ren),
            '癸' => Some(Self::Gui),
            _ => None,
        }
    }

    /// The stem's character.
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::Jia => '甲',
            Self::Yi => '乙',
            Self::Bing => '丙',
            Self::Ding => '丁',
            Self::Wu => '戊',
            Self::Ji => '己',
            Self::Geng => '庚',
            Self::Xin => '辛',
            Self::Ren => '壬',
            Self::Gui => '癸',
        }
    }

    /// Stable index in [0, 10).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Jia => 0,
            Self::Yi => 1,
            Self::Bing => 2,
            Self::Ding => 3,
            Self::Wu => 4,
            Self::Ji => 5,
            Self::Geng => 6,
            Self::Xin => 7,
            Self::Ren => 8,
            Self::Gui => 9,
        }
    }

    /// The stem's element.
    #[must_use]
    pub const fn element(self) -> FiveElement {
        match self {
            Self::Jia | Self::Yi => FiveElement::Wood,
            Self::Bing | Self::Ding => FiveElement::Fire,
            Self::Wu | Self::Ji => FiveElement::Earth,
            Self::Geng | Self::Xin => FiveElement::Metal,
            Self::Ren | Self::Gui => FiveElement::Water,
        }
    }

    /// The stem's polarity (alternating yang/yin in canonical order).
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::Jia | Self::Bing | Self::Wu | Self::Geng | Self::Ren => Polarity::Yang,
            Self::Yi | Self::Ding | Self::Ji | Self::Xin | Self::Gui => Polarity::Yin,
        }
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// One of the twelve earthly branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    /// 子 (yang water)
    Zi,
    /// 丑 (yin earth)
    Chou,
    /// 寅 (yang wood)
    Yin,
    /// 卯 (yin wood)
    Mao,
    /// 辰 (yang earth)
    Chen,
    /// 巳 (yin fire)
    Si,
    /// 午 (yang fire)
    Wu,
    /// 未 (yin earth)
    Wei,
    /// 申 (yang metal)
    Shen,
    /// 酉 (yin metal)
    You,
    /// 戌 (yang earth)
    Xu,
    /// 亥 (yin water)
    Hai,
}

impl Branch {
    /// All twelve branches in canonical order.
    pub const ALL: [Self; 12] = [
        Self::Zi,
        Self::Chou,
        Self::Yin,
        Self::Mao,
        Self::Chen,
        Self::Si,
        Self::Wu,
        Self::Wei,
        Self::Shen,
        Self::You,
        Self::Xu,
        Self::Hai,
    ];

    /// Resolves a branch character, or `None` if the character is not a branch.
    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            '子' => Some(Self::Zi),
            '丑' => Some(Self::Chou),
            '寅' => Some(Self::Yin),
            '卯' => Some(Self::Mao),
            '辰' => Some(Self::Chen),
            '巳' => Some(Self::Si),
            '午' => Some(Self::Wu),
            '未' => Some(Self::Wei),
            '申' => Some(Self::Shen),
            '酉' => Some(Self::You),
            '戌' => Some(Self::Xu),
            '亥' => Some(Self::Hai),
            _ => None,
        }
    }

    /// The branch's character.
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::Zi => '子',
            Self::Chou => '丑',
            Self::Yin => '寅',
            Self::Mao => '卯',
            Self::Chen => '辰',
            Self::Si => '巳',
            Self::Wu => '午',
            Self::Wei => '未',
            Self::Shen => '申',
            Self::You => '酉',
            Self::Xu => '戌',
            Self::Hai => '亥',
        }
    }

    /// The branch's main element.
    #[must_use]
    pub const fn element(self) -> FiveElement {
        match self {
            Self::Zi | Self::Hai => FiveElement::Water,
            Self::Chou | Self::Chen | Self::Wei | Self::Xu => FiveElement::Earth,
            Self::Yin | Self::Mao => FiveElement::Wood,
            Self::Si | Self::Wu => FiveElement::Fire,
            Self::Shen | Self::You => FiveElement::Metal,
        }
    }

    /// The branch's polarity.
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::Zi | Self::Yin | Self::Chen | Self::Wu | Self::Shen | Self::Xu => Polarity::Yang,
            Self::Chou | Self::Mao | Self::Si | Self::Wei | Self::You | Self::Hai => Polarity::Yin,
        }
    }

    /// Hidden-stem energy distribution: how the branch's base energy splits
    /// across up to three elements. Ratios per branch sum to 1.0.
    #[must_use]
    pub const fn hidden_distribution(self) -> &'static [(FiveElement, f64)] {
        use FiveElement::{Earth, Fire, Metal, Water, Wood};
        match self {
            Self::Zi => &[(Water, 1.0)],
            Self::Chou => &[(Earth, 0.6), (Metal, 0.3), (Water, 0.1)],
            Self::Yin => &[(Wood, 0.6), (Fire, 0.3), (Earth, 0.1)],
            Self::Mao => &[(Wood, 1.0)],
            Self::Chen => &[(Earth, 0.6), (Wood, 0.3), (Water, 0.1)],
            Self::Si => &[(Fire, 0.6), (Metal, 0.3), (Earth, 0.1)],
            Self::Wu => &[(Fire, 0.7), (Earth, 0.3)],
            Self::Wei => &[(Earth, 0.6), (Fire, 0.3), (Wood, 0.1)],
            Self::Shen => &[(Metal, 0.6), (Water, 0.3), (Earth, 0.1)],
            Self::You => &[(Metal, 1.0)],
            Self::Xu => &[(Earth, 0.6), (Metal, 0.3), (Fire, 0.1)],
            Self::Hai => &[(Water, 0.7), (Wood, 0.3)],
        }
    }

    /// Hidden-stem sequence of the branch (1–3 stems), used for projecting
    /// branch energy onto ten-god categories.
    #[must_use]
    pub const fn hidden_stems(self) -> &'static [Stem] {
        match self {
            Self::Zi => &[Stem::Gui],
            Self::Chou => &[Stem::Ji, Stem::Gui, Stem::Xin],
            Self::Yin => &[Stem::Jia, Stem::Bing, Stem::Wu],
            Self::Mao => &[Stem::Yi],
            Self::Chen => &[Stem::Wu, Stem::Yi, Stem::Gui],
            Self::Si => &[Stem::Bing, Stem::Wu, Stem::Geng],
            Self::Wu => &[Stem::Ding, Stem::Ji],
            Self::Wei => &[Stem::Ji, Stem::Yi, Stem::Ding],
            Self::Shen => &[Stem::Geng, Stem::Ren, Stem::Gui],
            Self::You => &[Stem::Xin],
            Self::Xu => &[Stem::Wu, Stem::Xin, Stem::Ding],
            Self::Hai => &[Stem::Ren, Stem::Jia],
        }
    }

    /// Seasonal correction coefficient for an element when this branch rules
    /// the month. Flourishing/weakening and climate effects are merged into
    /// a single factor per (month, element) pair.
    #[must_use]
    pub const fn seasonal_coefficient(self, element: FiveElement) -> f64 {
        use FiveElement::{Earth, Fire, Metal, Water, Wood};
        match (self, element) {
            // Spring months
            (Self::Yin | Self::Mao, Wood) => 1.2,
            (Self::Yin | Self::Mao, Fire) => 1.1,
            (Self::Yin | Self::Mao, Earth) => 0.48,
            (Self::Yin | Self::Mao, Metal) => 0.66,
            (Self::Yin | Self::Mao, Water) => 0.8,
            (Self::Chen, Wood) => 0.6,
            (Self::Chen, Fire) => 0.88,
            (Self::Chen, Earth) => 1.44,
            (Self::Chen, Metal) => 1.1,
            (Self::Chen, Water) => 0.4,

            // Summer months
            (Self::Si | Self::Wu, Fire) => 1.08,
            (Self::Si | Self::Wu, Earth) => 1.0,
            (Self::Si | Self::Wu, Metal) => 0.52,
            (Self::Si | Self::Wu, Water) => 0.78,
            (Self::Si | Self::Wu, Wood) => 0.72,
            (Self::Wei, Fire) => 0.72,
            (Self::Wei, Earth) => 1.2,
            (Self::Wei, Metal) => 1.3,
            (Self::Wei, Water) => 0.52,
            (Self::Wei, Wood) => 0.54,

            // Autumn months
            (Self::Shen | Self::You, Metal) => 1.2,
            (Self::Shen | Self::You, Water) => 1.1,
            (Self::Shen | Self::You, Wood) => 0.44,
            (Self::Shen | Self::You, Fire) => 0.66,
            (Self::Shen | Self::You, Earth) => 0.8,
            (Self::Xu, Metal) => 0.6,
            (Self::Xu, Water) => 0.88,
            (Self::Xu, Wood) => 0.66,
            (Self::Xu, Fire) => 1.1,
            (Self::Xu, Earth) => 1.2,

            // Winter months
            (Self::Hai | Self::Zi, Water) => 1.08,
            (Self::Hai | Self::Zi, Wood) => 1.0,
            (Self::Hai | Self::Zi, Fire) => 0.52,
            (Self::Hai | Self::Zi, Earth) => 0.78,
            (Self::Hai | Self::Zi, Metal) => 0.72,
            (Self::Chou, Water) => 0.54,
            (Self::Chou, Wood) => 0.4,
            (Self::Chou, Fire) => 0.78,
            (Self::Chou, Earth) => 1.56,
            (Self::Chou, Metal) => 0.9,
        }
    }

    /// The branch where an element is at its imperial peak, used to decide
    /// whether a stem pairing fully transforms in the current month.
    #[must_use]
    pub const fn imperial_peak_of(element: FiveElement) -> Self {
        match element {
            FiveElement::Wood => Self::Mao,
            FiveElement::Fire => Self::Wu,
            FiveElement::Metal => Self::You,
            FiveElement::Water | FiveElement::Earth => Self::Zi,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Result element of the five classic stem pairings, or `None` when the two
/// stems do not pair (甲己→earth, 乙庚→metal, 丙辛→water, 丁壬→wood, 戊癸→fire).
#[must_use]
pub const fn stem_pairing_result(a: Stem, b: Stem) -> Option<FiveElement> {
    match (a, b) {
        (Stem::Jia, Stem::Ji) | (Stem::Ji, Stem::Jia) => Some(FiveElement::Earth),
        (Stem::Yi, Stem::Geng) | (Stem::Geng, Stem::Yi) => Some(FiveElement::Metal),
        (Stem::Bing, Stem::Xin) | (Stem::Xin, Stem::Bing) => Some(FiveElement::Water),
        (Stem::Ding, Stem::Ren) | (Stem::Ren, Stem::Ding) => Some(FiveElement::Wood),
        (Stem::Wu, Stem::Gui) | (Stem::Gui, Stem::Wu) => Some(FiveElement::Fire),
        _ => None,
    }
}

/// The six clash pairs (子午, 丑未, 寅申, 卯酉, 辰戌, 巳亥).
pub const CLASH_PAIRS: [(Branch, Branch); 6] = [
    (Branch::Zi, Branch::Wu),
    (Branch::Chou, Branch::Wei),
    (Branch::Yin, Branch::Shen),
    (Branch::Mao, Branch::You),
    (Branch::Chen, Branch::Xu),
    (Branch::Si, Branch::Hai),
];

/// The six harm pairs (子未, 丑午, 寅巳, 卯辰, 申亥, 酉戌).
pub const HARM_PAIRS: [(Branch, Branch); 6] = [
    (Branch::Zi, Branch::Wei),
    (Branch::Chou, Branch::Wu),
    (Branch::Yin, Branch::Si),
    (Branch::Mao, Branch::Chen),
    (Branch::Shen, Branch::Hai),
    (Branch::You, Branch::Xu),
];

/// The two cyclic triple punishments (寅巳申 and 丑戌未).
pub const PUNISH_TRIPLES: [(Branch, Branch, Branch); 2] = [
    (Branch::Yin, Branch::Si, Branch::Shen),
    (Branch::Chou, Branch::Xu, Branch::Wei),
];

/// The single pair punishment (子卯).
pub const PUNISH_PAIRS: [(Branch, Branch); 1] = [(Branch::Zi, Branch::Mao)];

/// Branches that punish themselves when duplicated (辰午酉亥).
pub const SELF_PUNISH_BRANCHES: [Branch; 4] =
    [Branch::Chen, Branch::Wu, Branch::You, Branch::Hai];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_stem_char_round_trips() {
        for stem in Stem::ALL {
            assert_eq!(Stem::from_char(stem.to_char()), Some(stem));
        }
    }

    #[test]
    fn test_every_branch_char_round_trips() {
        for branch in Branch::ALL {
            assert_eq!(Branch::from_char(branch.to_char()), Some(branch));
        }
    }

    #[test]
    fn test_non_alphabet_chars_do_not_resolve() {
        assert!(Stem::from_char('子').is_none());
        assert!(Branch::from_char('甲').is_none());
        assert!(Stem::from_char('a').is_none());
        assert!(Branch::from_char(' ').is_none());
    }

    #[test]
    fn test_hidden_distribution_sums_to_one() {
        for branch in Branch::ALL {
            let sum: f64 = branch.hidden_distribution().iter().map(|(_, r)| r).sum();
            assert!(
                (sum - 1.0).abs() < 1e-9,
                "distribution of {branch} sums to {sum}"
            );
        }
    }

    #[test]
    fn test_main_element_leads_hidden_distribution() {
        for branch in Branch::ALL {
            let (lead, ratio) = branch.hidden_distribution()[0];
            assert_eq!(lead, branch.element());
            assert!(ratio >= 0.6);
        }
    }

    #[test]
    fn test_hidden_stems_are_nonempty_and_bounded() {
        for branch in Branch::ALL {
            let stems = branch.hidden_stems();
            assert!(!stems.is_empty());
            assert!(stems.len() <= 3);
        }
    }

    #[test]
    fn test_seasonal_coefficients_are_positive() {
        for month in Branch::ALL {
            for element in crate::element::FiveElement::ALL {
                let coeff = month.seasonal_coefficient(element);
                assert!(coeff > 0.0, "month {month}, element {element}");
                assert!(coeff < 2.0);
            }
        }
    }

    #[test]
    fn test_ruling_element_is_strong_in_its_season() {
        assert!(Branch::Yin.seasonal_coefficient(FiveElement::Wood) > 1.0);
        assert!(Branch::Wu.seasonal_coefficient(FiveElement::Fire) > 1.0);
        assert!(Branch::You.seasonal_coefficient(FiveElement::Metal) > 1.0);
        assert!(Branch::Zi.seasonal_coefficient(FiveElement::Water) > 1.0);
    }

    #[test]
    fn test_stem_pairings_are_symmetric() {
        for a in Stem::ALL {
            for b in Stem::ALL {
                assert_eq!(stem_pairing_result(a, b), stem_pairing_result(b, a));
            }
        }
    }

    #[test]
    fn test_exactly_five_stem_pairings() {
        let mut count = 0;
        for (i, a) in Stem::ALL.into_iter().enumerate() {
            for b in Stem::ALL.into_iter().skip(i + 1) {
                if stem_pairing_result(a, b).is_some() {
                    count += 1;
                }
            }
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn test_clash_and_harm_pairs_cover_all_branches() {
        let mut seen = std::collections::HashSet::new();
        for (a, b) in CLASH_PAIRS {
            seen.insert(a);
            seen.insert(b);
        }
        assert_eq!(seen.len(), 12);
        seen.clear();
        for (a, b) in HARM_PAIRS {
            seen.insert(a);
            seen.insert(b);
        }
        assert_eq!(seen.len(), 12);
    }
}
