//! The five elements and the yin/yang polarity attribute.
//!
//! Every stem and branch maps to one element and one polarity. The two
//! element successor relations (generative and controlling) drive the
//! transfer network.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiveElement {
    /// 木
    Wood,
    /// 火
    Fire,
    /// 土
    Earth,
    /// 金
    Metal,
    /// 水
    Water,
}

impl FiveElement {
    /// All five elements in canonical (generative) order starting at wood.
    pub const ALL: [Self; 5] = [Self::Wood, Self::Fire, Self::Earth, Self::Metal, Self::Water];

    /// Stable index in [0, 5).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Wood => 0,
            Self::Fire => 1,
            Self::Earth => 2,
            Self::Metal => 3,
            Self::Water => 4,
        }
    }

    /// The element this one generates (wood→fire→earth→metal→water→wood).
    #[must_use]
    pub const fn generates(self) -> Self {
        match self {
            Self::Wood => Self::Fire,
            Self::Fire => Self::Earth,
            Self::Earth => Self::Metal,
            Self::Metal => Self::Water,
            Self::Water => Self::Wood,
        }
    }

    /// The element this one controls (wood→earth, earth→water, water→fire,
    /// fire→metal, metal→wood).
    #[must_use]
    pub const fn controls(self) -> Self {
        match self {
            Self::Wood => Self::Earth,
            Self::Earth => Self::Water,
            Self::Water => Self::Fire,
            Self::Fire => Self::Metal,
            Self::Metal => Self::Wood,
        }
    }
}

impl fmt::Display for FiveElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wood => write!(f, "wood"),
            Self::Fire => write!(f, "fire"),
            Self::Earth => write!(f, "earth"),
            Self::Metal => write!(f, "metal"),
            Self::Water => write!(f, "water"),
        }
    }
}

/// Yin/yang polarity of a stem or branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// 阳
    Yang,
    /// 阴
    Yin,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yang => write!(f, "yang"),
            Self::Yin => write!(f, "yin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generative_chain_is_a_five_cycle() {
        let mut current = FiveElement::Wood;
        for _ in 0..5 {
            current = current.generates();
        }
        assert_eq!(current, FiveElement::Wood);
    }

    #[test]
    fn test_controlling_chain_is_a_five_cycle() {
        let mut current = FiveElement::Wood;
        for _ in 0..5 {
            current = current.controls();
        }
        assert_eq!(current, FiveElement::Wood);
    }

    #[test]
    fn test_indices_are_distinct() {
        let mut seen = [false; 5];
        for el in FiveElement::ALL {
            assert!(!seen[el.index()]);
            seen[el.index()] = true;
        }
    }

    #[test]
    fn test_element_serialization_round_trip() {
        for el in FiveElement::ALL {
            let json = serde_json::to_string(&el).unwrap();
            let back: FiveElement = serde_json::from_str(&json).unwrap();
            assert_eq!(el, back);
        }
    }
}
