//! End-to-end pipeline tests over full charts.

use bazi_quant::{analyze_chart, EnergyConfig, FiveElement, Stage, Stem};

const CHARTS: [[&str; 4]; 6] = [
    ["甲子", "乙丑", "丙寅", "丁卯"],
    ["庚申", "戊子", "壬午", "辛亥"],
    ["甲子", "丙寅", "戊午", "庚申"],
    ["辛亥", "庚寅", "丙午", "己亥"],
    ["癸酉", "甲子", "乙巳", "丁丑"],
    ["戊戌", "己未", "戊辰", "戊午"],
];

#[test]
fn test_worked_example_chart() {
    let report = analyze_chart("甲子", "乙丑", "丙寅", "丁卯", &EnergyConfig::default())
        .expect("valid chart");
    assert_eq!(report.ten_gods.day_master, Stem::Bing);
    assert_eq!(report.pillars.day_master().element(), FiveElement::Fire);

    // Wood and fire dominate a chart of 甲乙丙丁 over 子丑寅卯.
    let wood = report.element_profile.reading(FiveElement::Wood).energy;
    let metal = report.element_profile.reading(FiveElement::Metal).energy;
    assert!(wood > metal);
    assert!(report.element_profile.total > 0.0);
}

#[test]
fn test_analysis_is_deterministic() {
    let config = EnergyConfig::default();
    for chart in CHARTS {
        let a = analyze_chart(chart[0], chart[1], chart[2], chart[3], &config).expect("valid");
        let b = analyze_chart(chart[0], chart[1], chart[2], chart[3], &config).expect("valid");
        assert_eq!(a.element_profile, b.element_profile);
        assert_eq!(a.ten_gods, b.ten_gods);
        assert_eq!(a.pattern, b.pattern);
        assert_eq!(a.final_snapshot, b.final_snapshot);
        // Only the run id differs between identical runs.
        assert_ne!(a.id, b.id);
    }
}

#[test]
fn test_node_totals_stay_in_bounds() {
    let config = EnergyConfig::default();
    for chart in CHARTS {
        let report =
            analyze_chart(chart[0], chart[1], chart[2], chart[3], &config).expect("valid");
        for node in &report.final_snapshot {
            assert!(
                node.total >= config.min_energy - 1e-6,
                "{chart:?} {} fell below the floor: {}",
                node.position,
                node.total
            );
            assert!(
                node.total <= config.max_energy + 1e-6,
                "{chart:?} {} exceeded the cap: {}",
                node.position,
                node.total
            );
        }
    }
}

#[test]
fn test_energies_stay_finite_and_nonnegative() {
    let config = EnergyConfig::default();
    for chart in CHARTS {
        let report =
            analyze_chart(chart[0], chart[1], chart[2], chart[3], &config).expect("valid");
        for node in &report.final_snapshot {
            for (element, value) in &node.energies {
                assert!(
                    value.is_finite() && *value >= 0.0,
                    "{chart:?} {} has bad {element} energy {value}",
                    node.position
                );
            }
        }
    }
}

#[test]
fn test_log_follows_pipeline_order() {
    let report = analyze_chart("庚申", "戊子", "壬午", "辛亥", &EnergyConfig::default())
        .expect("valid chart");
    let expected = [
        Stage::Init,
        Stage::Clash,
        Stage::Combine,
        Stage::PunishHarm,
        Stage::Relations,
        Stage::Cycle,
        Stage::RawSnapshot,
        Stage::Generate,
        Stage::Control,
        Stage::Bounds,
    ];
    assert_eq!(report.log.len(), expected.len());
    for (entry, stage) in report.log.iter().zip(expected) {
        assert_eq!(entry.stage, stage);
        assert!(!entry.description.is_empty());
        assert_eq!(entry.nodes.len(), 8);
    }
}

#[test]
fn test_pattern_verdict_is_well_formed() {
    let config = EnergyConfig::default();
    for chart in CHARTS {
        let report =
            analyze_chart(chart[0], chart[1], chart[2], chart[3], &config).expect("valid");
        let pattern = &report.pattern;
        assert!(pattern.name.ends_with('格'), "{chart:?}: {}", pattern.name);
        assert!(pattern.explanation.ends_with('。'));
        assert_eq!(
            pattern.score.total,
            pattern.score.suppression + pattern.score.self_standing + pattern.score.remedy
        );
        assert!(pattern.score.total <= 100);
        // A remedy implies a disease and a chosen action.
        if pattern.remedy.is_some() {
            assert!(pattern.disease.is_some());
            assert!(pattern.action.is_some());
        }
        for window in pattern.threats.windows(2) {
            assert!(window[0].normalized >= window[1].normalized);
        }
    }
}

#[test]
fn test_ten_god_vectors_cover_the_chart() {
    let report = analyze_chart("甲子", "丙寅", "戊午", "庚申", &EnergyConfig::default())
        .expect("valid chart");
    let raw_total: f64 = report.ten_gods.raw.iter().sum();
    let balanced_total: f64 = report.ten_gods.balanced.iter().sum();
    assert!(raw_total > 0.0);
    assert!(balanced_total > 0.0);
}

#[test]
fn test_partial_config_override_through_analyze() {
    let config: EnergyConfig =
        serde_json::from_str(r#"{"stem_base_energy": 500.0}"#).expect("partial config");
    assert!((config.stem_base_energy - 500.0).abs() < f64::EPSILON);

    let halved = analyze_chart("甲子", "乙丑", "丙寅", "丁卯", &config).expect("valid");
    let full = analyze_chart("甲子", "乙丑", "丙寅", "丁卯", &EnergyConfig::default())
        .expect("valid");
    // Halving the stem base lowers the chart total.
    assert!(halved.element_profile.total < full.element_profile.total);
}

#[test]
fn test_invalid_chart_strings_are_rejected() {
    let config = EnergyConfig::default();
    assert!(analyze_chart("", "乙丑", "丙寅", "丁卯", &config).is_err());
    assert!(analyze_chart("甲甲", "乙丑", "丙寅", "丁卯", &config).is_err());
    assert!(analyze_chart("甲子", "乙丑", "丙寅", "卯丁", &config).is_err());
}
