//! # bazi-quant - A Quantified Five-Element Energy Engine
//!
//! bazi-quant turns a four-pillar chart into numbers: every stem and
//! branch becomes an energy node, the classical structural rules (clash,
//! combination, punishment, harm) reshape those energies, and a
//! two-phase transfer simulation moves energy along generative and
//! controlling relations until the chart settles into a balanced state.
//!
//! ## Core Concepts
//!
//! - **PillarSet**: The four stem/branch pairs of a chart
//! - **EnergyNode**: One stem or branch with per-element energy
//! - **ElementProfile**: Aggregated five-element totals with status bands
//! - **TenGodProfile**: Energy projected onto the ten relational categories
//! - **PatternVerdict**: Disease, remedy, action, and graded evaluation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazi_quant::{analyze_chart, EnergyConfig};
//!
//! let report = analyze_chart("甲子", "乙丑", "丙寅", "丁卯", &EnergyConfig::default())?;
//! println!("{}", report.pattern.name);
//! for reading in &report.element_profile.readings {
//!     println!("{}: {:.1} ({})", reading.element, reading.energy, reading.status);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Chart vocabulary and input types
pub mod alphabet;
pub mod element;
pub mod error;
pub mod pillars;

// Node model and pipeline state
pub mod builder;
pub mod config;
pub mod node;
pub mod state;

// Pipeline stages
pub mod network;
pub mod profile;
pub mod structure;
pub mod transfer;

// Interpretation and the entry point
pub mod engine;
pub mod pattern;
pub mod ten_god;

// Re-export primary types at crate root for convenience
pub use alphabet::{Branch, Stem};
pub use config::EnergyConfig;
pub use element::{FiveElement, Polarity};
pub use engine::{analyze, analyze_chart, AnalysisId, AnalysisReport};
pub use error::{EngineError, EngineResult, ValidationError};
pub use pattern::{PatternAction, PatternGrade, PatternVerdict, ResultTag};
pub use pillars::{Pillar, PillarSet, StemBranch};
pub use profile::{ElementProfile, ElementReading, ElementStatus};
pub use state::{LogEntry, Stage};
pub use ten_god::{TenGod, TenGodProfile};
