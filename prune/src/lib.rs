pub mod analysis;
pub mod cli;
pub mod report;
pub mod settings;

pub use analysis::{analyze, run, AnalysisConfig, AnalysisOutcome};
pub use settings::Settings;
