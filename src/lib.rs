pub mod config;
pub mod error;
pub mod execution;
pub mod generation;
pub mod model;
pub mod normalize;
pub mod simulation;
pub mod store;
pub mod weekday;

pub use config::PlannerConfig;
pub use error::{GenerationError, PlanError, Result};
pub use execution::{project, ExecutionState, PlanStatus};
pub use generation::{
    assemble_plan, build_prompt, generate_plan, ContentGenerator, PlanOutcome, PlanPrompt,
};
pub use model::{
    Cadence, Difficulty, ExpectedResults, FeedPost, Metrics, OperationPurpose, PlanInput,
    PlanSource, PostType, PostingTime, Schedule, StrategyPlan, WeeklyPlan,
};
pub use normalize::RawStrategy;
pub use simulation::{compute_simulation, SimulationResult, WeekCadence};
pub use store::PlanStore;
pub use weekday::Weekday;

pub fn format_number(value: u64) -> String {
    let mut chars: Vec<char> = value.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}

pub fn format_stars(stars: u8) -> String {
    let filled = usize::from(stars.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}
