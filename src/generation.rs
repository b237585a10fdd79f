//! Plan generation: simulation, one call to a text generator, and
//! normalization of whatever comes back.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::error::{GenerationError, Result};
use crate::model::{Metrics, PlanInput, PlanSource, PostingTime, StrategyPlan};
use crate::normalize::{
    fallback_weekly_plans, normalize_posting_schedule, normalize_weekly_plans, RawStrategy,
    WeekTargets,
};
use crate::simulation::{compute_simulation, SimulationResult};
use crate::weekday::Weekday;

const MAX_LIST_ITEMS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPrompt {
    pub system: String,
    pub user: String,
}

/// External text generator. Output is untrusted and repaired downstream.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &PlanPrompt,
    ) -> std::result::Result<RawStrategy, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: StrategyPlan,
    pub simulation: SimulationResult,
    pub warnings: Vec<String>,
}

/// Runs the full pipeline. Only invalid input is an error; any generator
/// failure yields the template plan plus a warning.
pub async fn generate_plan(
    input: &PlanInput,
    last_month: Option<&Metrics>,
    generator: Option<&dyn ContentGenerator>,
    config: &PlannerConfig,
    now: Timestamp,
) -> Result<PlanOutcome> {
    let simulation = compute_simulation(input, last_month)?;
    let mut warnings = Vec::new();

    let raw = match generator {
        Some(generator) => {
            let prompt = build_prompt(input, &simulation);
            info!(
                growth_rate = simulation.monthly_growth_rate,
                feed = simulation.cadence.feed_per_week,
                reel = simulation.cadence.reel_per_week,
                "requesting generated plan"
            );
            match generator.generate(&prompt).await {
                Ok(raw) => Some(raw),
                Err(err) => {
                    warn!(error = %err, "plan generation failed, using template plan");
                    warnings.push(format!("AI generation failed: {}", err));
                    None
                }
            }
        }
        None => None,
    };

    let plan = assemble_plan(input, &simulation, raw.as_ref(), config, now);
    info!(plan_id = %plan.id, source = ?plan.source, "plan assembled");

    Ok(PlanOutcome {
        plan,
        simulation,
        warnings,
    })
}

/// Builds the plan from simulation numbers and optional generated content.
/// `raw = None` produces the deterministic template plan.
pub fn assemble_plan(
    input: &PlanInput,
    simulation: &SimulationResult,
    raw: Option<&RawStrategy>,
    config: &PlannerConfig,
    now: Timestamp,
) -> StrategyPlan {
    let targets = WeekTargets::from_simulation(input, simulation);
    let templates = &config.templates;

    let (weekly_plans, schedule, features, suggested_content_types, source) = match raw {
        Some(raw) => {
            let weekly_plans = normalize_weekly_plans(&raw.weekly_plans, &targets, templates);
            let schedule = normalize_posting_schedule(
                &raw.posting_schedule,
                &weekly_plans,
                &simulation.cadence,
                &config.schedule,
            );
            (
                weekly_plans,
                schedule,
                clean_list(&raw.features, &templates.features),
                clean_list(&raw.suggested_content_types, &templates.suggested_content_types),
                PlanSource::Generated,
            )
        }
        None => {
            let weekly_plans = fallback_weekly_plans(&targets, templates);
            let schedule = normalize_posting_schedule(
                &serde_json::Value::Null,
                &weekly_plans,
                &simulation.cadence,
                &config.schedule,
            );
            (
                weekly_plans,
                schedule,
                templates.features.clone(),
                templates.suggested_content_types.clone(),
                PlanSource::Fallback,
            )
        }
    };

    StrategyPlan {
        id: plan_id(input, now),
        created_at: now,
        input: input.clone(),
        weekly_plans,
        schedule,
        expected_results: simulation.expected_results.clone(),
        difficulty: simulation.difficulty.clone(),
        features,
        suggested_content_types,
        source,
    }
}

pub fn build_prompt(input: &PlanInput, simulation: &SimulationResult) -> PlanPrompt {
    let start_weekday = Weekday::from_date(input.start_date);
    let increases = simulation
        .weekly_increases
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut user = format!(
        "Operation purpose: {}\n\
         Current followers: {}\n\
         Target followers: {} (+{}, {:.1}% this month)\n\
         Weekly follower increases: {}\n\
         Per week: {} feed posts, {} reels, {} stories\n\
         Plan starts: {} ({})\n",
        input.operation_purpose.label(),
        input.current_followers,
        input.target_followers,
        simulation.follower_gap,
        simulation.monthly_growth_rate,
        increases,
        simulation.cadence.feed_per_week,
        simulation.cadence.reel_per_week,
        simulation.cadence.story_per_week,
        input.start_date,
        start_weekday.label(),
    );
    if let Some(audience) = input
        .target_audience
        .as_deref()
        .map(str::trim)
        .filter(|audience| !audience.is_empty())
    {
        user.push_str(&format!("Target audience: {}\n", audience));
    }
    if let Some(posting_time) = input.posting_time.filter(|time| *time != PostingTime::Auto) {
        user.push_str(&format!("Preferred posting time: {}\n", posting_time.describe()));
    }

    PlanPrompt {
        system: system_prompt(),
        user,
    }
}

fn system_prompt() -> String {
    let prompt = r#"You are an Instagram growth strategist. Return a single JSON object, written in Japanese, with these fields:
- postingSchedule: { postingDays: [{ day, time, type }], storyDays: [{ day, time }] }
- weeklyPlans: exactly 4 items of { week, theme, feedPosts: [{ day, content, type }], storyContent: [string] }
- expectedResults: { monthlyReach, engagementRate, profileViews, saves, newFollowers }
- features: array of 3-5 short strings
- suggestedContentTypes: array of 3-5 short strings
Rules:
- day is a Japanese weekday such as 月曜日; type is "feed" or "reel"; time is HH:MM.
- Each week must contain exactly the requested number of feed posts and reels, on different days.
- Output JSON only, no markdown or commentary.
"#;
    prompt.to_string()
}

/// Trimmed, deduplicated and capped; falls back to `defaults` when empty.
fn clean_list(values: &[String], defaults: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let cleaned: Vec<String> = values
        .iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && seen.insert(value.clone()))
        .take(MAX_LIST_ITEMS)
        .collect();
    if cleaned.is_empty() {
        defaults.to_vec()
    } else {
        cleaned
    }
}

fn plan_id(input: &PlanInput, now: Timestamp) -> String {
    let payload = format!(
        "{}:{}",
        serde_json::to_string(input).unwrap_or_default(),
        now.as_nanosecond()
    );
    format!("plan_{:016x}", stable_hash64(&payload))
}

fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
