//! Simulation calculator: numeric weekly targets, projected outcomes and a
//! difficulty rating derived from a [`PlanInput`].

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Difficulty, ExpectedResults, Metrics, OperationPurpose, PlanInput};

pub const WEEKS_PER_PLAN: usize = 4;

const REEL_REACH_BOOST_HISTORY: f64 = 1.15;
const REEL_SAVES_BOOST_HISTORY: f64 = 1.3;
const REEL_ENGAGEMENT_BOOST_HISTORY: f64 = 0.3;
const HISTORY_ENGAGEMENT_SPREAD: f64 = 0.5;
const HISTORY_ENGAGEMENT_BOUNDS: (f64, f64) = (2.0, 8.0);

const COLD_REACH_PER_FOLLOWER: f64 = 2.5;
const COLD_REACH_CADENCE_CAP: f64 = 1.5;
const COLD_REEL_REACH_BOOST: f64 = 1.3;
const COLD_ENGAGEMENT_BASELINE: f64 = 4.0;
const COLD_ENGAGEMENT_SPREAD: f64 = 0.5;
const COLD_REEL_ENGAGEMENT_BOOST: (f64, f64) = (0.5, 1.0);
const COLD_ENGAGEMENT_BOUNDS: (f64, f64) = (3.0, 6.5);
const COLD_PROFILE_VIEW_RATIO: f64 = 0.05;
const COLD_SAVES_PER_POST: f64 = 8.0;
const COLD_REEL_SAVES_BOOST: f64 = 1.5;

const STANDARD_ACHIEVEMENT: f64 = 72.0;
const EASY_ACHIEVEMENT: (f64, f64) = (85.0, 95.0);
const AMBITIOUS_ACHIEVEMENT: (f64, f64) = (30.0, 58.0);

/// Monthly follower growth (%) the industry typically sees for a purpose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndustryRange {
    pub min: f64,
    pub max: f64,
}

impl IndustryRange {
    pub fn for_purpose(purpose: OperationPurpose) -> Self {
        let (min, max) = match purpose {
            OperationPurpose::Awareness => (3.0, 6.0),
            OperationPurpose::Acquisition => (2.0, 5.0),
            OperationPurpose::Sales => (2.0, 4.5),
            OperationPurpose::Community => (1.5, 4.0),
            OperationPurpose::Recruiting => (1.0, 3.0),
            OperationPurpose::Branding => (2.5, 5.5),
        };
        Self { min, max }
    }

    pub fn label(&self) -> String {
        format_range(self.min, self.max)
    }
}

/// Everything the normalizer and the prompt need from the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub monthly_growth_rate: f64,
    pub follower_gap: u64,
    pub weekly_increases: [u64; WEEKS_PER_PLAN],
    pub weekly_targets: [u64; WEEKS_PER_PLAN],
    pub weekly_posts_num: f64,
    pub weekly_reel_posts: f64,
    pub story_posts_per_week: f64,
    pub monthly_posts: f64,
    pub cadence: WeekCadence,
    pub expected_results: ExpectedResults,
    pub difficulty: Difficulty,
}

/// Integer per-week targets the normalizer must hit exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekCadence {
    pub feed_per_week: u32,
    pub reel_per_week: u32,
    pub story_per_week: u32,
}

impl WeekCadence {
    pub fn from_counts(feed: f64, reel: f64, story: f64) -> Self {
        Self {
            feed_per_week: round_count(feed),
            reel_per_week: round_count(reel),
            story_per_week: round_count(story),
        }
    }

    pub fn posts_per_week(&self) -> u32 {
        self.feed_per_week + self.reel_per_week
    }
}

pub fn compute_simulation(
    input: &PlanInput,
    last_month: Option<&Metrics>,
) -> Result<SimulationResult> {
    input.validate()?;

    let weekly_posts_num = input.weekly_posts.posts_per_week();
    let weekly_reel_posts = input.reel_capability.posts_per_week();
    let story_posts_per_week = input.story_frequency.stories_per_week();
    let monthly_posts = (weekly_posts_num + weekly_reel_posts) * WEEKS_PER_PLAN as f64;
    let has_reels = weekly_reel_posts > 0.0;

    let follower_gap = input.follower_gap();
    let monthly_growth_rate = monthly_growth_rate(input.current_followers, input.target_followers);
    let weekly_increases = split_weekly_increases(follower_gap);
    let weekly_targets = cumulative_targets(input.current_followers, &weekly_increases);

    let expected_results = match last_month {
        Some(history) => project_from_history(history, monthly_posts, has_reels, follower_gap),
        None => project_cold_start(input.current_followers, monthly_posts, has_reels, follower_gap),
    };

    let range = IndustryRange::for_purpose(input.operation_purpose);
    let difficulty = rate_difficulty(monthly_growth_rate, range);

    Ok(SimulationResult {
        monthly_growth_rate,
        follower_gap,
        weekly_increases,
        weekly_targets,
        weekly_posts_num,
        weekly_reel_posts,
        story_posts_per_week,
        monthly_posts,
        cadence: WeekCadence::from_counts(weekly_posts_num, weekly_reel_posts, story_posts_per_week),
        expected_results,
        difficulty,
    })
}

/// Callers guarantee `current > 0`.
pub fn monthly_growth_rate(current: u64, target: u64) -> f64 {
    (target as f64 - current as f64) / current as f64 * 100.0
}

/// Splits the gap into four parts summing to the gap; the remainder goes to
/// the earliest weeks.
pub fn split_weekly_increases(gap: u64) -> [u64; WEEKS_PER_PLAN] {
    let weeks = WEEKS_PER_PLAN as u64;
    let base = gap / weeks;
    let remainder = gap % weeks;
    let mut increases = [base; WEEKS_PER_PLAN];
    for (idx, increase) in increases.iter_mut().enumerate() {
        if (idx as u64) < remainder {
            *increase += 1;
        }
    }
    increases
}

fn cumulative_targets(current: u64, increases: &[u64; WEEKS_PER_PLAN]) -> [u64; WEEKS_PER_PLAN] {
    let mut running = current;
    let mut targets = [0u64; WEEKS_PER_PLAN];
    for (target, increase) in targets.iter_mut().zip(increases.iter()) {
        running += increase;
        *target = running;
    }
    targets
}

fn project_from_history(
    history: &Metrics,
    monthly_posts: f64,
    has_reels: bool,
    follower_gap: u64,
) -> ExpectedResults {
    let ratio = if history.post_count == 0 {
        1.0
    } else {
        monthly_posts / history.post_count as f64
    };

    let reach_boost = if has_reels { REEL_REACH_BOOST_HISTORY } else { 1.0 };
    let saves_boost = if has_reels { REEL_SAVES_BOOST_HISTORY } else { 1.0 };
    let engagement_boost = if has_reels { REEL_ENGAGEMENT_BOOST_HISTORY } else { 0.0 };

    let (floor, ceiling) = HISTORY_ENGAGEMENT_BOUNDS;
    let low = (history.engagement_rate - HISTORY_ENGAGEMENT_SPREAD + engagement_boost)
        .clamp(floor, ceiling);
    let high = (history.engagement_rate + HISTORY_ENGAGEMENT_SPREAD + engagement_boost)
        .clamp(floor, ceiling);

    ExpectedResults {
        monthly_reach: round_u64(history.reach as f64 * ratio * reach_boost),
        engagement_rate: format_range(low, high),
        profile_views: round_u64(history.profile_views as f64 * ratio),
        saves: round_u64(history.saves as f64 * ratio * saves_boost),
        new_followers: follower_gap,
    }
}

fn project_cold_start(
    current_followers: u64,
    monthly_posts: f64,
    has_reels: bool,
    follower_gap: u64,
) -> ExpectedResults {
    let cadence_factor = (1.0 + monthly_posts / 20.0).min(COLD_REACH_CADENCE_CAP);
    let reel_factor = if has_reels { COLD_REEL_REACH_BOOST } else { 1.0 };
    let reach = current_followers as f64 * COLD_REACH_PER_FOLLOWER * cadence_factor * reel_factor;

    let (low_boost, high_boost) = if has_reels {
        COLD_REEL_ENGAGEMENT_BOOST
    } else {
        (0.0, 0.0)
    };
    let (floor, ceiling) = COLD_ENGAGEMENT_BOUNDS;
    let low = (COLD_ENGAGEMENT_BASELINE - COLD_ENGAGEMENT_SPREAD + low_boost).clamp(floor, ceiling);
    let high =
        (COLD_ENGAGEMENT_BASELINE + COLD_ENGAGEMENT_SPREAD + high_boost).clamp(floor, ceiling);

    let saves_boost = if has_reels { COLD_REEL_SAVES_BOOST } else { 1.0 };

    ExpectedResults {
        monthly_reach: round_u64(reach),
        engagement_rate: format_range(low, high),
        profile_views: round_u64(reach * COLD_PROFILE_VIEW_RATIO),
        saves: round_u64(monthly_posts * COLD_SAVES_PER_POST * saves_boost),
        new_followers: follower_gap,
    }
}

pub fn rate_difficulty(growth_rate: f64, range: IndustryRange) -> Difficulty {
    let (stars, label, achievement_rate) = if growth_rate < range.min {
        let shortfall = ((range.min - growth_rate) / range.min).clamp(0.0, 1.0);
        let (low, high) = EASY_ACHIEVEMENT;
        (1, "簡単", low + (high - low) * shortfall)
    } else if growth_rate > range.max {
        // e / (1 + e) stays in (0, 1), so the rate never reaches either bound.
        let excess = (growth_rate - range.max) / range.max;
        let (low, high) = AMBITIOUS_ACHIEVEMENT;
        (5, "やや高め", high - (high - low) * (excess / (1.0 + excess)))
    } else {
        (3, "標準", STANDARD_ACHIEVEMENT)
    };

    Difficulty {
        stars,
        label: label.to_string(),
        industry_range: range.label(),
        achievement_rate,
        growth_rate,
    }
}

fn format_range(low: f64, high: f64) -> String {
    format!("{:.1}〜{:.1}%", low, high)
}

fn round_count(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

fn round_u64(value: f64) -> u64 {
    if value.is_nan() {
        return 0;
    }
    value.round().max(0.0) as u64
}
