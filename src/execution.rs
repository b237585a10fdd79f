//! Projects a stored plan onto the current local date.
//!
//! Nothing here is persisted; the state is recomputed from the plan and the
//! wall clock on every read.

use jiff::civil::Date;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::config::ScheduleDefaults;
use crate::error::{PlanError, Result};
use crate::model::{ExpectedResults, PostType, StrategyPlan, WeeklyPlan};
use crate::simulation::WEEKS_PER_PLAN;
use crate::weekday::Weekday;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum PlanStatus {
    NotStarted,
    Active { week: u8 },
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTask {
    pub content: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryTask {
    pub time: String,
    pub ideas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTasks {
    pub date: Date,
    pub weekday: Weekday,
    pub week: Option<u8>,
    pub posts: Vec<PostTask>,
    pub story: Option<StoryTask>,
}

impl DayTasks {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.story.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGoals {
    pub current_followers: u64,
    pub target_followers: u64,
    pub follower_gap: u64,
    pub week_target: Option<u64>,
    pub expected_results: ExpectedResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    pub plan_id: String,
    pub timezone: String,
    pub status: PlanStatus,
    pub today: DayTasks,
    pub tomorrow: DayTasks,
    pub current_week: Option<WeeklyPlan>,
    pub month_goals: MonthGoals,
}

pub fn project(
    plan: &StrategyPlan,
    now: Timestamp,
    timezone: &str,
    defaults: &ScheduleDefaults,
) -> Result<ExecutionState> {
    let zoned = now.in_tz(timezone).map_err(|source| PlanError::TimeZone {
        name: timezone.to_string(),
        source,
    })?;
    let today_date = zoned.date();
    let tomorrow_date = today_date.tomorrow()?;

    let status = plan_status(plan.input.start_date, today_date)?;
    let current_week = match status {
        PlanStatus::Active { week } => plan.week(week).cloned(),
        _ => None,
    };

    Ok(ExecutionState {
        plan_id: plan.id.clone(),
        timezone: timezone.to_string(),
        status,
        today: day_tasks(plan, today_date, defaults)?,
        tomorrow: day_tasks(plan, tomorrow_date, defaults)?,
        month_goals: MonthGoals {
            current_followers: plan.input.current_followers,
            target_followers: plan.input.target_followers,
            follower_gap: plan.input.follower_gap(),
            week_target: current_week.as_ref().map(|week| week.target_followers),
            expected_results: plan.expected_results.clone(),
        },
        current_week,
    })
}

/// 1-based plan week containing `date`, or the status outside the plan.
pub fn plan_status(start_date: Date, date: Date) -> Result<PlanStatus> {
    let days = start_date.until(date)?.get_days();
    if days < 0 {
        return Ok(PlanStatus::NotStarted);
    }
    let week = days / 7;
    if week >= WEEKS_PER_PLAN as i32 {
        return Ok(PlanStatus::Completed);
    }
    Ok(PlanStatus::Active {
        week: week as u8 + 1,
    })
}

fn day_tasks(plan: &StrategyPlan, date: Date, defaults: &ScheduleDefaults) -> Result<DayTasks> {
    let weekday = Weekday::from_date(date);
    let week = match plan_status(plan.input.start_date, date)? {
        PlanStatus::Active { week } => Some(week),
        _ => None,
    };
    let weekly_plan = week.and_then(|week| plan.week(week));

    let posts = weekly_plan
        .map(|weekly| {
            weekly
                .posts_on(weekday)
                .map(|post| PostTask {
                    content: post.content.clone(),
                    post_type: post.post_type,
                    time: posting_time(plan, weekday, post.post_type, defaults),
                })
                .collect()
        })
        .unwrap_or_default();

    let story = weekly_plan.and_then(|weekly| {
        plan.schedule
            .story_days
            .iter()
            .find(|slot| slot.day == weekday)
            .map(|slot| StoryTask {
                time: slot.time.clone(),
                ideas: weekly.story_content.clone(),
            })
    });

    Ok(DayTasks {
        date,
        weekday,
        week,
        posts,
        story,
    })
}

/// Exact day+type slot first, then any slot that day, then the placeholder.
fn posting_time(
    plan: &StrategyPlan,
    weekday: Weekday,
    post_type: PostType,
    defaults: &ScheduleDefaults,
) -> String {
    let slots = &plan.schedule.posting_days;
    slots
        .iter()
        .find(|slot| slot.day == weekday && slot.post_type == post_type)
        .or_else(|| slots.iter().find(|slot| slot.day == weekday))
        .map(|slot| slot.time.clone())
        .unwrap_or_else(|| defaults.unmatched_time.clone())
}
