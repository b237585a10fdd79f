use serde_json::Value;

use crate::config::ScheduleDefaults;
use crate::model::{PostType, PostingSlot, Schedule, StorySlot, WeeklyPlan};
use crate::normalize::raw::{field, text};
use crate::simulation::WeekCadence;
use crate::weekday::Weekday;

/// Derives the recurring posting schedule from week 1 of the finalized plans.
pub fn normalize_posting_schedule(
    raw_schedule: &Value,
    weekly_plans: &[WeeklyPlan],
    cadence: &WeekCadence,
    defaults: &ScheduleDefaults,
) -> Schedule {
    let raw_slots = raw_posting_slots(raw_schedule);
    let first_week = weekly_plans
        .iter()
        .find(|plan| plan.week == 1)
        .or_else(|| weekly_plans.first());

    let posting_days = first_week
        .map(|plan| {
            plan.feed_posts
                .iter()
                .map(|post| {
                    let time = raw_slots
                        .iter()
                        .find(|slot| slot.day == post.day && slot.post_type == post.post_type)
                        .and_then(|slot| slot.time.clone())
                        .unwrap_or_else(|| default_time(post.post_type, defaults));
                    PostingSlot {
                        day: post.day,
                        time,
                        post_type: post.post_type,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Schedule {
        feed_per_week: cadence.feed_per_week,
        reel_per_week: cadence.reel_per_week,
        story_per_week: cadence.story_per_week,
        posting_days,
        story_days: story_slots(raw_schedule, cadence.story_per_week, defaults),
    }
}

/// Accepts `H:MM`, `HH:MM` or `HH:MM:SS` and returns zero-padded `HH:MM`.
pub fn normalize_time(value: &str) -> Option<String> {
    let mut parts = value.trim().split(':');
    let hour = parts.next()?.trim().parse::<u8>().ok()?;
    let minute = parts.next()?.trim().parse::<u8>().ok()?;
    if let Some(seconds) = parts.next() {
        seconds.trim().parse::<u8>().ok().filter(|s| *s < 60)?;
    }
    if parts.next().is_some() || hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}", hour, minute))
}

pub fn default_time(post_type: PostType, defaults: &ScheduleDefaults) -> String {
    match post_type {
        PostType::Feed => defaults.feed_time.clone(),
        PostType::Reel => defaults.reel_time.clone(),
    }
}

struct RawSlot {
    day: Weekday,
    post_type: PostType,
    time: Option<String>,
}

fn raw_posting_slots(raw_schedule: &Value) -> Vec<RawSlot> {
    let items = match field(raw_schedule, &["postingDays", "posting_days"]) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| {
            let object = item.as_object()?;
            let day = object.get("day").and_then(Value::as_str).and_then(Weekday::parse)?;
            let post_type = object
                .get("type")
                .and_then(Value::as_str)
                .map(PostType::coerce)
                .unwrap_or(PostType::Feed);
            let time = text(object.get("time")).and_then(|time| normalize_time(&time));
            Some(RawSlot {
                day,
                post_type,
                time,
            })
        })
        .collect()
}

fn story_slots(
    raw_schedule: &Value,
    story_per_week: u32,
    defaults: &ScheduleDefaults,
) -> Vec<StorySlot> {
    if story_per_week == 0 {
        return Vec::new();
    }

    let items = match field(raw_schedule, &["storyDays", "story_days"]) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };

    let mut slots: Vec<StorySlot> = Vec::new();
    for item in items {
        let (day, time) = match item {
            Value::String(label) => (Weekday::parse(label), None),
            Value::Object(object) => (
                object.get("day").and_then(Value::as_str).and_then(Weekday::parse),
                text(object.get("time")).and_then(|time| normalize_time(&time)),
            ),
            _ => (None, None),
        };
        let Some(day) = day else {
            continue;
        };
        if slots.iter().any(|slot| slot.day == day) {
            continue;
        }
        slots.push(StorySlot {
            day,
            time: time.unwrap_or_else(|| defaults.story_time.clone()),
        });
    }
    slots.truncate(story_per_week as usize);

    if slots.is_empty() {
        slots = (0..story_per_week.min(7) as usize)
            .map(|idx| StorySlot {
                day: Weekday::from_index(idx),
                time: defaults.story_time.clone(),
            })
            .collect();
    }

    slots
}
