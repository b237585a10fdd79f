use serde_json::{Map, Value};

use crate::config::PlanTemplates;
use crate::model::{FeedPost, PlanInput, PostType, WeeklyPlan};
use crate::normalize::raw::{field, string_list, text, unsigned};
use crate::simulation::{SimulationResult, WeekCadence, WEEKS_PER_PLAN};
use crate::weekday::{Weekday, ALL_WEEKDAYS};

/// Numeric constraints a month of weekly plans is reconciled against.
#[derive(Debug, Clone, Copy)]
pub struct WeekTargets<'a> {
    pub current_followers: u64,
    pub weekly_increases: &'a [u64],
    pub cadence: WeekCadence,
}

impl<'a> WeekTargets<'a> {
    pub fn from_simulation(input: &PlanInput, simulation: &'a SimulationResult) -> Self {
        Self {
            current_followers: input.current_followers,
            weekly_increases: &simulation.weekly_increases,
            cadence: simulation.cadence,
        }
    }
}

type DaySet = [bool; 7];

/// Repairs up to four loosely-shaped generated weeks into exactly four
/// [`WeeklyPlan`]s that hit the cadence.
///
/// Each week ends up with exactly `feed_per_week` feed posts and
/// `reel_per_week` reel posts. Days are distinct whenever the two counts sum
/// to seven or less. Running the output back through this function (after
/// serialising it) yields the same plans.
pub fn normalize_weekly_plans(
    raw_weeks: &[Value],
    targets: &WeekTargets<'_>,
    templates: &PlanTemplates,
) -> Vec<WeeklyPlan> {
    let empty = Value::Object(Map::new());
    let mut running = targets.current_followers;
    let mut plans = Vec::with_capacity(WEEKS_PER_PLAN);

    for week in 1..=WEEKS_PER_PLAN as u8 {
        let raw = locate_week(raw_weeks, week).unwrap_or(&empty);
        let increase = targets
            .weekly_increases
            .get(usize::from(week - 1))
            .copied()
            .or_else(|| unsigned(field(raw, &["increase"])))
            .unwrap_or(0);
        running += increase;
        plans.push(normalize_week(
            raw,
            week,
            running,
            increase,
            &targets.cadence,
            templates,
        ));
    }

    plans
}

/// Cadence-correct template month used when generation is unavailable.
pub fn fallback_weekly_plans(
    targets: &WeekTargets<'_>,
    templates: &PlanTemplates,
) -> Vec<WeeklyPlan> {
    normalize_weekly_plans(&[], targets, templates)
}

fn locate_week(raw_weeks: &[Value], week: u8) -> Option<&Value> {
    raw_weeks
        .iter()
        .find(|raw| unsigned(field(raw, &["week"])) == Some(u64::from(week)))
        .or_else(|| {
            raw_weeks
                .get(usize::from(week - 1))
                .filter(|raw| raw.is_object())
        })
}

fn normalize_week(
    raw: &Value,
    week: u8,
    target_followers: u64,
    increase: u64,
    cadence: &WeekCadence,
    templates: &PlanTemplates,
) -> WeeklyPlan {
    let theme = text(field(raw, &["theme"])).unwrap_or_else(|| templates.theme_for_week(week));
    let candidates = parse_posts(raw);

    let mut feed = dedup_bucket(&candidates, PostType::Feed, cadence.feed_per_week);
    let mut reel = dedup_bucket(&candidates, PostType::Reel, cadence.reel_per_week);

    let mut used = days_used(feed.iter().chain(reel.iter()));
    resolve_collisions(&feed, &mut reel, &mut used);

    let feed_filler = PlanTemplates::fill(&templates.feed_filler, &theme);
    let reel_filler = PlanTemplates::fill(&templates.reel_filler, &theme);
    top_up(&mut feed, cadence.feed_per_week, PostType::Feed, &feed_filler, &mut used);
    top_up(&mut reel, cadence.reel_per_week, PostType::Reel, &reel_filler, &mut used);

    let mut feed_posts = feed;
    feed_posts.extend(reel);
    feed_posts.sort_by_key(|post| post.day.index());

    let mut story_content = string_list(field(raw, &["storyContent", "story_content", "stories"]));
    if cadence.story_per_week == 0 {
        story_content.clear();
    } else if story_content.is_empty() {
        story_content.push(PlanTemplates::fill(&templates.story_filler, &theme));
    }

    WeeklyPlan {
        week,
        target_followers,
        increase,
        theme,
        feed_posts,
        story_content,
    }
}

fn parse_posts(raw: &Value) -> Vec<FeedPost> {
    let items = match field(raw, &["feedPosts", "feed_posts", "posts"]) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let object = item.as_object()?;
            let content = text(object.get("content").or_else(|| object.get("title")))?;
            let post_type = object
                .get("type")
                .and_then(Value::as_str)
                .map(PostType::coerce)
                .unwrap_or(PostType::Feed);
            let day = object
                .get("day")
                .and_then(Value::as_str)
                .and_then(Weekday::parse)
                .unwrap_or_else(|| Weekday::from_index(idx));
            Some(FeedPost {
                day,
                content,
                post_type,
            })
        })
        .collect()
}

/// First post per day wins; the bucket never exceeds its target.
fn dedup_bucket(posts: &[FeedPost], post_type: PostType, target: u32) -> Vec<FeedPost> {
    let mut seen: DaySet = [false; 7];
    let mut kept = Vec::new();
    for post in posts.iter().filter(|post| post.post_type == post_type) {
        if seen[post.day.index()] {
            continue;
        }
        seen[post.day.index()] = true;
        kept.push(post.clone());
    }
    kept.truncate(target as usize);
    kept
}

/// Reels yield to feed posts on a shared day when a free day exists.
fn resolve_collisions(feed: &[FeedPost], reel: &mut [FeedPost], used: &mut DaySet) {
    for post in reel.iter_mut() {
        if !feed.iter().any(|other| other.day == post.day) {
            continue;
        }
        if let Some(day) = first_free(used) {
            used[day.index()] = true;
            post.day = day;
        }
    }
}

fn top_up(
    bucket: &mut Vec<FeedPost>,
    target: u32,
    post_type: PostType,
    content: &str,
    used: &mut DaySet,
) {
    while bucket.len() < target as usize {
        // All seven days taken is only reachable when feed + reel > 7; the
        // bucket itself still stays one post per day.
        let day = first_free(used).unwrap_or_else(|| {
            ALL_WEEKDAYS
                .iter()
                .copied()
                .find(|day| bucket.iter().all(|post| post.day != *day))
                .unwrap_or(Weekday::Monday)
        });
        used[day.index()] = true;
        bucket.push(FeedPost {
            day,
            content: content.to_string(),
            post_type,
        });
    }
}

fn days_used<'a>(posts: impl Iterator<Item = &'a FeedPost>) -> DaySet {
    let mut used: DaySet = [false; 7];
    for post in posts {
        used[post.day.index()] = true;
    }
    used
}

fn first_free(used: &DaySet) -> Option<Weekday> {
    ALL_WEEKDAYS.iter().copied().find(|day| !used[day.index()])
}
