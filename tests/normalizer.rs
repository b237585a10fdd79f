use growth_planner::config::{PlanTemplates, ScheduleDefaults};
use growth_planner::model::{PostType, WeeklyPlan};
use growth_planner::normalize::{
    fallback_weekly_plans, normalize_posting_schedule, normalize_time, normalize_weekly_plans,
    RawStrategy, WeekTargets,
};
use growth_planner::{WeekCadence, Weekday};
use serde_json::{json, Value};
use std::collections::HashSet;

const INCREASES: [u64; 4] = [25, 25, 25, 25];

fn targets(feed: u32, reel: u32, story: u32) -> WeekTargets<'static> {
    WeekTargets {
        current_followers: 1000,
        weekly_increases: &INCREASES,
        cadence: WeekCadence {
            feed_per_week: feed,
            reel_per_week: reel,
            story_per_week: story,
        },
    }
}

fn days_of(plan: &WeeklyPlan, post_type: PostType) -> Vec<Weekday> {
    plan.feed_posts
        .iter()
        .filter(|post| post.post_type == post_type)
        .map(|post| post.day)
        .collect()
}

#[test]
fn fallback_hits_cadence_on_distinct_days() {
    let templates = PlanTemplates::default();
    let plans = fallback_weekly_plans(&targets(4, 2, 4), &templates);

    assert_eq!(plans.len(), 4);
    for (idx, plan) in plans.iter().enumerate() {
        assert_eq!(usize::from(plan.week), idx + 1);
        assert_eq!(plan.count(PostType::Feed), 4);
        assert_eq!(plan.count(PostType::Reel), 2);
        let days: HashSet<Weekday> = plan.feed_posts.iter().map(|post| post.day).collect();
        assert_eq!(days.len(), 6);
        assert_eq!(plan.story_content.len(), 1);
    }

    let first = &plans[0];
    assert_eq!(first.theme, "ブランド紹介");
    assert_eq!(
        days_of(first, PostType::Feed),
        vec![Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday, Weekday::Thursday]
    );
    assert_eq!(days_of(first, PostType::Reel), vec![Weekday::Friday, Weekday::Saturday]);
    assert_eq!(first.feed_posts[0].content, "ブランド紹介に関する投稿");
    assert_eq!(first.feed_posts[4].content, "ブランド紹介を伝えるリール");
    assert_eq!(first.story_content[0], "ブランド紹介の舞台裏をストーリーで紹介");
}

#[test]
fn weekly_targets_follow_increases() {
    let plans = fallback_weekly_plans(&targets(4, 2, 4), &PlanTemplates::default());
    let followers: Vec<u64> = plans.iter().map(|plan| plan.target_followers).collect();
    assert_eq!(followers, vec![1025, 1050, 1075, 1100]);
    assert!(plans.iter().all(|plan| plan.increase == 25));
}

#[test]
fn duplicates_are_dropped_and_types_coerced() {
    let raw = vec![json!({
        "week": 1,
        "theme": "新商品",
        "feedPosts": [
            { "day": "月曜日", "content": "A", "type": "feed" },
            { "day": "月", "content": "B", "type": "feed" },
            { "day": "火曜", "content": "C", "type": "リール" },
            { "day": "水曜日", "content": "D", "type": "story" },
            { "day": "Friday", "content": "   ", "type": "feed" },
            "garbage"
        ]
    })];

    let plans = normalize_weekly_plans(&raw, &targets(2, 1, 0), &PlanTemplates::default());
    let first = &plans[0];
    assert_eq!(first.theme, "新商品");

    let summary: Vec<(Weekday, &str, PostType)> = first
        .feed_posts
        .iter()
        .map(|post| (post.day, post.content.as_str(), post.post_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Weekday::Monday, "A", PostType::Feed),
            (Weekday::Tuesday, "C", PostType::Reel),
            (Weekday::Wednesday, "D", PostType::Feed),
        ]
    );
    assert!(first.story_content.is_empty());
}

#[test]
fn oversupplied_posts_are_truncated_in_order() {
    let posts: Vec<Value> = ["月", "火", "水", "木", "金", "土"]
        .iter()
        .enumerate()
        .map(|(idx, day)| json!({ "day": day, "content": format!("post {}", idx), "type": "feed" }))
        .collect();
    let raw = vec![json!({ "week": 1, "feedPosts": posts })];

    let plans = normalize_weekly_plans(&raw, &targets(2, 0, 1), &PlanTemplates::default());
    let contents: Vec<&str> = plans[0]
        .feed_posts
        .iter()
        .map(|post| post.content.as_str())
        .collect();
    assert_eq!(contents, vec!["post 0", "post 1"]);
}

#[test]
fn reel_sharing_a_feed_day_moves_to_a_free_day() {
    let raw = vec![json!({
        "week": 1,
        "feedPosts": [
            { "day": "月曜日", "content": "F", "type": "feed" },
            { "day": "月曜日", "content": "R", "type": "reel" }
        ]
    })];

    let plans = normalize_weekly_plans(&raw, &targets(1, 1, 0), &PlanTemplates::default());
    let first = &plans[0];
    assert_eq!(first.feed_posts.len(), 2);
    assert_eq!(first.feed_posts[0].day, Weekday::Monday);
    assert_eq!(first.feed_posts[0].post_type, PostType::Feed);
    assert_eq!(first.feed_posts[1].day, Weekday::Tuesday);
    assert_eq!(first.feed_posts[1].content, "R");
}

#[test]
fn missing_day_falls_back_to_position() {
    let raw = vec![json!({
        "week": 1,
        "feedPosts": [
            { "day": "someday", "content": "first", "type": "feed" },
            { "content": "second", "type": "feed" }
        ]
    })];

    let plans = normalize_weekly_plans(&raw, &targets(2, 0, 0), &PlanTemplates::default());
    assert_eq!(
        days_of(&plans[0], PostType::Feed),
        vec![Weekday::Monday, Weekday::Tuesday]
    );
}

#[test]
fn weeks_are_located_by_number_then_position() {
    let raw = vec![
        json!({ "week": 2, "theme": "Second" }),
        json!({ "week": "1", "theme": "First" }),
    ];

    let plans = normalize_weekly_plans(&raw, &targets(1, 0, 1), &PlanTemplates::default());
    let themes: Vec<&str> = plans.iter().map(|plan| plan.theme.as_str()).collect();
    assert_eq!(themes, vec!["First", "Second", "業界の専門性", "エンゲージメント強化"]);
}

#[test]
fn normalizing_normalized_plans_is_stable() {
    let raw = vec![json!({
        "week": 1,
        "theme": "開店準備",
        "feedPosts": [
            { "day": "水曜日", "content": "新メニュー", "type": "feed" },
            { "day": "水曜", "content": "動画", "type": "reel" },
            { "day": "日", "content": "週末", "type": "feed" }
        ],
        "storyContent": ["仕込み風景"]
    })];
    let targets = targets(4, 2, 4);
    let templates = PlanTemplates::default();

    let first = normalize_weekly_plans(&raw, &targets, &templates);
    let serialized: Vec<Value> = first
        .iter()
        .map(|plan| serde_json::to_value(plan).unwrap())
        .collect();
    let second = normalize_weekly_plans(&serialized, &targets, &templates);

    assert_eq!(first, second);
}

#[test]
fn daily_feed_and_reels_reuse_days_across_types_only() {
    let plans = fallback_weekly_plans(&targets(7, 7, 7), &PlanTemplates::default());
    for plan in &plans {
        assert_eq!(plan.feed_posts.len(), 14);
        let feed: HashSet<Weekday> = days_of(plan, PostType::Feed).into_iter().collect();
        let reel: HashSet<Weekday> = days_of(plan, PostType::Reel).into_iter().collect();
        assert_eq!(feed.len(), 7);
        assert_eq!(reel.len(), 7);
    }
}

#[test]
fn posting_schedule_uses_week_one_and_raw_times() {
    let templates = PlanTemplates::default();
    let defaults = ScheduleDefaults::default();
    let cadence = targets(4, 2, 4).cadence;
    let plans = fallback_weekly_plans(&targets(4, 2, 4), &templates);
    let raw_schedule = json!({
        "postingDays": [
            { "day": "月曜", "time": "9:05", "type": "feed" },
            { "day": "金曜日", "time": "25:00", "type": "reel" }
        ],
        "storyDays": [
            "火曜日",
            { "day": "火", "time": "21:30" },
            { "day": "木曜日", "time": "20:00" },
            "xyz"
        ]
    });

    let schedule = normalize_posting_schedule(&raw_schedule, &plans, &cadence, &defaults);
    assert_eq!(schedule.feed_per_week, 4);
    assert_eq!(schedule.reel_per_week, 2);
    assert_eq!(schedule.story_per_week, 4);
    assert_eq!(schedule.posting_days.len(), 6);

    let monday = &schedule.posting_days[0];
    assert_eq!(monday.day, Weekday::Monday);
    assert_eq!(monday.time, "09:05");
    let tuesday = &schedule.posting_days[1];
    assert_eq!(tuesday.time, "13:00");
    let friday = &schedule.posting_days[4];
    assert_eq!(friday.day, Weekday::Friday);
    assert_eq!(friday.post_type, PostType::Reel);
    assert_eq!(friday.time, "19:00");

    let stories: Vec<(Weekday, &str)> = schedule
        .story_days
        .iter()
        .map(|slot| (slot.day, slot.time.as_str()))
        .collect();
    assert_eq!(
        stories,
        vec![(Weekday::Tuesday, "11:00"), (Weekday::Thursday, "20:00")]
    );
}

#[test]
fn story_slots_are_synthesized_or_cleared() {
    let defaults = ScheduleDefaults::default();
    let templates = PlanTemplates::default();

    let with_stories = targets(4, 2, 4);
    let plans = fallback_weekly_plans(&with_stories, &templates);
    let schedule = normalize_posting_schedule(&Value::Null, &plans, &with_stories.cadence, &defaults);
    let days: Vec<Weekday> = schedule.story_days.iter().map(|slot| slot.day).collect();
    assert_eq!(
        days,
        vec![Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday, Weekday::Thursday]
    );
    assert!(schedule.story_days.iter().all(|slot| slot.time == "11:00"));

    let no_stories = targets(4, 2, 0);
    let raw_schedule = json!({ "storyDays": ["月曜日", "火曜日"] });
    let schedule = normalize_posting_schedule(&raw_schedule, &plans, &no_stories.cadence, &defaults);
    assert!(schedule.story_days.is_empty());
}

#[test]
fn times_are_zero_padded() {
    assert_eq!(normalize_time("9:05").as_deref(), Some("09:05"));
    assert_eq!(normalize_time(" 18:30:00 ").as_deref(), Some("18:30"));
    assert_eq!(normalize_time("24:00"), None);
    assert_eq!(normalize_time("12:60"), None);
    assert_eq!(normalize_time("noon"), None);
}

#[test]
fn raw_strategy_tolerates_fenced_output() {
    let text = "Here you go:\n```json\n{\"weekly_plans\": [{\"week\": 1}], \"features\": [\" 毎日更新 \", \"\", 3]}\n```";
    let raw = RawStrategy::parse(text).unwrap();
    assert_eq!(raw.weekly_plans.len(), 1);
    assert_eq!(raw.features, vec!["毎日更新".to_string(), "3".to_string()]);
    assert!(raw.suggested_content_types.is_empty());
    assert!(raw.posting_schedule.is_null());

    assert!(RawStrategy::parse("no json here").is_err());
    assert!(RawStrategy::parse("{ not valid }").is_err());
}
