use growth_planner::simulation::{rate_difficulty, split_weekly_increases, IndustryRange};
use growth_planner::{
    compute_simulation, format_number, format_stars, Cadence, Metrics, OperationPurpose,
    PlanError, PlanInput,
};
use jiff::civil::date;

fn input(current: u64, target: u64) -> PlanInput {
    PlanInput {
        current_followers: current,
        target_followers: target,
        operation_purpose: OperationPurpose::Awareness,
        weekly_posts: Cadence::Weekly3To4,
        reel_capability: Cadence::Weekly1To2,
        story_frequency: Cadence::Weekly3To4,
        start_date: date(2025, 1, 6),
        target_audience: None,
        posting_time: None,
    }
}

fn history() -> Metrics {
    Metrics {
        reach: 10_000,
        engagement_rate: 3.0,
        profile_views: 500,
        saves: 100,
        follower_delta: 40,
        post_count: 10,
    }
}

#[test]
fn weekly_increases_sum_to_gap() {
    for gap in [1u64, 2, 3, 4, 7, 99, 100, 1001] {
        let increases = split_weekly_increases(gap);
        assert_eq!(increases.iter().sum::<u64>(), gap);
        let max = *increases.iter().max().unwrap();
        let min = *increases.iter().min().unwrap();
        assert!(max - min <= 1);
    }
}

#[test]
fn small_gaps_front_load_the_remainder() {
    assert_eq!(split_weekly_increases(4), [1, 1, 1, 1]);
    assert_eq!(split_weekly_increases(1), [1, 0, 0, 0]);
    assert_eq!(split_weekly_increases(7), [2, 2, 2, 1]);

    let result = compute_simulation(&input(100, 101), None).unwrap();
    assert_eq!(result.weekly_increases, [1, 0, 0, 0]);
    assert_eq!(result.weekly_targets, [101, 101, 101, 101]);
}

#[test]
fn weekly_targets_are_cumulative() {
    let result = compute_simulation(&input(1000, 1100), None).unwrap();
    assert_eq!(result.follower_gap, 100);
    assert_eq!(result.weekly_increases, [25, 25, 25, 25]);
    assert_eq!(result.weekly_targets, [1025, 1050, 1075, 1100]);
    assert_eq!(*result.weekly_targets.last().unwrap(), 1100);
}

#[test]
fn cadence_rounds_representative_counts() {
    let result = compute_simulation(&input(1000, 1100), None).unwrap();
    assert!((result.weekly_posts_num - 3.5).abs() < 1e-6);
    assert!((result.weekly_reel_posts - 1.5).abs() < 1e-6);
    assert!((result.story_posts_per_week - 4.0).abs() < 1e-6);
    assert!((result.monthly_posts - 20.0).abs() < 1e-6);
    assert_eq!(result.cadence.feed_per_week, 4);
    assert_eq!(result.cadence.reel_per_week, 2);
    assert_eq!(result.cadence.story_per_week, 4);
    assert_eq!(result.cadence.posts_per_week(), 6);
}

#[test]
fn growth_inside_industry_range_is_standard() {
    let result = compute_simulation(&input(1000, 1040), None).unwrap();
    assert!((result.monthly_growth_rate - 4.0).abs() < 1e-6);
    assert_eq!(result.difficulty.stars, 3);
    assert_eq!(result.difficulty.label, "標準");
    assert!((result.difficulty.achievement_rate - 72.0).abs() < 1e-6);
    assert_eq!(result.difficulty.industry_range, "3.0〜6.0%");
}

#[test]
fn growth_below_range_is_easy() {
    let result = compute_simulation(&input(1000, 1010), None).unwrap();
    assert_eq!(result.difficulty.stars, 1);
    assert_eq!(result.difficulty.label, "簡単");
    let expected = 85.0 + 10.0 * (2.0 / 3.0);
    assert!((result.difficulty.achievement_rate - expected).abs() < 1e-6);
    assert!(result.difficulty.achievement_rate >= 85.0);
    assert!(result.difficulty.achievement_rate <= 95.0);
}

#[test]
fn growth_above_range_is_ambitious_and_monotonic() {
    let range = IndustryRange::for_purpose(OperationPurpose::Awareness);
    let twelve = rate_difficulty(12.0, range);
    assert_eq!(twelve.stars, 5);
    assert_eq!(twelve.label, "やや高め");
    assert!(twelve.achievement_rate > 30.0 && twelve.achievement_rate < 58.0);

    let mut previous = rate_difficulty(6.5, range).achievement_rate;
    for rate in [8.0, 12.0, 20.0, 50.0, 500.0] {
        let current = rate_difficulty(rate, range).achievement_rate;
        assert!(current < previous);
        assert!(current > 30.0);
        previous = current;
    }
}

#[test]
fn ambitious_rate_matches_interpolation() {
    let result = compute_simulation(&input(1000, 1100), None).unwrap();
    assert!((result.monthly_growth_rate - 10.0).abs() < 1e-6);
    assert!((result.difficulty.achievement_rate - 46.8).abs() < 1e-6);
    assert!((result.difficulty.growth_rate - 10.0).abs() < 1e-6);
}

#[test]
fn industry_range_depends_on_purpose() {
    let mut recruiting = input(1000, 1040);
    recruiting.operation_purpose = OperationPurpose::Recruiting;
    let result = compute_simulation(&recruiting, None).unwrap();
    assert_eq!(result.difficulty.industry_range, "1.0〜3.0%");
    assert_eq!(result.difficulty.stars, 5);
}

#[test]
fn cold_start_projection_uses_follower_baseline() {
    let result = compute_simulation(&input(1000, 1100), None).unwrap();
    let expected = &result.expected_results;
    assert_eq!(expected.monthly_reach, 4875);
    assert_eq!(expected.engagement_rate, "4.0〜5.5%");
    assert_eq!(expected.profile_views, 244);
    assert_eq!(expected.saves, 240);
    assert_eq!(expected.new_followers, 100);
}

#[test]
fn cold_start_without_reels_skips_boosts() {
    let mut no_reels = input(1000, 1100);
    no_reels.reel_capability = Cadence::None;
    let result = compute_simulation(&no_reels, None).unwrap();
    let expected = &result.expected_results;
    assert_eq!(result.cadence.reel_per_week, 0);
    assert_eq!(expected.engagement_rate, "3.5〜4.5%");
    assert_eq!(expected.saves, 112);
}

#[test]
fn history_projection_scales_by_post_ratio() {
    let result = compute_simulation(&input(1000, 1100), Some(&history())).unwrap();
    let expected = &result.expected_results;
    assert_eq!(expected.monthly_reach, 23_000);
    assert_eq!(expected.engagement_rate, "2.8〜3.8%");
    assert_eq!(expected.profile_views, 1000);
    assert_eq!(expected.saves, 260);
    assert_eq!(expected.new_followers, 100);
}

#[test]
fn history_without_posts_uses_unit_ratio() {
    let mut metrics = history();
    metrics.post_count = 0;
    let mut no_reels = input(1000, 1100);
    no_reels.reel_capability = Cadence::None;
    let result = compute_simulation(&no_reels, Some(&metrics)).unwrap();
    assert_eq!(result.expected_results.monthly_reach, 10_000);
    assert_eq!(result.expected_results.profile_views, 500);
    assert_eq!(result.expected_results.saves, 100);
}

#[test]
fn history_engagement_is_clamped() {
    let mut metrics = history();
    metrics.engagement_rate = 1.0;
    let mut no_reels = input(1000, 1100);
    no_reels.reel_capability = Cadence::None;
    let result = compute_simulation(&no_reels, Some(&metrics)).unwrap();
    assert_eq!(result.expected_results.engagement_rate, "2.0〜2.0%");
}

#[test]
fn rejects_zero_current_followers() {
    let err = compute_simulation(&input(0, 100), None).unwrap_err();
    match err {
        PlanError::InvalidInput { field, .. } => assert_eq!(field, "currentFollowers"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_target_not_above_current() {
    for target in [1000, 999] {
        let err = compute_simulation(&input(1000, target), None).unwrap_err();
        match err {
            PlanError::InvalidInput { field, .. } => assert_eq!(field, "targetFollowers"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn display_helpers_format_report_values() {
    assert_eq!(format_number(0), "0");
    assert_eq!(format_number(999), "999");
    assert_eq!(format_number(1_234_567), "1,234,567");
    assert_eq!(format_stars(3), "★★★☆☆");
    assert_eq!(format_stars(9), "★★★★★");
}

#[test]
fn cadence_labels_parse_back() {
    for cadence in [
        Cadence::None,
        Cadence::Weekly1To2,
        Cadence::Weekly3To4,
        Cadence::Daily,
    ] {
        assert_eq!(Cadence::from_str(cadence.label()), Some(cadence));
    }
    assert_eq!(Cadence::Weekly1To2.label(), "weekly-1-2");
}
