use jiff::civil::Date;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::weekday::Weekday;

/// Qualitative posting-frequency bucket chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cadence {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "weekly-1-2")]
    Weekly1To2,
    #[serde(rename = "weekly-3-4")]
    Weekly3To4,
    #[serde(rename = "daily")]
    Daily,
}

impl Cadence {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "none" | "0" => Some(Cadence::None),
            "weekly-1-2" | "1-2" => Some(Cadence::Weekly1To2),
            "weekly-3-4" | "3-4" => Some(Cadence::Weekly3To4),
            "daily" | "7" => Some(Cadence::Daily),
            _ => None,
        }
    }

    /// Representative weekly count for feed and reel posts.
    pub fn posts_per_week(self) -> f64 {
        match self {
            Cadence::None => 0.0,
            Cadence::Weekly1To2 => 1.5,
            Cadence::Weekly3To4 => 3.5,
            Cadence::Daily => 7.0,
        }
    }

    /// Stories use their own table.
    pub fn stories_per_week(self) -> f64 {
        match self {
            Cadence::None => 0.0,
            Cadence::Weekly1To2 => 2.0,
            Cadence::Weekly3To4 => 4.0,
            Cadence::Daily => 7.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Cadence::None => "none",
            Cadence::Weekly1To2 => "weekly-1-2",
            Cadence::Weekly3To4 => "weekly-3-4",
            Cadence::Daily => "daily",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationPurpose {
    #[serde(rename = "認知拡大", alias = "awareness")]
    Awareness,
    #[serde(rename = "集客", alias = "acquisition")]
    Acquisition,
    #[serde(rename = "販売促進", alias = "sales")]
    Sales,
    #[serde(rename = "ファン育成", alias = "community")]
    Community,
    #[serde(rename = "採用", alias = "recruiting")]
    Recruiting,
    #[serde(rename = "ブランディング", alias = "branding")]
    Branding,
}

impl OperationPurpose {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "認知拡大" | "awareness" => Some(OperationPurpose::Awareness),
            "集客" | "acquisition" => Some(OperationPurpose::Acquisition),
            "販売促進" | "sales" => Some(OperationPurpose::Sales),
            "ファン育成" | "community" => Some(OperationPurpose::Community),
            "採用" | "recruiting" => Some(OperationPurpose::Recruiting),
            "ブランディング" | "branding" => Some(OperationPurpose::Branding),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OperationPurpose::Awareness => "認知拡大",
            OperationPurpose::Acquisition => "集客",
            OperationPurpose::Sales => "販売促進",
            OperationPurpose::Community => "ファン育成",
            OperationPurpose::Recruiting => "採用",
            OperationPurpose::Branding => "ブランディング",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingTime {
    Auto,
    Morning,
    Noon,
    Evening,
    Night,
}

impl PostingTime {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" | "" => Some(PostingTime::Auto),
            "morning" | "朝" => Some(PostingTime::Morning),
            "noon" | "昼" => Some(PostingTime::Noon),
            "evening" | "夕方" => Some(PostingTime::Evening),
            "night" | "夜" => Some(PostingTime::Night),
            _ => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            PostingTime::Auto => "no preference (choose the best time)",
            PostingTime::Morning => "morning (7:00-10:00)",
            PostingTime::Noon => "around noon (11:00-14:00)",
            PostingTime::Evening => "evening (17:00-20:00)",
            PostingTime::Night => "night (20:00-23:00)",
        }
    }
}

/// What the user asked for. Never mutated after submission; editing inputs
/// produces a new plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub current_followers: u64,
    pub target_followers: u64,
    pub operation_purpose: OperationPurpose,
    pub weekly_posts: Cadence,
    pub reel_capability: Cadence,
    pub story_frequency: Cadence,
    pub start_date: Date,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_time: Option<PostingTime>,
}

impl PlanInput {
    pub fn validate(&self) -> Result<()> {
        if self.current_followers == 0 {
            return Err(PlanError::invalid_input(
                "currentFollowers",
                "must be greater than 0",
            ));
        }
        if self.target_followers <= self.current_followers {
            return Err(PlanError::invalid_input(
                "targetFollowers",
                format!(
                    "must be greater than currentFollowers ({})",
                    self.current_followers
                ),
            ));
        }
        Ok(())
    }

    pub fn follower_gap(&self) -> u64 {
        self.target_followers.saturating_sub(self.current_followers)
    }
}

/// Last month's observed account performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub reach: u64,
    /// Percent, e.g. 4.2.
    pub engagement_rate: f64,
    pub profile_views: u64,
    pub saves: u64,
    pub follower_delta: i64,
    pub post_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Feed,
    Reel,
}

impl PostType {
    /// Anything that is not recognisably a reel is a feed post.
    pub fn coerce(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "reel" | "reels" | "リール" => PostType::Reel,
            _ => PostType::Feed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PostType::Feed => "feed",
            PostType::Reel => "reel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    pub day: Weekday,
    pub content: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    pub week: u8,
    pub target_followers: u64,
    pub increase: u64,
    pub theme: String,
    pub feed_posts: Vec<FeedPost>,
    pub story_content: Vec<String>,
}

impl WeeklyPlan {
    pub fn count(&self, post_type: PostType) -> usize {
        self.feed_posts
            .iter()
            .filter(|post| post.post_type == post_type)
            .count()
    }

    pub fn posts_on(&self, day: Weekday) -> impl Iterator<Item = &FeedPost> {
        self.feed_posts.iter().filter(move |post| post.day == day)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingSlot {
    pub day: Weekday,
    pub time: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySlot {
    pub day: Weekday,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub feed_per_week: u32,
    pub reel_per_week: u32,
    pub story_per_week: u32,
    pub posting_days: Vec<PostingSlot>,
    pub story_days: Vec<StorySlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedResults {
    pub monthly_reach: u64,
    /// Range string such as `3.5〜4.5%`.
    pub engagement_rate: String,
    pub profile_views: u64,
    pub saves: u64,
    pub new_followers: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Difficulty {
    pub stars: u8,
    pub label: String,
    pub industry_range: String,
    pub achievement_rate: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Generated,
    Fallback,
}

/// One month's growth contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPlan {
    pub id: String,
    pub created_at: Timestamp,
    pub input: PlanInput,
    pub weekly_plans: Vec<WeeklyPlan>,
    pub schedule: Schedule,
    pub expected_results: ExpectedResults,
    pub difficulty: Difficulty,
    pub features: Vec<String>,
    pub suggested_content_types: Vec<String>,
    pub source: PlanSource,
}

impl StrategyPlan {
    pub fn week(&self, week: u8) -> Option<&WeeklyPlan> {
        self.weekly_plans.iter().find(|plan| plan.week == week)
    }
}
