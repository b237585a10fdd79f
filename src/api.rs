use growth_planner::{Cadence, Metrics, OperationPurpose, PlanInput, PostingTime, StrategyPlan};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlanRequest {
    pub user_id: Option<String>,
    pub request_id: Option<String>,
    pub current_followers: Option<u64>,
    pub target_followers: Option<u64>,
    pub operation_purpose: Option<String>,
    pub weekly_posts: Option<String>,
    pub reel_capability: Option<String>,
    pub story_frequency: Option<String>,
    pub start_date: Option<String>,
    pub target_audience: Option<String>,
    pub posting_time: Option<String>,
    pub last_month: Option<Metrics>,
    pub use_ai: Option<bool>,
}

impl ApiPlanRequest {
    /// `today` fills a missing start date. The result is already validated.
    pub fn to_input(&self, today: Date) -> Result<PlanInput, String> {
        let current_followers = self
            .current_followers
            .ok_or_else(|| "currentFollowers is required".to_string())?;
        let target_followers = self
            .target_followers
            .ok_or_else(|| "targetFollowers is required".to_string())?;

        let operation_purpose = match self.operation_purpose.as_deref() {
            Some(value) => OperationPurpose::from_str(value)
                .ok_or_else(|| format!("invalid operationPurpose: {}", value))?,
            None => OperationPurpose::Awareness,
        };

        let start_date = match self.start_date.as_deref() {
            Some(value) => value
                .trim()
                .parse::<Date>()
                .map_err(|err| format!("invalid startDate '{}': {}", value, err))?,
            None => today,
        };

        let posting_time = match self.posting_time.as_deref() {
            Some(value) => Some(
                PostingTime::from_str(value)
                    .ok_or_else(|| format!("invalid postingTime: {}", value))?,
            ),
            None => None,
        };

        let input = PlanInput {
            current_followers,
            target_followers,
            operation_purpose,
            weekly_posts: parse_cadence(
                "weeklyPosts",
                self.weekly_posts.as_deref(),
                Cadence::Weekly3To4,
            )?,
            reel_capability: parse_cadence(
                "reelCapability",
                self.reel_capability.as_deref(),
                Cadence::Weekly1To2,
            )?,
            story_frequency: parse_cadence(
                "storyFrequency",
                self.story_frequency.as_deref(),
                Cadence::Weekly3To4,
            )?,
            start_date,
            target_audience: self
                .target_audience
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            posting_time,
        };
        input.validate().map_err(|err| err.to_string())?;
        Ok(input)
    }
}

fn parse_cadence(field: &str, value: Option<&str>, default: Cadence) -> Result<Cadence, String> {
    match value {
        Some(value) => {
            Cadence::from_str(value).ok_or_else(|| format!("invalid {}: {}", field, value))
        }
        None => Ok(default),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlanResponse {
    pub request_id: String,
    pub user_id: String,
    pub plan: StrategyPlan,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExecutionQuery {
    pub tz: Option<String>,
}
