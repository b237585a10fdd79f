use serde_json::Value;

use crate::error::GenerationError;

/// Generator output as received. Nothing in here is trusted: every field is
/// read through the coercion helpers below before it reaches a typed plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStrategy {
    pub posting_schedule: Value,
    pub weekly_plans: Vec<Value>,
    pub features: Vec<String>,
    pub suggested_content_types: Vec<String>,
}

impl RawStrategy {
    /// Parses model output that should contain one JSON object, tolerating
    /// surrounding prose or code fences.
    pub fn parse(text: &str) -> Result<Self, GenerationError> {
        let json = extract_json(text)
            .ok_or_else(|| GenerationError::Parse("response missing JSON object".to_string()))?;
        let value: Value =
            serde_json::from_str(json).map_err(|err| GenerationError::Parse(err.to_string()))?;
        if !value.is_object() {
            return Err(GenerationError::Parse("response is not a JSON object".to_string()));
        }
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let weekly_plans = match field(value, &["weeklyPlans", "weekly_plans"]) {
            Some(Value::Array(weeks)) => weeks.clone(),
            _ => Vec::new(),
        };

        Self {
            posting_schedule: field(value, &["postingSchedule", "posting_schedule"])
                .cloned()
                .unwrap_or(Value::Null),
            weekly_plans,
            features: string_list(field(value, &["features"])),
            suggested_content_types: string_list(field(
                value,
                &["suggestedContentTypes", "suggested_content_types"],
            )),
        }
    }
}

pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(&text[start..=end])
}

/// First present key among `names`.
pub(crate) fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let object = value.as_object()?;
    names.iter().find_map(|name| object.get(*name))
}

/// Trimmed non-empty string, or `None`.
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative integer from a number or numeric string.
pub(crate) fn unsigned(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// A string or array of strings, trimmed, empty entries dropped.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|item| text(Some(item))).collect(),
        Some(Value::String(_)) => text(value).into_iter().collect(),
        _ => Vec::new(),
    }
}
