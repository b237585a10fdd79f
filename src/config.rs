use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{PlanError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            timeout_ms: 30_000,
        }
    }
}

/// Fixed times used when the generated schedule does not name one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleDefaults {
    pub feed_time: String,
    pub reel_time: String,
    pub story_time: String,
    pub unmatched_time: String,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            feed_time: "13:00".to_string(),
            reel_time: "19:00".to_string(),
            story_time: "11:00".to_string(),
            unmatched_time: "未定".to_string(),
        }
    }
}

/// Locale-specific text the normalizer falls back to. `{theme}` in the
/// filler formats is replaced with the week's theme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanTemplates {
    pub week_themes: Vec<String>,
    pub feed_filler: String,
    pub reel_filler: String,
    pub story_filler: String,
    pub features: Vec<String>,
    pub suggested_content_types: Vec<String>,
}

impl Default for PlanTemplates {
    fn default() -> Self {
        Self {
            week_themes: vec![
                "ブランド紹介".to_string(),
                "顧客の信頼獲得".to_string(),
                "業界の専門性".to_string(),
                "エンゲージメント強化".to_string(),
            ],
            feed_filler: "{theme}に関する投稿".to_string(),
            reel_filler: "{theme}を伝えるリール".to_string(),
            story_filler: "{theme}の舞台裏をストーリーで紹介".to_string(),
            features: vec![
                "週ごとのテーマで一貫した発信".to_string(),
                "フィードとリールの組み合わせでリーチを拡大".to_string(),
                "ストーリーでフォロワーとの接点を維持".to_string(),
            ],
            suggested_content_types: vec![
                "ノウハウ・Tips".to_string(),
                "商品・サービス紹介".to_string(),
                "お客様の声".to_string(),
                "舞台裏".to_string(),
            ],
        }
    }
}

impl PlanTemplates {
    /// Theme for a 1-based week number; cycles when fewer than four are set.
    pub fn theme_for_week(&self, week: u8) -> String {
        if self.week_themes.is_empty() {
            return format!("Week {}", week);
        }
        let idx = usize::from(week.saturating_sub(1)) % self.week_themes.len();
        self.week_themes[idx].clone()
    }

    pub fn fill(format: &str, theme: &str) -> String {
        format.replace("{theme}", theme)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub max_plans_per_user: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/plans.json"),
            max_plans_per_user: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub llm: LlmConfig,
    pub schedule: ScheduleDefaults,
    pub templates: PlanTemplates,
    pub store: StoreConfig,
}

impl PlannerConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>)> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| PlanError::storage(path, err))?;
                Self::from_toml(&contents)?
            }
            _ => PlannerConfig::default(),
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|err| PlanError::config(format!("failed to parse config: {}", err)))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| PlanError::storage(parent, err))?;
            }
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| PlanError::config(format!("failed to serialize config: {}", err)))?;
        std::fs::write(path, payload).map_err(|err| PlanError::storage(path, err))?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_base) = env::var("OPENAI_API_BASE") {
            if !api_base.trim().is_empty() {
                self.llm.api_base = api_base;
            }
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            if !model.trim().is_empty() {
                self.llm.model = model;
            }
        }
        if let Ok(timeout) = env::var("OPENAI_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.llm.timeout_ms = value;
            }
        }
        if let Ok(path) = env::var("PLAN_STORE_PATH") {
            if !path.trim().is_empty() {
                self.store.path = PathBuf::from(path);
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("PLANNER_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/planner.toml")))
}
