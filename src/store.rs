use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{PlanError, Result};
use crate::model::StrategyPlan;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPlan {
    pub user_id: String,
    pub plan: StrategyPlan,
}

/// JSON-file plan store keyed by user and plan id. Newest plan first per
/// user; concurrent writers race and the last write wins.
pub struct PlanStore {
    path: PathBuf,
    max_per_user: usize,
    plans: RwLock<Vec<StoredPlan>>,
}

impl PlanStore {
    pub async fn load(path: PathBuf, max_per_user: usize) -> Result<Self> {
        let plans = if path.exists() {
            let data = tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| PlanError::storage(&path, err))?;
            if data.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            max_per_user: max_per_user.max(1),
            plans: RwLock::new(plans),
        })
    }

    pub async fn list(&self, user_id: &str) -> Vec<StrategyPlan> {
        let guard = self.plans.read().await;
        guard
            .iter()
            .filter(|stored| stored.user_id == user_id)
            .map(|stored| stored.plan.clone())
            .collect()
    }

    pub async fn get(&self, user_id: &str, plan_id: &str) -> Option<StrategyPlan> {
        let guard = self.plans.read().await;
        guard
            .iter()
            .find(|stored| stored.user_id == user_id && stored.plan.id == plan_id)
            .map(|stored| stored.plan.clone())
    }

    /// The plan currently in force for a user.
    pub async fn latest(&self, user_id: &str) -> Option<StrategyPlan> {
        let guard = self.plans.read().await;
        guard
            .iter()
            .find(|stored| stored.user_id == user_id)
            .map(|stored| stored.plan.clone())
    }

    /// Stores `plan` as the user's newest plan, replacing any stored plan with
    /// the same id. Memory only changes once the file write succeeds.
    pub async fn save(&self, user_id: &str, plan: StrategyPlan) -> Result<StrategyPlan> {
        let mut guard = self.plans.write().await;
        let mut next: Vec<StoredPlan> = Vec::with_capacity(guard.len() + 1);
        next.push(StoredPlan {
            user_id: user_id.to_string(),
            plan: plan.clone(),
        });

        let mut kept = 1usize;
        for stored in guard.iter() {
            if stored.user_id != user_id {
                next.push(stored.clone());
                continue;
            }
            if stored.plan.id == plan.id || kept >= self.max_per_user {
                continue;
            }
            kept += 1;
            next.push(stored.clone());
        }

        self.persist(&next).await?;
        *guard = next;
        debug!(user_id, plan_id = %plan.id, "plan saved");
        Ok(plan)
    }

    pub async fn delete(&self, user_id: &str, plan_id: &str) -> Result<bool> {
        let mut guard = self.plans.write().await;
        let next: Vec<StoredPlan> = guard
            .iter()
            .filter(|stored| !(stored.user_id == user_id && stored.plan.id == plan_id))
            .cloned()
            .collect();
        if next.len() == guard.len() {
            return Ok(false);
        }
        self.persist(&next).await?;
        *guard = next;
        Ok(true)
    }

    async fn persist(&self, plans: &[StoredPlan]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).await?;
        }
        let payload = serde_json::to_string_pretty(plans)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload)
            .await
            .map_err(|err| PlanError::storage(&tmp_path, err))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|err| PlanError::storage(&self.path, err))?;
        Ok(())
    }
}

async fn ensure_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| PlanError::storage(path, err))
}
