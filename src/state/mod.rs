//! Plan persistence
//!
//! Saved plans are the only artifact that outlives a conversation.
//! Currently uses in-memory; a real backend implements `PlanStore`.

use crate::models::{GeneratedPlan, PlanCategory, SavedPlan};
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Trait for plan persistence
#[async_trait::async_trait]
pub trait PlanStore: Send + Sync {
    async fn save_plan(&self, plan: &GeneratedPlan, category: PlanCategory) -> Result<SavedPlan>;
    /// Newest first
    async fn list_plans(&self) -> Result<Vec<SavedPlan>>;
    async fn load_plan(&self, plan_id: Uuid) -> Result<Option<SavedPlan>>;
    /// Returns whether a plan was removed
    async fn delete_plan(&self, plan_id: Uuid) -> Result<bool>;
}

/// In-memory plan store for development
pub struct InMemoryPlanStore {
    plans: Arc<RwLock<Vec<SavedPlan>>>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self {
            plans: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryPlanStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn save_plan(&self, plan: &GeneratedPlan, category: PlanCategory) -> Result<SavedPlan> {
        let saved = SavedPlan {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            category,
            plan: plan.clone(),
        };

        let mut plans = self.plans.write().await;
        plans.insert(0, saved.clone());

        Ok(saved)
    }

    async fn list_plans(&self) -> Result<Vec<SavedPlan>> {
        let plans = self.plans.read().await;
        Ok(plans.clone())
    }

    async fn load_plan(&self, plan_id: Uuid) -> Result<Option<SavedPlan>> {
        let plans = self.plans.read().await;
        Ok(plans.iter().find(|p| p.id == plan_id).cloned())
    }

    async fn delete_plan(&self, plan_id: Uuid) -> Result<bool> {
        let mut plans = self.plans.write().await;
        let before = plans.len();
        plans.retain(|p| p.id != plan_id);
        Ok(plans.len() != before)
    }
}
