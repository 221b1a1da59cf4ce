//! Plan Generation Adapter
//!
//! Request → generator → parse → validate → plan, or the fallback plan.
//! `try_generate` reports failures; `generate_or_fallback` funnels them into
//! the fallback and the outcome says which path ran.

use super::PlanGenerator;
use crate::error::CoachError;
use crate::fallback::synthesize_fallback;
use crate::models::{FallbackReason, GeneratedPlan, GenerationOutcome, PlanRequest};
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub struct PlanGenerationAdapter {
    generator: Arc<dyn PlanGenerator>,
}

impl PlanGenerationAdapter {
    pub fn new(generator: Arc<dyn PlanGenerator>) -> Self {
        Self { generator }
    }

    /// Generate and validate a plan, returning the failure instead of a fallback
    pub async fn try_generate(&self, request: &PlanRequest) -> Result<GeneratedPlan> {
        let raw = self.generator.generate_plan(request).await?;
        let plan = parse_plan_response(&raw)?;

        info!(
            goal = %request.goal,
            plan_name = %plan.plan_name,
            days = plan.schedule.len(),
            "Plan generated"
        );
        Ok(plan)
    }

    /// Generate a plan, falling back on `fallback_goal` when the service fails
    pub async fn generate_or_fallback(
        &self,
        request: &PlanRequest,
        fallback_goal: &str,
    ) -> (GeneratedPlan, GenerationOutcome) {
        match self.try_generate(request).await {
            Ok(plan) => (plan, GenerationOutcome::Success),
            Err(e) => {
                let reason = match &e {
                    CoachError::InvalidPlan(_) => FallbackReason::Validation,
                    CoachError::SerializationError(_) => FallbackReason::Parse,
                    _ => FallbackReason::Transport,
                };
                fallback(fallback_goal, reason, &e)
            }
        }
    }
}

fn fallback(
    goal: &str,
    reason: FallbackReason,
    cause: &CoachError,
) -> (GeneratedPlan, GenerationOutcome) {
    warn!(goal, %reason, error = %cause, "Plan generation failed, using fallback plan");
    (synthesize_fallback(goal), GenerationOutcome::FallbackUsed(reason))
}

/// Parse a plan response, tolerating a markdown code fence around the JSON
pub fn parse_plan_response(response: &str) -> Result<GeneratedPlan> {
    let cleaned = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let plan: GeneratedPlan = serde_json::from_str(cleaned)?;

    if !plan.is_valid() {
        return Err(CoachError::InvalidPlan("planName is missing or empty".to_string()));
    }

    Ok(plan)
}
