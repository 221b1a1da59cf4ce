//! Plan generation
//!
//! A `PlanGenerator` is the external structured-plan service: request in,
//! raw JSON text out. The `PlanGenerationAdapter` wraps one; in chat, bad or
//! missing output is replaced by the offline fallback plan.

use crate::models::PlanRequest;
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

pub mod adapter;
pub mod gemini;
pub use adapter::{parse_plan_response, PlanGenerationAdapter};
pub use gemini::GeminiPlanGenerator;

/// Trait for the structured-plan service
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Return the raw response body, expected to be a JSON plan object
    async fn generate_plan(&self, request: &PlanRequest) -> Result<String>;
}

/// Mock generator for development & testing
/// Replies with a fixed body or a fixed failure, and counts calls
pub struct MockPlanGenerator {
    reply: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl MockPlanGenerator {
    pub fn responding(body: impl Into<String>) -> Self {
        Self {
            reply: Ok(body.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanGenerator for MockPlanGenerator {
    async fn generate_plan(&self, _request: &PlanRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.reply {
            Ok(body) => Ok(body.clone()),
            Err(message) => Err(crate::error::CoachError::LlmError(message.clone())),
        }
    }
}
