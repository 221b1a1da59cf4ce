//! FitCoach Plan Builder
//!
//! A conversational fitness coach that:
//! - Routes free text to a guided profile interview, a quick workout, or open advice
//! - Collects a short profile one question at a time
//! - Generates a structured plan through Gemini
//! - Always attaches a plan, falling back to a deterministic one offline
//! - Saves plans on explicit request
//!
//! SESSION LOOP:
//! USER TEXT → ROUTE / COLLECT → (ADVISE | GENERATE → FALLBACK?) → ASSISTANT TURN

pub mod agent;
pub mod api;
pub mod classifier;
pub mod collector;
pub mod config;
pub mod conversational;
pub mod error;
pub mod fallback;
pub mod gemini;
pub mod memory;
pub mod models;
pub mod planner;
pub mod state;

pub use error::Result;

// Re-export common types
pub use agent::{CoachServices, CoachSession};
pub use classifier::{Intent, IntentRouter};
pub use fallback::synthesize_fallback;
pub use models::*;
