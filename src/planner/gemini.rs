//! Gemini-powered plan generator
//!
//! Asks Gemini for a JSON plan constrained by a fixed response schema

use crate::gemini::{Content, GeminiClient, GenerateOptions};
use crate::models::PlanRequest;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub const DEFAULT_PLAN_TEMPERATURE: f32 = 0.7;

pub struct GeminiPlanGenerator {
    client: GeminiClient,
    temperature: f32,
}

impl GeminiPlanGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            temperature: DEFAULT_PLAN_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl crate::planner::PlanGenerator for GeminiPlanGenerator {
    async fn generate_plan(&self, request: &PlanRequest) -> Result<String> {
        let prompt = build_prompt(request);

        self.client
            .generate(
                vec![Content::user(prompt)],
                GenerateOptions {
                    system_instruction: None,
                    temperature: self.temperature,
                    response_mime_type: Some("application/json".to_string()),
                    response_schema: Some(plan_response_schema()),
                },
            )
            .await
    }
}

/// Build the natural-language prompt; profile lines only appear when known
pub fn build_prompt(request: &PlanRequest) -> String {
    let mut details = format!(
        "\n- Goal: {}\n- Level: {}\n- Equipment: {}\n- Days/Week: {}\n- Diet: {}",
        request.goal,
        request.level,
        request.equipment,
        request.days_per_week,
        request.dietary_restrictions,
    );

    let optional = [
        ("Age", &request.age),
        ("Height", &request.height),
        ("Current Weight", &request.current_weight),
        ("Target Weight", &request.target_weight),
        ("Medical Conditions/Allergies", &request.medical_conditions),
    ];

    for (label, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            details.push_str(&format!("\n- {}: {}", label, value));
        }
    }

    format!(
        r#"Create a comprehensive fitness and nutrition plan for a user with these details:{}

Generate the response strictly in JSON format matching the schema provided.
Ensure the nutrition plan and advice specifically addresses their weight/medical constraints if provided."#,
        details
    )
}

/// Output schema matching `GeneratedPlan`
pub fn plan_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "planName": { "type": "STRING", "description": "A catchy title for the plan" },
            "overview": { "type": "STRING", "description": "A 2-sentence motivating summary" },
            "schedule": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "day": { "type": "STRING", "description": "e.g., Day 1, Day 2" },
                        "focus": { "type": "STRING", "description": "e.g., Chest & Triceps, Rest, Cardio" },
                        "exercises": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "name": { "type": "STRING" },
                                    "sets": { "type": "STRING" },
                                    "reps": { "type": "STRING" }
                                }
                            }
                        }
                    }
                }
            },
            "nutrition": {
                "type": "OBJECT",
                "properties": {
                    "dailyCalories": { "type": "STRING" },
                    "macros": { "type": "STRING", "description": "e.g. 40% Carb / 30% Protein / 30% Fat" },
                    "mealPlan": {
                        "type": "ARRAY",
                        "items": { "type": "STRING", "description": "Example meal name" }
                    }
                }
            },
            "tips": { "type": "ARRAY", "items": { "type": "STRING" } }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CollectionGoal, FallbackReason, GenerationOutcome, UserProfileDraft,
    };
    use crate::planner::PlanGenerationAdapter;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use std::sync::Arc;

    /// Serve `router` on a local port and return the generate URL
    async fn local_endpoint(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{}/generate", addr)
    }

    fn adapter_for(url: String) -> PlanGenerationAdapter {
        let client = GeminiClient::new("test-key".to_string())
            .unwrap()
            .with_base_url(url);
        PlanGenerationAdapter::new(Arc::new(GeminiPlanGenerator::new(client)))
    }

    #[test]
    fn test_quick_workout_prompt_has_no_profile_lines() {
        let prompt = build_prompt(&PlanRequest::quick_workout());

        assert!(prompt.contains("- Goal: General Fitness"));
        assert!(prompt.contains("- Equipment: Full Gym"));
        assert!(prompt.contains("- Days/Week: 4"));
        assert!(!prompt.contains("Age:"));
    }

    #[test]
    fn test_profile_prompt_includes_collected_fields() {
        let draft = UserProfileDraft {
            goal: Some(CollectionGoal::PcodManagement),
            age: Some("31".to_string()),
            height: Some("5'4\"".to_string()),
            current_weight: Some("70kg".to_string()),
            target_weight: Some("62kg".to_string()),
            medical_conditions: Some("PCOD".to_string()),
        };
        let prompt = build_prompt(&PlanRequest::from_profile(CollectionGoal::PcodManagement, &draft));

        assert!(prompt.contains("- Goal: PCOD Management"));
        assert!(prompt.contains("- Height: 5'4\""));
        assert!(prompt.contains("- Medical Conditions/Allergies: PCOD"));
        assert!(prompt.contains("- Days/Week: 7"));
    }

    #[test]
    fn test_schema_matches_plan_fields() {
        let schema = plan_response_schema();
        let props = &schema["properties"];

        for field in ["planName", "overview", "schedule", "nutrition", "tips"] {
            assert!(props.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(props["nutrition"]["properties"]["mealPlan"]["type"], "ARRAY");
    }

    #[tokio::test]
    async fn test_service_error_status_falls_back() {
        let router = Router::new().route(
            "/generate",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model overloaded") }),
        );
        let adapter = adapter_for(local_endpoint(router).await);

        let request = PlanRequest::quick_workout();
        let (plan, outcome) = adapter.generate_or_fallback(&request, "General Workout").await;

        assert_eq!(outcome, GenerationOutcome::FallbackUsed(FallbackReason::Transport));
        assert_eq!(plan.plan_name, "General Workout Routine");
    }

    #[tokio::test]
    async fn test_structured_response_is_parsed() {
        let router = Router::new().route(
            "/generate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(
                    body["generation_config"]["response_mime_type"],
                    "application/json"
                );
                Json(json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [{ "text": "{\"planName\": \"Gym Starter\", \"tips\": [\"Warm up\"]}" }]
                        }
                    }]
                }))
            }),
        );
        let adapter = adapter_for(local_endpoint(router).await);

        let plan = adapter.try_generate(&PlanRequest::quick_workout()).await.unwrap();
        assert_eq!(plan.plan_name, "Gym Starter");
        assert_eq!(plan.tips, vec!["Warm up".to_string()]);
    }
}
