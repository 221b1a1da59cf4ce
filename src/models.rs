//! Core data models for the coach conversation and generated plans

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Goal categories that start a profile collection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CollectionGoal {
    #[serde(rename = "Weight Gain")]
    WeightGain,
    #[serde(rename = "PCOD Management")]
    PcodManagement,
    #[serde(rename = "Weight Loss")]
    WeightLoss,
}

impl CollectionGoal {
    pub fn label(&self) -> &'static str {
        match self {
            CollectionGoal::WeightGain => "Weight Gain",
            CollectionGoal::PcodManagement => "PCOD Management",
            CollectionGoal::WeightLoss => "Weight Loss",
        }
    }
}

/// Where the profile collector is in its question sequence
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollectionState {
    #[default]
    Idle,
    AwaitingAge,
    AwaitingHeight,
    AwaitingCurrentWeight,
    AwaitingTargetWeight,
    AwaitingMedicalConditions,
}

impl CollectionState {
    /// Next state in the linear sequence; the last question wraps to `Idle`
    pub fn next(self) -> Self {
        match self {
            CollectionState::Idle => CollectionState::AwaitingAge,
            CollectionState::AwaitingAge => CollectionState::AwaitingHeight,
            CollectionState::AwaitingHeight => CollectionState::AwaitingCurrentWeight,
            CollectionState::AwaitingCurrentWeight => CollectionState::AwaitingTargetWeight,
            CollectionState::AwaitingTargetWeight => CollectionState::AwaitingMedicalConditions,
            CollectionState::AwaitingMedicalConditions => CollectionState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == CollectionState::Idle
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanCategory {
    Workout,
    Diet,
    Comprehensive,
}

//
// ================= Conversation =================
//

/// One message in the conversation log. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<GeneratedPlan>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text.into(), None)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text.into(), None)
    }

    pub fn assistant_with_plan(text: impl Into<String>, plan: GeneratedPlan) -> Self {
        Self::new(TurnRole::Assistant, text.into(), Some(plan))
    }

    fn new(role: TurnRole, text: String, plan: Option<GeneratedPlan>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            timestamp: Utc::now(),
            plan,
        }
    }
}

//
// ================= Profile =================
//

/// Profile fields gathered one per turn. Values are kept exactly as typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDraft {
    pub goal: Option<CollectionGoal>,
    pub age: Option<String>,
    pub height: Option<String>,
    pub current_weight: Option<String>,
    pub target_weight: Option<String>,
    pub medical_conditions: Option<String>,
}

//
// ================= Plan Request =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub goal: String,
    pub level: String,
    pub equipment: String,
    pub dietary_restrictions: String,
    pub days_per_week: u8,
    pub age: Option<String>,
    pub height: Option<String>,
    pub current_weight: Option<String>,
    pub target_weight: Option<String>,
    pub medical_conditions: Option<String>,
}

impl PlanRequest {
    /// One-shot request used when the user just asks for a workout
    pub fn quick_workout() -> Self {
        Self {
            goal: "General Fitness".to_string(),
            level: "Intermediate".to_string(),
            equipment: "Full Gym".to_string(),
            dietary_restrictions: "None".to_string(),
            days_per_week: 4,
            age: None,
            height: None,
            current_weight: None,
            target_weight: None,
            medical_conditions: None,
        }
    }

    /// Request built from a completed collection
    pub fn from_profile(goal: CollectionGoal, profile: &UserProfileDraft) -> Self {
        Self {
            goal: goal.label().to_string(),
            level: "Intermediate".to_string(),
            equipment: "None".to_string(),
            dietary_restrictions: "None".to_string(),
            days_per_week: 7,
            age: profile.age.clone(),
            height: profile.height.clone(),
            current_weight: profile.current_weight.clone(),
            target_weight: profile.target_weight.clone(),
            medical_conditions: profile.medical_conditions.clone(),
        }
    }
}

//
// ================= Generated Plan =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedPlan {
    pub plan_name: String,
    pub overview: String,
    pub schedule: Vec<PlanDay>,
    pub nutrition: PlanNutrition,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlanDay {
    pub day: String,
    pub focus: String,
    pub exercises: Vec<PlanExercise>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlanExercise {
    pub name: String,
    pub sets: String,
    pub reps: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanNutrition {
    pub daily_calories: String,
    pub macros: String,
    pub meal_plan: Vec<String>,
}

impl GeneratedPlan {
    /// A plan is accepted only when it carries a name
    pub fn is_valid(&self) -> bool {
        !self.plan_name.is_empty()
    }

    pub fn suggested_category(&self) -> PlanCategory {
        match (self.schedule.is_empty(), self.nutrition.meal_plan.is_empty()) {
            (false, false) => PlanCategory::Comprehensive,
            (false, true) => PlanCategory::Workout,
            _ => PlanCategory::Diet,
        }
    }
}

/// A plan persisted on explicit user request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub category: PlanCategory,
    #[serde(flatten)]
    pub plan: GeneratedPlan,
}

//
// ================= Generation Outcome =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FallbackReason {
    Transport,
    Parse,
    Validation,
}

/// Side channel describing how a plan was obtained
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Success,
    FallbackUsed(FallbackReason),
}

impl GenerationOutcome {
    pub fn used_fallback(&self) -> bool {
        matches!(self, GenerationOutcome::FallbackUsed(_))
    }
}

impl fmt::Display for CollectionGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl fmt::Display for PlanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlanCategory::Workout => "workout",
            PlanCategory::Diet => "diet",
            PlanCategory::Comprehensive => "comprehensive",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FallbackReason::Transport => "transport",
            FallbackReason::Parse => "parse",
            FallbackReason::Validation => "validation",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_state_sequence() {
        let mut state = CollectionState::Idle;
        let mut visited = vec![state];
        for _ in 0..6 {
            state = state.next();
            visited.push(state);
        }

        assert_eq!(
            visited,
            vec![
                CollectionState::Idle,
                CollectionState::AwaitingAge,
                CollectionState::AwaitingHeight,
                CollectionState::AwaitingCurrentWeight,
                CollectionState::AwaitingTargetWeight,
                CollectionState::AwaitingMedicalConditions,
                CollectionState::Idle,
            ]
        );
    }

    #[test]
    fn test_plan_parses_camel_case_fields() {
        let json = r#"{
            "planName": "Lean Start",
            "overview": "Two sentences.",
            "schedule": [{"day": "Day 1", "focus": "Legs", "exercises": [{"name": "Squats", "sets": "3", "reps": "10"}]}],
            "nutrition": {"dailyCalories": "2000 kcal", "macros": "40/30/30", "mealPlan": ["Oats"]},
            "tips": ["Sleep"]
        }"#;

        let plan: GeneratedPlan = serde_json::from_str(json).unwrap();
        assert!(plan.is_valid());
        assert_eq!(plan.schedule[0].exercises[0].reps, "10");
        assert_eq!(plan.nutrition.meal_plan, vec!["Oats".to_string()]);
        assert_eq!(plan.suggested_category(), PlanCategory::Comprehensive);
    }

    #[test]
    fn test_missing_plan_name_is_invalid() {
        let plan: GeneratedPlan = serde_json::from_str(r#"{"overview": "x"}"#).unwrap();
        assert!(!plan.is_valid());
    }

    #[test]
    fn test_suggested_category() {
        let mut plan = GeneratedPlan {
            plan_name: "Plan".to_string(),
            ..Default::default()
        };
        assert_eq!(plan.suggested_category(), PlanCategory::Diet);

        plan.schedule.push(PlanDay::default());
        assert_eq!(plan.suggested_category(), PlanCategory::Workout);
    }

    #[test]
    fn test_saved_plan_flattens_plan_fields() {
        let saved = SavedPlan {
            id: Uuid::nil(),
            created_at: Utc::now(),
            category: PlanCategory::Diet,
            plan: GeneratedPlan {
                plan_name: "Kickstart".to_string(),
                ..Default::default()
            },
        };

        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["planName"], "Kickstart");
        assert_eq!(value["category"], "diet");
    }
}
