//! Offline plan synthesis
//!
//! Used whenever the plan service cannot be reached or trusted.
//! Pure: the same goal label always yields the same plan.

use crate::models::{GeneratedPlan, PlanDay, PlanExercise, PlanNutrition};

const NUTRITION_MARKERS: &[&str] = &["diet", "weight", "pcod", "loss"];

/// Build the fallback plan for a goal label
pub fn synthesize_fallback(goal: &str) -> GeneratedPlan {
    let lowered = goal.to_lowercase();

    if NUTRITION_MARKERS.iter().any(|m| lowered.contains(m)) {
        nutrition_plan(goal, &lowered)
    } else {
        workout_plan(goal, &lowered)
    }
}

fn nutrition_plan(goal: &str, lowered: &str) -> GeneratedPlan {
    GeneratedPlan {
        plan_name: format!("{} Kickstart", goal),
        overview: format!(
            "A balanced 7-day approach to {} tailored for your profile. Focuses on nutrient-dense foods to manage energy levels.",
            lowered
        ),
        schedule: vec![],
        nutrition: PlanNutrition {
            daily_calories: "1800 - 2000 kcal".to_string(),
            macros: "40% Protein / 30% Carbs / 30% Fat".to_string(),
            meal_plan: strings(&[
                "Breakfast: Oatmeal with protein powder & berries",
                "Lunch: Grilled chicken breast with quinoa salad",
                "Dinner: Baked salmon with roasted vegetables",
                "Snack: Greek yogurt with almonds",
            ]),
        },
        tips: strings(&["Stay hydrated", "Prep meals in advance", "Monitor portion sizes"]),
    }
}

fn workout_plan(goal: &str, lowered: &str) -> GeneratedPlan {
    GeneratedPlan {
        plan_name: format!("{} Routine", goal),
        overview: format!(
            "A comprehensive workout plan designed to help you with {}.",
            lowered
        ),
        schedule: vec![
            day(
                "Day 1",
                "Full Body Strength",
                vec![exercise("Squats", "3", "10"), exercise("Pushups", "3", "12")],
            ),
            day("Day 2", "Active Recovery", vec![]),
            day(
                "Day 3",
                "Upper Body Focus",
                vec![exercise("Dumbbell Press", "3", "10"), exercise("Rows", "3", "10")],
            ),
        ],
        nutrition: PlanNutrition {
            daily_calories: "2200 kcal".to_string(),
            macros: "30% P / 40% C / 30% F".to_string(),
            meal_plan: vec![],
        },
        tips: strings(&[
            "Focus on form over weight",
            "Increase intensity progressively",
            "Rest is key for growth",
        ]),
    }
}

fn day(day: &str, focus: &str, exercises: Vec<PlanExercise>) -> PlanDay {
    PlanDay {
        day: day.to_string(),
        focus: focus.to_string(),
        exercises,
    }
}

fn exercise(name: &str, sets: &str, reps: &str) -> PlanExercise {
    PlanExercise {
        name: name.to_string(),
        sets: sets.to_string(),
        reps: reps.to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = serde_json::to_string(&synthesize_fallback("Weight Loss")).unwrap();
        let b = serde_json::to_string(&synthesize_fallback("Weight Loss")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_classification_boundary() {
        let diet = synthesize_fallback("Keto Diet");
        assert!(diet.schedule.is_empty());
        assert!(!diet.nutrition.meal_plan.is_empty());

        let muscle = synthesize_fallback("Build Muscle");
        assert!(!muscle.schedule.is_empty());
        assert!(muscle.nutrition.meal_plan.is_empty());
    }

    #[test]
    fn test_nutrition_plan_content() {
        let plan = synthesize_fallback("PCOD Management");
        assert_eq!(plan.plan_name, "PCOD Management Kickstart");
        assert!(plan.overview.contains("approach to pcod management tailored"));
        assert_eq!(plan.nutrition.daily_calories, "1800 - 2000 kcal");
        assert_eq!(plan.nutrition.meal_plan.len(), 4);
        assert_eq!(plan.tips.len(), 3);
        assert!(plan.is_valid());
    }

    #[test]
    fn test_workout_plan_content() {
        let plan = synthesize_fallback("General Workout");
        assert_eq!(plan.plan_name, "General Workout Routine");
        assert_eq!(plan.schedule.len(), 3);
        assert_eq!(plan.schedule[1].focus, "Active Recovery");
        assert!(plan.schedule[1].exercises.is_empty());
        assert_eq!(plan.schedule[0].exercises[1].reps, "12");
        assert_eq!(plan.nutrition.daily_calories, "2200 kcal");
        assert_eq!(plan.tips.len(), 3);
    }
}
