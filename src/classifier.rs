//! Intent Router
//!
//! Classifies a fresh user message (no collection in progress) as:
//! - Collect: start the profile questions for a goal ("I want to lose weight")
//! - QuickWorkout: one-shot workout plan, no questions ("give me a routine")
//! - Advice: anything else, answered by the open-ended advisor

use crate::models::CollectionGoal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Collect(CollectionGoal),
    QuickWorkout,
    Advice,
}

/// One row of the routing table
#[derive(Debug)]
pub struct Route {
    pub intent: Intent,
    pub keywords: &'static [&'static str],
}

/// Evaluated top to bottom, first match wins
const ROUTES: &[Route] = &[
    Route {
        intent: Intent::Collect(CollectionGoal::WeightGain),
        keywords: &["weight gain", "gain weight", "bulk", "muscle mass"],
    },
    Route {
        intent: Intent::Collect(CollectionGoal::PcodManagement),
        keywords: &["pcod", "pcos"],
    },
    Route {
        intent: Intent::Collect(CollectionGoal::WeightLoss),
        keywords: &["weight loss", "lose weight", "fat loss"],
    },
    Route {
        intent: Intent::QuickWorkout,
        keywords: &["workout", "routine", "exercise"],
    },
];

/// Intent router
pub struct IntentRouter;

impl IntentRouter {
    /// Route user text to an intent
    pub fn route(text: &str) -> Intent {
        let lowered = text.to_lowercase();

        ROUTES
            .iter()
            .find(|route| route.keywords.iter().any(|kw| lowered.contains(kw)))
            .map(|route| route.intent)
            .unwrap_or(Intent::Advice)
    }

    pub fn routes() -> &'static [Route] {
        ROUTES
    }
}

/// Opening message for a goal's collection; also asks the first question
pub fn acknowledgment(goal: CollectionGoal) -> &'static str {
    match goal {
        CollectionGoal::WeightGain => {
            "I can help you build a solid weight gain plan! To tailor it to your needs, I need to know a bit about you. First, how old are you?"
        }
        CollectionGoal::PcodManagement => {
            "Managing PCOD through diet and lifestyle is a great step. Let's gather your details to create a safe and effective plan. First, what is your age?"
        }
        CollectionGoal::WeightLoss => {
            "I can definitely help you with a weight loss plan! To make it safe and effective, I need a few details. First, how old are you?"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_triggers() {
        let cases = vec![
            ("I want to gain weight", Intent::Collect(CollectionGoal::WeightGain)),
            ("help me BULK up", Intent::Collect(CollectionGoal::WeightGain)),
            ("PCOD Diet Plan", Intent::Collect(CollectionGoal::PcodManagement)),
            ("I have pcos", Intent::Collect(CollectionGoal::PcodManagement)),
            ("I want to lose weight", Intent::Collect(CollectionGoal::WeightLoss)),
            ("fat loss tips", Intent::Collect(CollectionGoal::WeightLoss)),
        ];

        for (text, expected) in cases {
            assert_eq!(IntentRouter::route(text), expected, "input: {}", text);
        }
    }

    #[test]
    fn test_quick_workout() {
        assert_eq!(IntentRouter::route("Build Muscle Workout"), Intent::QuickWorkout);
        assert_eq!(IntentRouter::route("any good exercise?"), Intent::QuickWorkout);
    }

    #[test]
    fn test_fallthrough_to_advice() {
        assert_eq!(IntentRouter::route("hi"), Intent::Advice);
        assert_eq!(IntentRouter::route("how much water should I drink?"), Intent::Advice);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            IntentRouter::route("weight loss workout routine"),
            Intent::Collect(CollectionGoal::WeightLoss)
        );
        assert_eq!(
            IntentRouter::route("bulk diet for pcos"),
            Intent::Collect(CollectionGoal::WeightGain)
        );
        assert_eq!(
            IntentRouter::route("pcod and weight loss"),
            Intent::Collect(CollectionGoal::PcodManagement)
        );

        let order: Vec<Intent> = IntentRouter::routes().iter().map(|r| r.intent).collect();
        assert_eq!(
            order,
            vec![
                Intent::Collect(CollectionGoal::WeightGain),
                Intent::Collect(CollectionGoal::PcodManagement),
                Intent::Collect(CollectionGoal::WeightLoss),
                Intent::QuickWorkout,
            ]
        );
    }
}
