//! Turn-sequenced profile collector
//!
//! `SessionState` is an immutable value: every user message produces a
//! `Transition` holding the replacement state and the effect the session
//! must carry out. No I/O happens here.

use crate::classifier::{acknowledgment, Intent, IntentRouter};
use crate::models::{CollectionGoal, CollectionState, PlanRequest, UserProfileDraft};
use serde::Serialize;
use tracing::{debug, warn};

const HEIGHT_PROMPT: &str = "Got it. What is your height? (e.g., 5'9\" or 175cm)";
const CURRENT_WEIGHT_PROMPT: &str = "Thanks. What is your current weight?";
const TARGET_WEIGHT_PROMPT: &str = "And what is your target weight goal?";
const MEDICAL_PROMPT: &str = "Almost done! Do you have any allergies or medical conditions I should know about? (e.g., Gluten free, Diabetes, or 'None')";

const QUICK_WORKOUT_REPLY: &str =
    "I've designed a workout routine for you. Check out the details below!";
const QUICK_WORKOUT_FALLBACK_GOAL: &str = "General Workout";

/// What the session must do after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append an assistant turn, nothing else
    Reply(String),
    /// Call the plan adapter and append `reply` with the plan attached
    GeneratePlan(GenerationJob),
    /// Ask the open-ended advisor
    Advise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    /// Appended before the (slow) generation call
    pub acknowledgment: Option<String>,
    pub request: PlanRequest,
    pub fallback_goal: String,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effect: Effect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    collection: CollectionState,
    draft: UserProfileDraft,
}

impl SessionState {
    pub fn collection(&self) -> CollectionState {
        self.collection
    }

    pub fn draft(&self) -> &UserProfileDraft {
        &self.draft
    }

    /// Consume one user message
    pub fn advance(&self, text: &str) -> Transition {
        if self.collection.is_idle() {
            return Self::route(text);
        }
        self.collect(text)
    }

    fn route(text: &str) -> Transition {
        let intent = IntentRouter::route(text);
        debug!(?intent, "Routed user message");

        match intent {
            Intent::Collect(goal) => Transition {
                state: SessionState {
                    collection: CollectionState::AwaitingAge,
                    draft: UserProfileDraft {
                        goal: Some(goal),
                        ..Default::default()
                    },
                },
                effect: Effect::Reply(acknowledgment(goal).to_string()),
            },
            Intent::QuickWorkout => Transition {
                state: SessionState::default(),
                effect: Effect::GeneratePlan(GenerationJob {
                    acknowledgment: None,
                    request: PlanRequest::quick_workout(),
                    fallback_goal: QUICK_WORKOUT_FALLBACK_GOAL.to_string(),
                    reply: QUICK_WORKOUT_REPLY.to_string(),
                }),
            },
            Intent::Advice => Transition {
                state: SessionState::default(),
                effect: Effect::Advise,
            },
        }
    }

    fn collect(&self, text: &str) -> Transition {
        let Some(goal) = self.draft.goal else {
            return self.recover_without_goal(text);
        };

        let mut draft = self.draft.clone();
        let answer = Some(text.to_string());

        let prompt = match self.collection {
            CollectionState::Idle => return Self::route(text),
            CollectionState::AwaitingAge => {
                draft.age = answer;
                HEIGHT_PROMPT
            }
            CollectionState::AwaitingHeight => {
                draft.height = answer;
                CURRENT_WEIGHT_PROMPT
            }
            CollectionState::AwaitingCurrentWeight => {
                draft.current_weight = answer;
                TARGET_WEIGHT_PROMPT
            }
            CollectionState::AwaitingTargetWeight => {
                draft.target_weight = answer;
                MEDICAL_PROMPT
            }
            CollectionState::AwaitingMedicalConditions => {
                draft.medical_conditions = Some(medical_conditions_for(goal, text));
                return Self::complete(goal, &draft);
            }
        };

        let next = self.collection.next();
        debug!(from = ?self.collection, to = ?next, %goal, "Collected profile answer");

        Transition {
            state: SessionState {
                collection: next,
                draft,
            },
            effect: Effect::Reply(prompt.to_string()),
        }
    }

    /// Last answer received: back to idle with an empty draft, generation queued
    fn complete(goal: CollectionGoal, draft: &UserProfileDraft) -> Transition {
        debug!(%goal, "Profile collection complete");

        Transition {
            state: SessionState::default(),
            effect: Effect::GeneratePlan(GenerationJob {
                acknowledgment: Some(format!(
                    "Thank you! I'm generating a personalized {} plan for you now...",
                    goal
                )),
                request: PlanRequest::from_profile(goal, draft),
                fallback_goal: goal.label().to_string(),
                reply: format!("Here is your personalized plan focusing on {}.", goal),
            }),
        }
    }

    /// A collecting state without a goal cannot be produced by `advance`.
    /// Debug builds stop here; release builds start over from idle.
    fn recover_without_goal(&self, text: &str) -> Transition {
        debug_assert!(
            false,
            "collector in {:?} without an active goal",
            self.collection
        );
        warn!(state = ?self.collection, "Collector has no active goal, resetting to idle");
        Self::route(text)
    }

    #[cfg(test)]
    pub(crate) fn collecting_without_goal(collection: CollectionState) -> Self {
        Self {
            collection,
            draft: UserProfileDraft::default(),
        }
    }
}

/// PCOD collections always carry the condition into the request
fn medical_conditions_for(goal: CollectionGoal, answer: &str) -> String {
    if goal != CollectionGoal::PcodManagement {
        return answer.to_string();
    }

    let lowered = answer.to_lowercase();
    if lowered.contains("pcod") || lowered.contains("pcos") {
        answer.to_string()
    } else if lowered == "none" {
        "PCOD".to_string()
    } else {
        format!("{}, PCOD", answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(state: &SessionState, text: &str) -> Transition {
        state.advance(text)
    }

    fn collect_all(start: &str, answers: &[&str]) -> (Vec<CollectionState>, Transition) {
        let mut transition = run(&SessionState::default(), start);
        let mut visited = vec![CollectionState::Idle, transition.state.collection()];

        for answer in answers {
            transition = run(&transition.state, answer);
            visited.push(transition.state.collection());
        }
        (visited, transition)
    }

    fn job(effect: &Effect) -> &GenerationJob {
        match effect {
            Effect::GeneratePlan(job) => job,
            other => panic!("expected generation, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_sequence() {
        let (visited, last) =
            collect_all("I want to lose weight", &["29", "5'6\"", "160 lbs", "140 lbs", "none"]);

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
        assert_eq!(last.state, SessionState::default());

        let job = job(&last.effect);
        assert_eq!(job.request.goal, "Weight Loss");
        assert_eq!(job.request.age.as_deref(), Some("29"));
        assert_eq!(job.request.height.as_deref(), Some("5'6\""));
        assert_eq!(job.request.current_weight.as_deref(), Some("160 lbs"));
        assert_eq!(job.request.target_weight.as_deref(), Some("140 lbs"));
        assert_eq!(job.request.medical_conditions.as_deref(), Some("none"));
        assert_eq!(job.request.days_per_week, 7);
        assert_eq!(job.fallback_goal, "Weight Loss");
        assert_eq!(
            job.acknowledgment.as_deref(),
            Some("Thank you! I'm generating a personalized Weight Loss plan for you now...")
        );
    }

    #[test]
    fn test_prompts_follow_each_answer() {
        let start = run(&SessionState::default(), "weight gain plan");
        assert!(matches!(&start.effect, Effect::Reply(text) if text.contains("how old are you")));

        let after_age = run(&start.state, "22");
        assert_eq!(after_age.effect, Effect::Reply(HEIGHT_PROMPT.to_string()));

        let after_height = run(&after_age.state, "180cm");
        assert_eq!(after_height.effect, Effect::Reply(CURRENT_WEIGHT_PROMPT.to_string()));
        assert_eq!(after_height.state.draft().height.as_deref(), Some("180cm"));
    }

    #[test]
    fn test_answers_are_stored_verbatim() {
        let start = run(&SessionState::default(), "bulk");
        let next = run(&start.state, "  twenty-two, I think ");
        assert_eq!(next.state.draft().age.as_deref(), Some("  twenty-two, I think "));
    }

    #[test]
    fn test_off_topic_answer_is_consumed() {
        let start = run(&SessionState::default(), "I want to lose weight");
        let next = run(&start.state, "actually, give me a workout routine");

        assert_eq!(next.state.collection(), CollectionState::AwaitingHeight);
        assert_eq!(
            next.state.draft().age.as_deref(),
            Some("actually, give me a workout routine")
        );
    }

    #[test]
    fn test_pcod_injection() {
        let answers = ["29", "5'4\"", "70kg", "62kg"];
        let cases = vec![
            ("none", "PCOD"),
            ("NONE", "PCOD"),
            (" none", " none, PCOD"),
            ("Diabetes", "Diabetes, PCOD"),
            ("pcos and thyroid", "pcos and thyroid"),
            ("PCOD", "PCOD"),
        ];

        for (medical, expected) in cases {
            let mut all = answers.to_vec();
            all.push(medical);
            let (_, last) = collect_all("PCOD diet plan", &all);
            assert_eq!(
                job(&last.effect).request.medical_conditions.as_deref(),
                Some(expected),
                "answer: {}",
                medical
            );
        }
    }

    #[test]
    fn test_no_injection_for_other_goals() {
        let (_, last) = collect_all("gain weight", &["30", "6ft", "60kg", "70kg", "Diabetes"]);
        assert_eq!(
            job(&last.effect).request.medical_conditions.as_deref(),
            Some("Diabetes")
        );
    }

    #[test]
    fn test_quick_workout_skips_collection() {
        let transition = run(&SessionState::default(), "Build Muscle Workout");

        assert_eq!(transition.state, SessionState::default());
        let job = job(&transition.effect);
        assert_eq!(job.request, PlanRequest::quick_workout());
        assert_eq!(job.fallback_goal, "General Workout");
        assert!(job.acknowledgment.is_none());
    }

    #[test]
    fn test_unmatched_text_asks_advisor() {
        let transition = run(&SessionState::default(), "is creatine safe?");
        assert_eq!(transition.effect, Effect::Advise);
        assert!(transition.state.collection().is_idle());
    }

    #[test]
    fn test_router_bypassed_while_collecting() {
        let start = run(&SessionState::default(), "I want to lose weight");
        let next = run(&start.state, "pcod");

        assert_eq!(next.state.draft().goal, Some(CollectionGoal::WeightLoss));
        assert_eq!(next.state.draft().age.as_deref(), Some("pcod"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "without an active goal")]
    fn test_missing_goal_fails_fast_in_debug() {
        let broken = SessionState::collecting_without_goal(CollectionState::AwaitingHeight);
        broken.advance("170cm");
    }
}
