//! Open-ended advice
//!
//! Messages that match no routing rule go to the advisor together with the
//! whole conversation log. Failures are not retried; the session replaces
//! them with `TROUBLE_CONNECTING`.

use crate::gemini::{Content, GeminiClient, GenerateOptions};
use crate::models::{ConversationTurn, TurnRole};
use crate::Result;
use async_trait::async_trait;
use tracing::info;

pub const TROUBLE_CONNECTING: &str = "I'm having trouble connecting right now. Please try again.";

pub const DEFAULT_ADVICE_TEMPERATURE: f32 = 0.7;

const SYSTEM_INSTRUCTION: &str = r#"You are "FitCoach", an expert AI fitness and nutrition assistant within the 'FitSpot' app.
Your goal is to help users find the right workouts, understand gym equipment, and stay motivated.

Keep your answers concise, encouraging, and action-oriented. Use emojis occasionally.
If asked about specific studios, suggest looking at the verified studios in the list."#;

/// Trait for the advice collaborator
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Answer the latest user turn given the ordered log
    async fn advise(&self, log: &[ConversationTurn]) -> Result<String>;
}

pub struct GeminiAdvisor {
    client: GeminiClient,
    temperature: f32,
}

impl GeminiAdvisor {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            temperature: DEFAULT_ADVICE_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Advisor for GeminiAdvisor {
    async fn advise(&self, log: &[ConversationTurn]) -> Result<String> {
        let contents = to_contents(log);
        info!(turns = contents.len(), "Requesting fitness advice");

        self.client
            .generate(
                contents,
                GenerateOptions {
                    system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
                    temperature: self.temperature,
                    ..Default::default()
                },
            )
            .await
    }
}

/// Map the log to Gemini contents. Gemini wants the first content to come
/// from the user, so the welcome message and other leading assistant turns
/// are dropped.
fn to_contents(log: &[ConversationTurn]) -> Vec<Content> {
    log.iter()
        .skip_while(|turn| turn.role != TurnRole::User)
        .map(|turn| match turn.role {
            TurnRole::User => Content::user(turn.text.clone()),
            TurnRole::Assistant => Content::model(turn.text.clone()),
        })
        .collect()
}

/// Mock advisor for development & testing
pub struct MockAdvisor {
    reply: Option<String>,
}

impl MockAdvisor {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
        }
    }

    pub fn unavailable() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl Advisor for MockAdvisor {
    async fn advise(&self, _log: &[ConversationTurn]) -> Result<String> {
        self.reply.clone().ok_or_else(|| {
            crate::error::CoachError::LlmError("advisor unavailable".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_start_with_user_turn() {
        let log = vec![
            ConversationTurn::assistant("Welcome!"),
            ConversationTurn::user("Is creatine safe?"),
            ConversationTurn::assistant("Generally, yes."),
            ConversationTurn::user("How much?"),
        ];

        let contents = to_contents(&log);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert_eq!(contents[2].parts[0].text, "How much?");
    }

    #[tokio::test]
    async fn test_gemini_advisor_without_key_fails() {
        let advisor = GeminiAdvisor::new(GeminiClient::new(String::new()).unwrap());
        let result = advisor.advise(&[ConversationTurn::user("hi")]).await;

        tokio_test::assert_err!(result);
    }

    #[tokio::test]
    async fn test_mock_advisor() {
        let reply = MockAdvisor::replying("Drink water").advise(&[]).await;
        assert_eq!(tokio_test::assert_ok!(reply), "Drink water");

        tokio_test::assert_err!(MockAdvisor::unavailable().advise(&[]).await);
    }
}
