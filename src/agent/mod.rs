//! Coach session controller
//!
//! USER TEXT → ROUTE / COLLECT → (ADVISE | GENERATE) → ASSISTANT TURN
//!
//! Owns the conversation log and the collector state for one conversation.
//! A send holds the session `Busy` until its reply is appended; concurrent
//! sends are rejected instead of interleaving with the in-flight call.
//! Each turn runs on a spawned task, so a caller that gives up early
//! (client disconnect, timeout) never strands a collected profile.

use crate::collector::{Effect, SessionState};
use crate::config::CoachConfig;
use crate::conversational::{Advisor, GeminiAdvisor, TROUBLE_CONNECTING};
use crate::error::CoachError;
use crate::gemini::GeminiClient;
use crate::memory::ConversationLog;
use crate::models::{
    CollectionState, ConversationTurn, GenerationOutcome, PlanCategory, SavedPlan,
};
use crate::planner::{GeminiPlanGenerator, PlanGenerationAdapter};
use crate::state::{InMemoryPlanStore, PlanStore};
use crate::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Collaborators shared by every session
#[derive(Clone)]
pub struct CoachServices {
    pub planner: Arc<PlanGenerationAdapter>,
    pub advisor: Arc<dyn Advisor>,
    pub plan_store: Arc<dyn PlanStore>,
}

impl CoachServices {
    /// Gemini-backed collaborators with an in-memory plan store
    pub fn from_config(config: &CoachConfig) -> Result<Self> {
        let api_key = if config.has_api_key() {
            config.gemini_api_key.clone()
        } else {
            warn!("GEMINI_API_KEY not set: plans will use the offline fallback");
            String::new()
        };

        let plan_client = GeminiClient::with_model(api_key.clone(), &config.gemini_model)?;
        let advice_client = GeminiClient::with_model(api_key, &config.gemini_model)?;

        let generator =
            GeminiPlanGenerator::new(plan_client).with_temperature(config.plan_temperature);
        let advisor =
            GeminiAdvisor::new(advice_client).with_temperature(config.advice_temperature);

        Ok(Self {
            planner: Arc::new(PlanGenerationAdapter::new(Arc::new(generator))),
            advisor: Arc::new(advisor),
            plan_store: Arc::new(InMemoryPlanStore::new()),
        })
    }
}

/// What the rendering surface needs
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub turns: Vec<ConversationTurn>,
    pub awaiting_response: bool,
    pub collection: CollectionState,
}

/// Turns appended by one send, plus how any plan in them was produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendOutcome {
    pub turns: Vec<ConversationTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationOutcome>,
}

struct SessionInner {
    state: SessionState,
    log: ConversationLog,
}

/// Session state reachable from detached turn tasks
struct SessionShared {
    id: Uuid,
    inner: Mutex<SessionInner>,
    busy: AtomicBool,
    view_tx: watch::Sender<SessionView>,
}

pub struct CoachSession {
    shared: Arc<SessionShared>,
    services: CoachServices,
}

impl CoachSession {
    pub fn new(services: CoachServices) -> Self {
        Self::with_id(Uuid::new_v4(), services)
    }

    pub fn with_id(id: Uuid, services: CoachServices) -> Self {
        let log = ConversationLog::with_welcome();
        let (view_tx, _) = watch::channel(SessionView {
            turns: log.turns().to_vec(),
            awaiting_response: false,
            collection: CollectionState::Idle,
        });

        Self {
            shared: Arc::new(SessionShared {
                id,
                inner: Mutex::new(SessionInner {
                    state: SessionState::default(),
                    log,
                }),
                busy: AtomicBool::new(false),
                view_tx,
            }),
            services,
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Receives a new view whenever the log or the awaiting flag changes
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.shared.view_tx.subscribe()
    }

    pub fn view(&self) -> SessionView {
        self.shared.view_tx.borrow().clone()
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.shared.busy.load(Ordering::SeqCst)
    }

    pub async fn collection_state(&self) -> CollectionState {
        self.shared.inner.lock().await.state.collection()
    }

    pub async fn turns(&self) -> Vec<ConversationTurn> {
        self.shared.turns().await
    }

    /// Handle one user message. Blank text is ignored.
    ///
    /// The turn runs on its own task: dropping the returned future does not
    /// cancel it, and the session stays busy until its reply is appended.
    pub async fn send(&self, text: &str) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Ok(SendOutcome::default());
        }

        let busy = BusyGuard::acquire(self.shared.clone())?;
        let shared = self.shared.clone();
        let services = self.services.clone();
        let text = text.to_string();

        let turn = tokio::spawn(async move {
            let _busy = busy;
            shared.run_turn(&services, &text).await
        });

        turn.await.map_err(|e| {
            error!(session_id = %self.shared.id, error = %e, "Turn task failed");
            CoachError::TaskFailed(e.to_string())
        })
    }

    /// Drop any collection in progress (user navigated away). The log is kept.
    pub async fn abandon(&self) {
        let mut inner = self.shared.inner.lock().await;
        if !inner.state.collection().is_idle() {
            info!(session_id = %self.shared.id, state = ?inner.state.collection(), "Collection abandoned");
        }
        inner.state = SessionState::default();
        self.shared.publish(&inner);
    }

    /// Persist the plan attached to `turn_id` on explicit user request
    pub async fn save_plan(
        &self,
        turn_id: Uuid,
        category: Option<PlanCategory>,
    ) -> Result<SavedPlan> {
        let plan = {
            let inner = self.shared.inner.lock().await;
            let turn = inner
                .log
                .find(turn_id)
                .ok_or(CoachError::TurnNotFound(turn_id))?;
            turn.plan.clone().ok_or(CoachError::NoPlanAttached(turn_id))?
        };

        let category = category.unwrap_or_else(|| plan.suggested_category());
        let saved = self.services.plan_store.save_plan(&plan, category).await?;
        info!(session_id = %self.shared.id, plan_id = %saved.id, %category, "Plan saved");

        let mut appended = Vec::new();
        self.shared
            .append(
                ConversationTurn::assistant(format!(
                    "Awesome! I've saved the {} plan to your dashboard.",
                    category
                )),
                &mut appended,
            )
            .await;

        Ok(saved)
    }
}

impl SessionShared {
    async fn turns(&self) -> Vec<ConversationTurn> {
        self.inner.lock().await.log.turns().to_vec()
    }

    async fn run_turn(&self, services: &CoachServices, text: &str) -> SendOutcome {
        let mut appended = Vec::new();

        let effect = {
            let mut inner = self.inner.lock().await;
            let turn = ConversationTurn::user(text);
            appended.push(turn.clone());
            inner.log.push(turn);

            let transition = inner.state.advance(text);
            debug!(
                session_id = %self.id,
                from = ?inner.state.collection(),
                to = ?transition.state.collection(),
                "Session transition"
            );
            inner.state = transition.state;
            self.publish(&inner);
            transition.effect
        };

        let generation = match effect {
            Effect::Reply(reply) => {
                self.append(ConversationTurn::assistant(reply), &mut appended).await;
                None
            }
            Effect::GeneratePlan(job) => {
                if let Some(ack) = job.acknowledgment {
                    self.append(ConversationTurn::assistant(ack), &mut appended).await;
                }

                let (plan, outcome) = services
                    .planner
                    .generate_or_fallback(&job.request, &job.fallback_goal)
                    .await;
                info!(session_id = %self.id, ?outcome, plan_name = %plan.plan_name, "Plan attached");

                self.append(ConversationTurn::assistant_with_plan(job.reply, plan), &mut appended)
                    .await;
                Some(outcome)
            }
            Effect::Advise => {
                let log = self.turns().await;
                let reply = match services.advisor.advise(&log).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(session_id = %self.id, error = %e, "Advisor call failed");
                        TROUBLE_CONNECTING.to_string()
                    }
                };
                self.append(ConversationTurn::assistant(reply), &mut appended).await;
                None
            }
        };

        SendOutcome {
            turns: appended,
            generation,
        }
    }

    async fn append(&self, turn: ConversationTurn, appended: &mut Vec<ConversationTurn>) {
        let mut inner = self.inner.lock().await;
        appended.push(turn.clone());
        inner.log.push(turn);
        self.publish(&inner);
    }

    fn publish(&self, inner: &SessionInner) {
        self.view_tx.send_replace(SessionView {
            turns: inner.log.turns().to_vec(),
            awaiting_response: self.busy.load(Ordering::SeqCst),
            collection: inner.state.collection(),
        });
    }
}

/// Marks the session busy until the turn that acquired it finishes
struct BusyGuard {
    shared: Arc<SessionShared>,
}

impl BusyGuard {
    fn acquire(shared: Arc<SessionShared>) -> Result<Self> {
        if shared
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(session_id = %shared.id, "Rejected message while busy");
            return Err(CoachError::SessionBusy);
        }

        shared.view_tx.send_modify(|view| view.awaiting_response = true);
        Ok(Self { shared })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.shared.busy.store(false, Ordering::SeqCst);
        self.shared
            .view_tx
            .send_modify(|view| view.awaiting_response = false);
    }
}
