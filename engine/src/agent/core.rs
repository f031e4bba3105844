//! Agent Core
//!
//! The orchestrator loop. Each turn:
//!
//! 1. Exit immediately if the input contains a termination keyword
//! 2. Plan → Execute → Evaluate
//! 3. Apply the evaluation: phase, profile merge with contradiction check,
//!    scheme lists, selection
//! 4. Record the exchange in history
//!
//! `step` takes the session state by value and hands it back, so the
//! orchestrator is the only place it is ever mutated.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

use sdk::errors::{EngineError, SahayakErrorExt};
use sdk::voice::{Utterance, VoiceInput, VoiceOutput};

use super::state::{Phase, SessionState};
use crate::conductor::{
    Contradiction, ContextAssembler, Evaluation, Evaluator, Executor, LlmHandle, Planner,
    SessionMemory,
};
use crate::llm::LLMProvider;

/// Spoken once at session start
pub const WELCOME: &str = "नमस्कार! मी तुम्हाला सरकारी योजनांसाठी मदत करू शकतो. काय मदत हवी आहे?";

/// Spoken when the user ends the session
pub const FAREWELL: &str = "धन्यवाद! शुभेच्छा!";

/// Reply used when the evaluation has none
pub const DEFAULT_REPLY: &str = "समजले नाही. पुन्हा सांगा.";

/// Any input containing one of these ends the session
pub const TERMINATION_KEYWORDS: [&str; 2] = ["बंद", "थांब"];

/// Input errors tolerated in a row before the loop gives up
const MAX_CONSECUTIVE_INPUT_ERRORS: usize = 5;

/// Does this input end the session?
pub fn is_termination(input: &str) -> bool {
    TERMINATION_KEYWORDS.iter().any(|k| input.contains(k))
}

/// Outcome of one turn
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    Exit {
        farewell: String,
    },
    Reply {
        response: String,
        phase: Phase,
        /// Every contradiction found; only the first shapes the reply
        contradictions: Vec<Contradiction>,
    },
}

/// Agent Core that orchestrates the turn loop
pub struct AgentCore {
    planner: Planner,
    executor: Executor,
    evaluator: Evaluator,
    memory: SessionMemory,
}

impl AgentCore {
    /// Create an agent core over one provider
    ///
    /// # Arguments
    /// * `provider` - Backend used by planner, extraction and evaluator
    /// * `request_timeout` - Deadline for each LLM call
    pub fn new(provider: Arc<dyn LLMProvider>, request_timeout: Duration) -> Self {
        let llm = LlmHandle::new(provider, request_timeout);
        let context = ContextAssembler::default();

        Self {
            planner: Planner::new(llm.clone(), context.clone()),
            executor: Executor::new(llm.clone(), context.clone()),
            evaluator: Evaluator::new(llm, context),
            memory: SessionMemory::new(),
        }
    }

    /// Process one user input.
    pub async fn step(&self, state: SessionState, input: &str) -> (SessionState, Turn) {
        let span = tracing::info_span!(
            "turn",
            session = %state.session_id,
            turn = state.turn_count() + 1
        );
        self.step_inner(state, input).instrument(span).await
    }

    async fn step_inner(&self, mut state: SessionState, input: &str) -> (SessionState, Turn) {
        if is_termination(input) {
            info!("Termination keyword received");
            return (
                state,
                Turn::Exit {
                    farewell: FAREWELL.to_string(),
                },
            );
        }

        let plan = self.planner.plan(input, &state).await;
        let results = self.executor.execute(&plan, &state).await;
        let evaluation = self.evaluator.evaluate(&results, &state, &plan).await;

        let (response, contradictions) = self.apply_evaluation(&mut state, evaluation);
        self.memory.record_turn(&mut state, input, &response);

        let phase = state.phase;
        (
            state,
            Turn::Reply {
                response,
                phase,
                contradictions,
            },
        )
    }

    /// Fold an evaluation into the state; returns the reply to speak.
    pub fn apply_evaluation(
        &self,
        state: &mut SessionState,
        evaluation: Evaluation,
    ) -> (String, Vec<Contradiction>) {
        state.phase = evaluation.next_phase.unwrap_or(Phase::Gathering);

        let mut response = evaluation
            .response
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REPLY.to_string());

        let mut contradictions = Vec::new();
        if let Some(delta) = evaluation.updated_profile.filter(|p| !p.is_empty()) {
            contradictions = self.memory.detect_contradictions(&delta, &state.profile);
            if let Some(first) = contradictions.first() {
                response = first.prompt();
            }
            state.profile.merge(&delta);
        }

        if let Some(schemes) = evaluation.eligible_schemes {
            state.eligible_schemes = schemes;
        }
        if let Some(missing) = evaluation.missing_info {
            state.missing_info = missing;
        }
        if let Some(selected) = evaluation.selected_scheme {
            state.selected_scheme = selected;
        }

        (response, contradictions)
    }

    /// Run a full session: welcome, then turns until exit or end of input.
    ///
    /// # Errors
    ///
    /// Returns the last input error after repeated consecutive failures.
    /// End of input is a normal exit.
    pub async fn run<I, O>(&self, input: &mut I, output: &O) -> Result<SessionState, EngineError>
    where
        I: VoiceInput + ?Sized,
        O: VoiceOutput + ?Sized,
    {
        let mut state = SessionState::new();
        info!(session = %state.session_id, "Session started");
        speak(output, WELCOME).await;

        let mut input_errors = 0;
        loop {
            let text = match input.listen().await {
                Ok(Utterance::Text(text)) => {
                    input_errors = 0;
                    text
                }
                Ok(Utterance::Silence) => {
                    debug!(component = "voice", "Nothing heard, skipping turn");
                    continue;
                }
                Err(EngineError::InputClosed) => {
                    info!(session = %state.session_id, "Input closed, ending session");
                    return Ok(state);
                }
                Err(e) => {
                    input_errors += 1;
                    warn!(component = "voice", "Listen failed: {}", e);
                    if input_errors >= MAX_CONSECUTIVE_INPUT_ERRORS || !e.is_recoverable() {
                        return Err(e);
                    }
                    continue;
                }
            };

            let (next, turn) = self.step(state, &text).await;
            state = next;

            match turn {
                Turn::Exit { farewell } => {
                    speak(output, &farewell).await;
                    info!(session = %state.session_id, "Session ended by user");
                    return Ok(state);
                }
                Turn::Reply { response, .. } => {
                    speak(output, &response).await;
                    info!(
                        phase = %state.phase,
                        profile = %state.profile,
                        eligible = state.eligible_schemes.len(),
                        "Status"
                    );
                }
            }
        }
    }
}

/// Output failures never end the session.
async fn speak<O: VoiceOutput + ?Sized>(output: &O, text: &str) {
    if let Err(e) = output.speak(text).await {
        warn!(component = "voice", "Speak failed: {}", e);
    }
}
