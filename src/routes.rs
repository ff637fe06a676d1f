//! REST endpoints over a single wizard session.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::WizardError;
use crate::notify::{CollectingNotifier, Notification};
use crate::wizard::{AnswerRecord, TranscriptEntry, Transition, WizardEngine, WizardStep};

/// Shared state for wizard routes.
///
/// The engine sits behind a mutex so requests are applied one at a time.
/// `notifications` must be the notifier the engine was built with.
#[derive(Clone)]
pub struct WizardRouteState {
    pub engine: Arc<Mutex<WizardEngine>>,
    pub notifications: Arc<CollectingNotifier>,
}

/// Snapshot of the session for clients.
#[derive(Debug, Serialize)]
pub struct WizardView {
    pub index: usize,
    pub total: usize,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<WizardStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub record: AnswerRecord,
    pub transcript: Vec<TranscriptEntry>,
}

impl WizardView {
    fn of(engine: &WizardEngine) -> Self {
        let (index, total) = engine.progress();
        Self {
            index,
            total,
            complete: engine.is_complete(),
            step: engine.current_step().cloned(),
            prompt: engine.render_prompt(),
            record: engine.state().record.clone(),
            transcript: engine.state().transcript.clone(),
        }
    }
}

/// Result of a POST action.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub notifications: Vec<Notification>,
    pub wizard: WizardView,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceRequest {
    pub choice: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
}

fn error_status(err: &WizardError) -> StatusCode {
    match err {
        WizardError::SubmissionFailed { .. } => StatusCode::BAD_GATEWAY,
        WizardError::AlreadyComplete
        | WizardError::NotComplete
        | WizardError::WrongStepKind { .. } => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Put the active prompt in front of a fresh session's transcript so the
/// first user entry always follows an assistant prompt.
fn ensure_presented(engine: &mut WizardEngine) {
    if engine.state().transcript.is_empty() {
        engine.present_step();
    }
}

/// Turn an engine result into an HTTP response, showing the next prompt on
/// success.
fn respond(
    state: &WizardRouteState,
    engine: &mut WizardEngine,
    result: Result<Transition, WizardError>,
) -> (StatusCode, Json<ActionResponse>) {
    let (status, transition, error) = match result {
        Ok(transition) => {
            engine.present_step();
            (StatusCode::OK, Some(transition), None)
        }
        Err(e) => (error_status(&e), None, Some(e.to_string())),
    };
    let body = ActionResponse {
        transition,
        error,
        notifications: state.notifications.drain(),
        wizard: WizardView::of(engine),
    };
    (status, Json(body))
}

/// GET /api/wizard
async fn get_wizard(State(state): State<WizardRouteState>) -> impl IntoResponse {
    let mut engine = state.engine.lock().await;
    ensure_presented(&mut engine);
    Json(WizardView::of(&engine))
}

/// POST /api/wizard/choice
async fn post_choice(
    State(state): State<WizardRouteState>,
    Json(req): Json<ChoiceRequest>,
) -> impl IntoResponse {
    let mut engine = state.engine.lock().await;
    ensure_presented(&mut engine);
    let result = engine.submit_choice(&req.choice).await;
    respond(&state, &mut engine, result)
}

/// POST /api/wizard/continue
async fn post_continue(State(state): State<WizardRouteState>) -> impl IntoResponse {
    let mut engine = state.engine.lock().await;
    ensure_presented(&mut engine);
    let result = engine.continue_multi_choice().await;
    respond(&state, &mut engine, result)
}

/// POST /api/wizard/answer
async fn post_answer(
    State(state): State<WizardRouteState>,
    Json(req): Json<AnswerRequest>,
) -> impl IntoResponse {
    let mut engine = state.engine.lock().await;
    ensure_presented(&mut engine);
    let result = engine.submit_freeform(&req.text).await;
    respond(&state, &mut engine, result)
}

/// POST /api/wizard/skip
async fn post_skip(State(state): State<WizardRouteState>) -> impl IntoResponse {
    let mut engine = state.engine.lock().await;
    ensure_presented(&mut engine);
    let result = engine.skip().await;
    respond(&state, &mut engine, result)
}

/// POST /api/wizard/retry
async fn post_retry(State(state): State<WizardRouteState>) -> impl IntoResponse {
    let mut engine = state.engine.lock().await;
    ensure_presented(&mut engine);
    let result = engine.retry_submission().await;
    respond(&state, &mut engine, result)
}

/// POST /api/wizard/reset
///
/// Starts a fresh session and returns its first prompt.
async fn post_reset(State(state): State<WizardRouteState>) -> impl IntoResponse {
    let mut engine = state.engine.lock().await;
    engine.reset();
    engine.present_step();
    state.notifications.drain();
    Json(WizardView::of(&engine))
}

/// Build the wizard REST routes.
pub fn wizard_routes(state: WizardRouteState) -> Router {
    Router::new()
        .route("/api/wizard", get(get_wizard))
        .route("/api/wizard/choice", post(post_choice))
        .route("/api/wizard/continue", post(post_continue))
        .route("/api/wizard/answer", post(post_answer))
        .route("/api/wizard/skip", post(post_skip))
        .route("/api/wizard/retry", post(post_retry))
        .route("/api/wizard/reset", post(post_reset))
        .with_state(state)
}
