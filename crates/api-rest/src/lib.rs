//! # Records REST surface
//!
//! Serves the patient details screen over HTTP. The HTTP client plays the browser's role: it
//! renders the screen JSON, shows the pending confirmation prompt and posts the user's answer
//! back. Notifications and navigation requests are queued and drained by the client.
//!
//! ## Routes
//! - `GET /health`
//! - `GET /patients/{id}`: mount the details screen and render it
//! - `POST /patients/{id}/delete`: press the Delete button
//! - `GET /confirmation`: the prompt currently shown, if any
//! - `POST /confirmation/{id}/confirm` and `POST /confirmation/{id}/cancel`
//! - `GET /notifications` and `GET /navigation`: drain queued toasts and route changes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use records_core::{
    ConfirmationGate, ConfirmationId, DeleteOutcome, PatientDetailsScreen, Prompt, RecordId,
    RecordStore, RecordingNavigator, RecordingNotifier, Resolution, Screen, ViewStatus,
    WorkflowState,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use utoipa::{OpenApi, ToSchema};

pub mod dto {
    use super::*;

    #[derive(Serialize, ToSchema)]
    pub struct HealthRes {
        pub ok: bool,
        pub message: String,
    }

    #[derive(Serialize, ToSchema)]
    pub struct ScreenRes {
        #[schema(value_type = Object)]
        pub screen: Screen,
        #[schema(value_type = String)]
        pub workflow: WorkflowState,
    }

    #[derive(Serialize, ToSchema)]
    pub struct PromptRes {
        pub id: String,
        /// Record the prompt is about.
        pub record_id: Option<String>,
        pub title: String,
        pub message: String,
    }

    #[derive(Serialize, ToSchema)]
    pub struct IgnoredRes {
        /// `no_record`, `busy`, `already_deleted` or `superseded`
        pub reason: String,
    }

    #[derive(Serialize, ToSchema)]
    pub struct ResolveRes {
        pub resolved: bool,
    }

    #[derive(Serialize, ToSchema)]
    pub struct NotificationsRes {
        #[schema(value_type = Vec<Object>)]
        pub notifications: Vec<records_core::Notification>,
    }

    #[derive(Serialize, ToSchema)]
    pub struct NavigationRes {
        pub routes: Vec<String>,
    }
}

use dto::*;

/// Application state shared across REST handlers.
///
/// A screen is only kept while its delete workflow is in flight, so repeated Delete presses
/// reach the same workflow and its re-entrancy guard. Every other request renders from a
/// fresh screen that is dropped with the response.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
    gate: ConfirmationGate,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
    screens: Arc<Mutex<HashMap<RecordId, Arc<PatientDetailsScreen>>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            gate: ConfirmationGate::new(),
            notifier: Arc::new(RecordingNotifier::new()),
            navigator: Arc::new(RecordingNavigator::new()),
            screens: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn screens(&self) -> MutexGuard<'_, HashMap<RecordId, Arc<PatientDetailsScreen>>> {
        self.screens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_screen(&self, id: &RecordId) -> Arc<PatientDetailsScreen> {
        Arc::new(PatientDetailsScreen::new(
            id.clone(),
            self.store.clone(),
            self.gate.clone(),
            self.notifier.clone(),
            self.navigator.clone(),
        ))
    }

    /// The screen whose delete is in flight for `id`, if any.
    fn active_screen(&self, id: &RecordId) -> Option<Arc<PatientDetailsScreen>> {
        self.screens().get(id).cloned()
    }

    /// Returns the screen a Delete press on `id` should reach. Without a delete in flight a
    /// fresh screen is mounted and registered, unless a concurrent press registered one first.
    async fn claim_screen(&self, id: &RecordId) -> Arc<PatientDetailsScreen> {
        if let Some(screen) = self.active_screen(id) {
            return screen;
        }
        let screen = self.new_screen(id);
        screen.mount().await;
        self.screens()
            .entry(id.clone())
            .or_insert(screen)
            .clone()
    }

    /// Forgets `screen` once its workflow has settled. A screen that is still awaiting a
    /// decision or deleting stays registered, as does a newer screen in its slot.
    fn release_screen(&self, screen: &Arc<PatientDetailsScreen>) {
        let mut screens = self.screens();
        let in_flight = matches!(
            screen.workflow_state(),
            WorkflowState::AwaitingConfirmation | WorkflowState::Deleting
        );
        if in_flight {
            return;
        }
        if screens
            .get(screen.record_id())
            .is_some_and(|kept| Arc::ptr_eq(kept, screen))
        {
            screens.remove(screen.record_id());
        }
    }

    #[cfg(test)]
    fn retained_screens(&self) -> usize {
        self.screens().len()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        get_patient,
        delete_patient,
        get_confirmation,
        confirm,
        cancel,
        notifications,
        navigation,
    ),
    components(schemas(
        HealthRes,
        ScreenRes,
        PromptRes,
        IgnoredRes,
        ResolveRes,
        NotificationsRes,
        NavigationRes,
    ))
)]
pub struct ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients/:id", get(get_patient))
        .route("/patients/:id/delete", post(delete_patient))
        .route("/confirmation", get(get_confirmation))
        .route("/confirmation/:id/confirm", post(confirm))
        .route("/confirmation/:id/cancel", post(cancel))
        .route("/notifications", get(notifications))
        .route("/navigation", get(navigation))
        .with_state(state)
}

fn parse_record_id(raw: &str) -> Result<RecordId, (StatusCode, &'static str)> {
    RecordId::parse(raw).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid patient id"))
}

fn prompt_res(prompt: Prompt) -> PromptRes {
    PromptRes {
        id: prompt.id.to_string(),
        record_id: prompt.subject,
        title: records_core::constants::DELETE_PROMPT_TITLE.to_string(),
        message: prompt.message,
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Patient records is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient record id")),
    responses(
        (status = 200, description = "Loaded patient details", body = ScreenRes),
        (status = 404, description = "No patient data available", body = ScreenRes),
        (status = 400, description = "Invalid patient id")
    )
)]
/// Mount the patient details screen and render it.
///
/// A missing record and a store failure render the same `not_found` screen; the difference
/// is only visible in the queued notification and the server log.
async fn get_patient(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_record_id(&raw_id)?;
    // A screen with a delete in flight is already loaded; remounting would reset it.
    let screen = match state.active_screen(&id) {
        Some(screen) => screen,
        None => {
            let screen = state.new_screen(&id);
            screen.mount().await;
            screen
        }
    };
    let code = match screen.status() {
        ViewStatus::Loaded => StatusCode::OK,
        ViewStatus::NotFound | ViewStatus::Loading => StatusCode::NOT_FOUND,
    };

    let body = ScreenRes {
        screen: screen.render(),
        workflow: screen.workflow_state(),
    };
    Ok((code, Json(body)).into_response())
}

#[utoipa::path(
    post,
    path = "/patients/{id}/delete",
    params(("id" = String, Path, description = "Patient record id")),
    responses(
        (status = 202, description = "Confirmation prompt shown", body = PromptRes),
        (status = 409, description = "Delete ignored or superseded by another prompt", body = IgnoredRes),
        (status = 400, description = "Invalid patient id"),
        (status = 500, description = "Internal server error")
    )
)]
/// Press the Delete button on a patient's screen.
///
/// The workflow keeps running in the background until the prompt is answered through the
/// confirmation endpoints.
async fn delete_patient(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_record_id(&raw_id)?;
    let screen = state.claim_screen(&id).await;

    let subject = id.to_string();
    let mut prompts = state.gate.subscribe();

    let worker = screen.clone();
    let owner = state.clone();
    let mut task = tokio::spawn(async move {
        let outcome = worker.delete().await;
        owner.release_screen(&worker);
        outcome
    });

    // The gate is shared by every screen: only a prompt about this record answers this press.
    let own_prompt = |shown: &Option<Prompt>| {
        shown
            .as_ref()
            .is_some_and(|p| p.subject.as_deref() == Some(subject.as_str()))
    };

    tokio::select! {
        shown = prompts.wait_for(own_prompt) => {
            match shown.ok().and_then(|shown| shown.clone()) {
                Some(prompt) => Ok((StatusCode::ACCEPTED, Json(prompt_res(prompt))).into_response()),
                None => Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error")),
            }
        }
        finished = &mut task => match finished {
            Ok(DeleteOutcome::Ignored(reason)) => {
                let reason = serde_json::to_value(reason)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                Ok((StatusCode::CONFLICT, Json(IgnoredRes { reason })).into_response())
            }
            Ok(DeleteOutcome::Cancelled) => {
                tracing::info!(%id, "delete prompt superseded before it was shown");
                let reason = "superseded".to_string();
                Ok((StatusCode::CONFLICT, Json(IgnoredRes { reason })).into_response())
            }
            Ok(other) => {
                tracing::error!(%id, ?other, "delete finished without showing a prompt");
                Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
            }
            Err(e) => {
                tracing::error!(%id, "delete task failed: {}", e);
                Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
            }
        },
    }
}

#[utoipa::path(
    get,
    path = "/confirmation",
    responses(
        (status = 200, description = "Prompt currently shown", body = PromptRes),
        (status = 204, description = "No prompt is shown")
    )
)]
/// The confirmation prompt currently shown, if any.
async fn get_confirmation(State(state): State<AppState>) -> Response {
    match state.gate.current_prompt() {
        Some(prompt) => Json(prompt_res(prompt)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn resolve(
    state: &AppState,
    raw_id: &str,
    decide: fn(&ConfirmationGate, ConfirmationId) -> Resolution,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = ConfirmationId::parse(raw_id)
        .ok_or((StatusCode::BAD_REQUEST, "Invalid confirmation id"))?;

    match decide(&state.gate, id) {
        Resolution::Resolved => Ok(Json(ResolveRes { resolved: true }).into_response()),
        Resolution::AlreadySettled => {
            Ok((StatusCode::CONFLICT, Json(ResolveRes { resolved: false })).into_response())
        }
    }
}

#[utoipa::path(
    post,
    path = "/confirmation/{id}/confirm",
    params(("id" = String, Path, description = "Confirmation id")),
    responses(
        (status = 200, description = "Deletion confirmed", body = ResolveRes),
        (status = 409, description = "Confirmation already settled", body = ResolveRes),
        (status = 400, description = "Invalid confirmation id")
    )
)]
/// Click "Delete" in the confirmation prompt.
async fn confirm(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    resolve(&state, &raw_id, ConfirmationGate::confirm)
}

#[utoipa::path(
    post,
    path = "/confirmation/{id}/cancel",
    params(("id" = String, Path, description = "Confirmation id")),
    responses(
        (status = 200, description = "Deletion cancelled", body = ResolveRes),
        (status = 409, description = "Confirmation already settled", body = ResolveRes),
        (status = 400, description = "Invalid confirmation id")
    )
)]
/// Click "Cancel" in the confirmation prompt.
async fn cancel(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    resolve(&state, &raw_id, ConfirmationGate::cancel)
}

#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Notifications queued since the last call", body = NotificationsRes)
    )
)]
async fn notifications(State(state): State<AppState>) -> Json<NotificationsRes> {
    Json(NotificationsRes {
        notifications: state.notifier.drain(),
    })
}

#[utoipa::path(
    get,
    path = "/navigation",
    responses(
        (status = 200, description = "Routes requested since the last call", body = NavigationRes)
    )
)]
async fn navigation(State(state): State<AppState>) -> Json<NavigationRes> {
    Json(NavigationRes {
        routes: state.navigator.drain().iter().map(|r| r.path()).collect(),
    })
}
